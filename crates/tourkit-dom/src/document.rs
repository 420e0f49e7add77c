#![forbid(unsafe_code)]

//! The host document abstraction.
//!
//! The tour engine only ever *reads* the document, with two narrow
//! exceptions: scrolling (to bring a target into view) and clicking (to open
//! a collapsed section that may hide the target). Everything else, including
//! who mutates the document and when, belongs to the host.

use std::fmt;

use tourkit_core::geometry::{Bounds, ViewportSize};

use crate::selector::Selector;

/// Opaque handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a handle from a raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors from document side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The handle does not name an element of this document.
    UnknownNode(NodeId),
    /// The element is no longer attached to the document.
    Detached(NodeId),
    /// A programmatic click threw.
    ClickFailed { node: NodeId, reason: String },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownNode(node) => write!(f, "unknown node {node}"),
            DomError::Detached(node) => write!(f, "node {node} is detached from the document"),
            DomError::ClickFailed { node, reason } => {
                write!(f, "click on {node} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for DomError {}

/// A live element tree with layout.
///
/// Geometry is viewport-relative, like `getBoundingClientRect`.
pub trait Document {
    /// The document element.
    fn root(&self) -> NodeId;

    /// The `<body>` element, if present.
    fn body(&self) -> Option<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Attached children, in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lower-case tag name, or `None` for an unknown handle.
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Whitespace-joined text of the element and its attached descendants.
    fn text_content(&self, node: NodeId) -> String;

    /// Whether the element is attached to the document.
    fn is_connected(&self, node: NodeId) -> bool;

    /// Attached, laid out with a non-empty box, and not hidden by an
    /// ancestor.
    fn is_visible(&self, node: NodeId) -> bool;

    /// Viewport-relative box, or `None` when detached.
    fn bounding_rect(&self, node: NodeId) -> Option<Bounds>;

    fn viewport(&self) -> ViewportSize;

    /// Vertical window scroll offset.
    fn scroll_y(&self) -> f64;

    /// Total scrollable height of the page.
    fn document_height(&self) -> f64;

    /// Scroll the window. Implementations clamp to the scrollable range.
    fn scroll_to(&mut self, y: f64);

    /// Scroll so the element is centered in the viewport where possible.
    fn scroll_into_view(&mut self, node: NodeId) -> Result<(), DomError>;

    /// Dispatch a click.
    fn click(&mut self, node: NodeId) -> Result<(), DomError>;

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Attached descendants in document order, excluding `node`.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).into_iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).into_iter().rev());
        }
        out
    }

    /// Whether `node` is `ancestor` or inside it.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// One past the largest [`NodeId::index`] this document hands out.
    ///
    /// The default walks the attached tree; arena-backed documents know it
    /// directly.
    fn node_bound(&self) -> usize {
        let root = self.root();
        std::iter::once(root)
            .chain(self.descendants(root))
            .map(|n| n.index() + 1)
            .max()
            .unwrap_or(1)
    }

    /// Every attached element matching `selector`, in document order.
    fn query_selector_all(&self, selector: &Selector) -> Vec<NodeId> {
        let root = self.root();
        selector.filter(self, std::iter::once(root).chain(self.descendants(root)))
    }

    /// First attached element matching `selector`.
    fn query_selector(&self, selector: &Selector) -> Option<NodeId> {
        let root = self.root();
        selector.first_match(self, std::iter::once(root).chain(self.descendants(root)))
    }

    /// `node` or its nearest ancestor matching `selector`.
    fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let ancestors = std::iter::successors(Some(node), |&n| self.parent(n));
        selector.first_match(self, ancestors)
    }
}
