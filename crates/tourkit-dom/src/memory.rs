#![forbid(unsafe_code)]

//! In-memory [`Document`] implementation.
//!
//! An arena of elements with page-absolute layout boxes, a scrollable window
//! and a mutation log. It is the reference host for tests and the demo: it
//! models exactly the behaviors the locator depends on.
//!
//! - **Scrolling** shifts every non-fixed box; `scroll_to` clamps to the page.
//! - **Lazy rendering**: a node created with [`NodeSpec::render_at`] stays
//!   detached until the viewport's bottom edge scrolls past its threshold.
//! - **Collapsibles**: closed `<details>` (except its `<summary>`),
//!   `data-state="closed"`, `.collapsed` and `aria-controls` targets of an
//!   `aria-expanded="false"` trigger hide their content. Clicking opens them.
//! - **Mutations**: every edit appends a [`MutationRecord`]; drain them with
//!   [`MemoryDocument::take_mutations`].

use tourkit_core::geometry::{Bounds, ViewportSize};

use crate::document::{Document, DomError, NodeId};
use crate::mutation::MutationRecord;

/// Description of an element to insert.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    layout: Bounds,
    fixed: bool,
    render_at: Option<f64>,
    fail_clicks: bool,
}

impl NodeSpec {
    /// New element with the given tag and an empty box.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        set_attr(&mut self.attributes, name, value);
        self
    }

    #[must_use]
    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    #[must_use]
    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    /// `[data-tour=value]`.
    #[must_use]
    pub fn tour(self, value: &str) -> Self {
        self.attr("data-tour", value)
    }

    #[must_use]
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Page-absolute layout box.
    #[must_use]
    pub fn rect(mut self, left: f64, top: f64, width: f64, height: f64) -> Self {
        self.layout = Bounds::new(left, top, width, height);
        self
    }

    /// Position relative to the viewport (does not scroll).
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    /// Render only once the viewport's bottom edge reaches page offset `y`.
    #[must_use]
    pub fn render_at(mut self, y: f64) -> Self {
        self.render_at = Some(y);
        self
    }

    /// Every click on this element fails.
    #[must_use]
    pub fn fail_clicks(mut self) -> Self {
        self.fail_clicks = true;
        self
    }
}

fn set_attr(attributes: &mut Vec<(String, String)>, name: &str, value: &str) {
    let name = name.to_ascii_lowercase();
    match attributes.iter_mut().find(|(n, _)| *n == name) {
        Some((_, v)) => *v = value.to_string(),
        None => attributes.push((name, value.to_string())),
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    layout: Bounds,
    fixed: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Waiting for the viewport to reach this page offset.
    pending_render: Option<f64>,
    removed: bool,
    fail_clicks: bool,
}

impl Node {
    fn from_spec(spec: NodeSpec, parent: Option<NodeId>) -> Self {
        Self {
            tag: spec.tag,
            attributes: spec.attributes,
            text: spec.text,
            layout: spec.layout,
            fixed: spec.fixed,
            parent,
            children: Vec::new(),
            pending_render: spec.render_at,
            removed: false,
            fail_clicks: spec.fail_clicks,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|w| w == class))
    }

    fn is_attached(&self) -> bool {
        !self.removed && self.pending_render.is_none()
    }
}

/// An in-memory document with a `<html>` root and a `<body>`.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    root: NodeId,
    body: NodeId,
    viewport: ViewportSize,
    scroll_y: f64,
    mutations: Vec<MutationRecord>,
    clicks: Vec<NodeId>,
}

impl MemoryDocument {
    /// Empty document sized to `viewport`.
    #[must_use]
    pub fn new(viewport: ViewportSize) -> Self {
        let root = Node::from_spec(
            NodeSpec::new("html").rect(0.0, 0.0, viewport.width, viewport.height),
            None,
        );
        let mut doc = Self {
            nodes: vec![root],
            root: NodeId::new(0),
            body: NodeId::new(0),
            viewport,
            scroll_y: 0.0,
            mutations: Vec::new(),
            clicks: Vec::new(),
        };
        doc.body = doc.append(
            doc.root,
            NodeSpec::new("body").rect(0.0, 0.0, viewport.width, viewport.height),
        );
        doc.mutations.clear();
        doc
    }

    /// The `<body>` element.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.body
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.nodes.get_mut(id.index()).ok_or(DomError::UnknownNode(id))
    }

    /// Append a new element as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not an element of this document.
    pub fn append(&mut self, parent: NodeId, spec: NodeSpec) -> NodeId {
        assert!(
            parent.index() < self.nodes.len(),
            "append to unknown parent {parent}"
        );
        let id = NodeId::new(self.nodes.len() as u32);
        let pending = spec.render_at.is_some();
        self.nodes.push(Node::from_spec(spec, Some(parent)));
        self.nodes[parent.index()].children.push(id);
        if !pending {
            self.mutations.push(MutationRecord::child_added(parent, id));
        }
        // A lazy node might already be in range.
        self.reveal_in_range();
        id
    }

    /// Detach an element (and its subtree) from the document.
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        let parent = self.node(node).ok_or(DomError::UnknownNode(node))?.parent;
        let n = self.node_mut(node)?;
        if n.removed {
            return Err(DomError::Detached(node));
        }
        n.removed = true;
        if let Some(parent) = parent {
            self.mutations.push(MutationRecord::child_removed(parent, node));
        }
        Ok(())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let n = self.node_mut(node)?;
        set_attr(&mut n.attributes, name, value);
        self.mutations
            .push(MutationRecord::attribute(node, name.to_ascii_lowercase()));
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        let n = self.node_mut(node)?;
        let before = n.attributes.len();
        n.attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        if n.attributes.len() != before {
            self.mutations
                .push(MutationRecord::attribute(node, name.to_ascii_lowercase()));
        }
        Ok(())
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.node_mut(node)?.text = text.to_string();
        self.mutations.push(MutationRecord::character_data(node));
        Ok(())
    }

    /// Move or resize an element. Recorded as a `style` attribute change.
    pub fn set_layout(&mut self, node: NodeId, layout: Bounds) -> Result<(), DomError> {
        self.node_mut(node)?.layout = layout;
        self.mutations.push(MutationRecord::attribute(node, "style"));
        Ok(())
    }

    /// Change the viewport size. The scroll offset is re-clamped.
    pub fn resize(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
        let y = self.scroll_y;
        self.scroll_to(y);
    }

    /// Drain the mutation log.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    /// Every successful click so far.
    #[must_use]
    pub fn clicks(&self) -> &[NodeId] {
        &self.clicks
    }

    fn max_scroll(&self) -> f64 {
        (self.document_height() - self.viewport.height).max(0.0)
    }

    fn reveal_in_range(&mut self) {
        let bottom = self.scroll_y + self.viewport.height;
        let mut revealed = Vec::new();
        for (i, node) in self.nodes.iter_mut().enumerate() {
            if let Some(threshold) = node.pending_render
                && threshold <= bottom
            {
                node.pending_render = None;
                if let Some(parent) = node.parent {
                    revealed.push(MutationRecord::child_added(parent, NodeId::new(i as u32)));
                }
            }
        }
        self.mutations.extend(revealed);
    }

    /// Whether an ancestor (or a controlling trigger) keeps `node` out of view.
    fn hidden_by_ancestor(&self, node: NodeId) -> bool {
        let mut child: Option<NodeId> = None;
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.node(id) else {
                return true;
            };
            if n.attr("hidden").is_some() || self.controlled_closed(n) {
                return true;
            }
            // Containers only hide what is inside them.
            if id != node {
                let closed_details = n.tag == "details"
                    && n.attr("open").is_none()
                    && !child
                        .and_then(|c| self.node(c))
                        .is_some_and(|c| c.tag == "summary");
                if closed_details
                    || n.attr("data-state") == Some("closed")
                    || n.has_class("collapsed")
                {
                    return true;
                }
            }
            child = Some(id);
            current = n.parent;
        }
        false
    }

    /// Whether `n` is the `aria-controls` region of a collapsed trigger.
    fn controlled_closed(&self, n: &Node) -> bool {
        let Some(id) = n.attr("id") else {
            return false;
        };
        self.nodes.iter().any(|other| {
            other.is_attached()
                && other.attr("aria-controls") == Some(id)
                && other.attr("aria-expanded") == Some("false")
        })
    }

    /// Apply the "open" toggles of a click to one element.
    fn toggle_open(&mut self, node: NodeId) {
        let mut changed: Vec<&'static str> = Vec::new();
        let n = &mut self.nodes[node.index()];

        match n.attr("aria-expanded") {
            Some("false") => {
                set_attr(&mut n.attributes, "aria-expanded", "true");
                changed.push("aria-expanded");
            }
            Some("true") => {
                set_attr(&mut n.attributes, "aria-expanded", "false");
                changed.push("aria-expanded");
            }
            _ => {}
        }
        match n.attr("data-state") {
            Some("closed") => {
                set_attr(&mut n.attributes, "data-state", "open");
                changed.push("data-state");
            }
            Some("open") => {
                set_attr(&mut n.attributes, "data-state", "closed");
                changed.push("data-state");
            }
            _ => {}
        }
        if n.has_class("collapsed")
            || ((n.has_class("accordion") || n.has_class("dropdown")) && !n.has_class("open"))
        {
            let mut classes = n
                .attr("class")
                .unwrap_or_default()
                .split_whitespace()
                .filter(|c| *c != "collapsed")
                .collect::<Vec<_>>()
                .join(" ");
            if n.has_class("accordion") || n.has_class("dropdown") {
                classes.push_str(" open");
            }
            set_attr(&mut n.attributes, "class", classes.trim());
            changed.push("class");
        }
        if n.tag == "details" {
            if n.attr("open").is_some() {
                n.attributes.retain(|(k, _)| k != "open");
            } else {
                set_attr(&mut n.attributes, "open", "");
            }
            changed.push("open");
        }

        for name in changed {
            self.mutations.push(MutationRecord::attribute(node, name));
        }
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn node_bound(&self) -> usize {
        self.nodes.len()
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|c| self.node(*c).is_some_and(Node::is_attached))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.tag.as_str())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.node(node)?.attr(name)
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        if let Some(n) = self.node(node)
            && !n.text.trim().is_empty()
        {
            parts.push(n.text.trim().to_string());
        }
        for d in self.descendants(node) {
            if let Some(n) = self.node(d)
                && !n.text.trim().is_empty()
            {
                parts.push(n.text.trim().to_string());
            }
        }
        parts.join(" ")
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.node(id) else {
                return false;
            };
            if !n.is_attached() {
                return false;
            }
            if id == self.root {
                return true;
            }
            current = n.parent;
        }
        false
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.is_connected(node)
            && self.node(node).is_some_and(|n| !n.layout.is_empty())
            && !self.hidden_by_ancestor(node)
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Bounds> {
        if !self.is_connected(node) {
            return None;
        }
        let n = self.node(node)?;
        Some(if n.fixed {
            n.layout
        } else {
            n.layout.offset(0.0, -self.scroll_y)
        })
    }

    fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn document_height(&self) -> f64 {
        self.nodes
            .iter()
            .filter(|n| !n.removed && !n.fixed)
            .map(|n| n.layout.bottom)
            .fold(self.viewport.height, f64::max)
    }

    fn scroll_to(&mut self, y: f64) {
        let y = if y.is_finite() { y } else { 0.0 };
        self.scroll_y = y.clamp(0.0, self.max_scroll());
        self.reveal_in_range();
    }

    fn scroll_into_view(&mut self, node: NodeId) -> Result<(), DomError> {
        let n = self.node(node).ok_or(DomError::UnknownNode(node))?;
        if !self.is_connected(node) {
            return Err(DomError::Detached(node));
        }
        if n.fixed {
            return Ok(());
        }
        let layout = n.layout;
        let y = layout.top - (self.viewport.height - layout.height) / 2.0;
        self.scroll_to(y);
        Ok(())
    }

    fn click(&mut self, node: NodeId) -> Result<(), DomError> {
        let n = self.node(node).ok_or(DomError::UnknownNode(node))?;
        if !self.is_connected(node) {
            return Err(DomError::Detached(node));
        }
        if n.fail_clicks {
            return Err(DomError::ClickFailed {
                node,
                reason: "click handler threw".into(),
            });
        }
        let is_summary = n.tag == "summary";
        let parent = n.parent;
        self.clicks.push(node);
        self.toggle_open(node);
        if is_summary
            && let Some(details) = parent
            && self.nodes[details.index()].tag == "details"
        {
            self.toggle_open(details);
        }
        Ok(())
    }
}
