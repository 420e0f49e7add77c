#![forbid(unsafe_code)]

//! The "click to expand" capability.
//!
//! Opening a collapsed section is the only side effect the locator has
//! besides scrolling. It goes through [`Expander`] so hosts and tests can
//! count, replace or disable it.

use tourkit_dom::document::{Document, NodeId};

/// Best-effort opening of a collapsed element.
pub trait Expander {
    /// Try to open `node`. Returns `true` if the element was expanded.
    ///
    /// Implementations must not panic or propagate host failures.
    fn try_expand(&mut self, doc: &mut dyn Document, node: NodeId) -> bool;

    /// Number of expansion attempts so far.
    fn attempts(&self) -> u32;
}

/// Expands by dispatching a click.
///
/// A closed `<details>` is opened through its `<summary>`, which is what a
/// user would click.
#[derive(Debug, Default, Clone)]
pub struct ClickExpander {
    attempts: u32,
    failures: u32,
}

impl ClickExpander {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clicks that failed and were swallowed.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Expander for ClickExpander {
    fn try_expand(&mut self, doc: &mut dyn Document, node: NodeId) -> bool {
        self.attempts += 1;
        let click_target = if doc.tag_name(node) == Some("details") {
            doc.children(node)
                .into_iter()
                .find(|&c| doc.tag_name(c) == Some("summary"))
                .unwrap_or(node)
        } else {
            node
        };
        match doc.click(click_target) {
            Ok(()) => {
                tracing::debug!(node = %click_target, "expanded collapsed element");
                true
            }
            Err(error) => {
                self.failures += 1;
                tracing::warn!(node = %click_target, %error, "expand click failed");
                false
            }
        }
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Never expands anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExpander {
    attempts: u32,
}

impl NoopExpander {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Expander for NoopExpander {
    fn try_expand(&mut self, _doc: &mut dyn Document, _node: NodeId) -> bool {
        self.attempts += 1;
        false
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }
}
