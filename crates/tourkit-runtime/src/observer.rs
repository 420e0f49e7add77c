#![forbid(unsafe_code)]

//! Change observer.
//!
//! Watches the subtree around a located target and decides which mutation
//! records warrant a (debounced) recompute. The scope is the target's
//! nearest tagged container, else its parent, else the body.

use tourkit_dom::document::{Document, NodeId};
use tourkit_dom::mutation::{MutationKind, MutationRecord};
use tourkit_dom::selector::Selector;

/// Attributes whose changes can move or resize the target.
pub const WATCHED_ATTRIBUTES: [&str; 3] = ["class", "style", "data-state"];

/// Subtree-scoped mutation filter for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeObserver {
    target: NodeId,
    scope: NodeId,
    connected: bool,
}

impl ChangeObserver {
    /// Start observing around `target`.
    pub fn observe(doc: &dyn Document, target: NodeId, container: Option<&Selector>) -> Self {
        let parent = doc.parent(target);
        let tagged = parent.and_then(|p| container.and_then(|sel| doc.closest(p, sel)));
        let scope = tagged
            .or(parent)
            .or_else(|| doc.body())
            .unwrap_or_else(|| doc.root());
        tracing::debug!(node = %target, %scope, "observing target subtree");
        Self {
            target,
            scope,
            connected: true,
        }
    }

    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Root of the observed subtree.
    #[must_use]
    pub fn scope(&self) -> NodeId {
        self.scope
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn disconnect(&mut self) {
        if self.connected {
            tracing::debug!(node = %self.target, "observer disconnected");
        }
        self.connected = false;
    }

    /// Whether one record is a layout-relevant change inside the scope.
    #[must_use]
    pub fn is_relevant(&self, doc: &dyn Document, record: &MutationRecord) -> bool {
        if !self.connected || !doc.contains(self.scope, record.target) {
            return false;
        }
        match &record.kind {
            MutationKind::ChildList { .. } => record.changes_children(),
            MutationKind::Attributes { name } => WATCHED_ATTRIBUTES.contains(&name.as_str()),
            MutationKind::CharacterData => false,
        }
    }

    /// Whether any record in a batch is relevant.
    #[must_use]
    pub fn any_relevant(&self, doc: &dyn Document, records: &[MutationRecord]) -> bool {
        records.iter().any(|r| self.is_relevant(doc, r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourkit_core::geometry::ViewportSize;
    use tourkit_dom::memory::{MemoryDocument, NodeSpec};

    fn container() -> Selector {
        Selector::parse("[data-tour-container]").unwrap()
    }

    fn setup() -> (MemoryDocument, NodeId, NodeId, NodeId) {
        let mut doc = MemoryDocument::new(ViewportSize::new(1024.0, 768.0));
        let body = doc.body();
        let section = doc.append(
            body,
            NodeSpec::new("section")
                .attr("data-tour-container", "")
                .rect(0.0, 0.0, 800.0, 600.0),
        );
        let wrapper = doc.append(section, NodeSpec::new("div").rect(0.0, 0.0, 800.0, 300.0));
        let target = doc.append(
            wrapper,
            NodeSpec::new("div").tour("kpi-cards").rect(0.0, 0.0, 400.0, 100.0),
        );
        doc.take_mutations();
        (doc, section, wrapper, target)
    }

    #[test]
    fn scope_is_nearest_tagged_container() {
        let (doc, section, _, target) = setup();
        let observer = ChangeObserver::observe(&doc, target, Some(&container()));
        assert_eq!(observer.scope(), section);
    }

    #[test]
    fn scope_falls_back_to_parent() {
        let (doc, _, wrapper, target) = setup();
        let observer = ChangeObserver::observe(&doc, target, None);
        assert_eq!(observer.scope(), wrapper);
    }

    #[test]
    fn target_itself_is_not_its_own_scope() {
        let (mut doc, section, _, target) = setup();
        doc.set_attribute(target, "data-tour-container", "").unwrap();
        let observer = ChangeObserver::observe(&doc, target, Some(&container()));
        assert_eq!(observer.scope(), section);
    }

    #[test]
    fn filters_records() {
        let (mut doc, section, _, target) = setup();
        let body = doc.body();
        let observer = ChangeObserver::observe(&doc, target, Some(&container()));

        doc.set_attribute(target, "class", "expanded").unwrap();
        doc.set_attribute(target, "aria-label", "KPIs").unwrap();
        doc.set_text(target, "Budget").unwrap();
        doc.append(section, NodeSpec::new("p").rect(0.0, 400.0, 10.0, 10.0));
        doc.append(body, NodeSpec::new("aside").rect(0.0, 700.0, 10.0, 10.0));
        let records = doc.take_mutations();

        let relevant: Vec<bool> = records.iter().map(|r| observer.is_relevant(&doc, r)).collect();
        assert_eq!(relevant, vec![true, false, false, true, false]);
        assert!(observer.any_relevant(&doc, &records));
    }

    #[test]
    fn empty_child_list_is_ignored() {
        let (doc, section, _, target) = setup();
        let observer = ChangeObserver::observe(&doc, target, None);
        let record = MutationRecord {
            target: section,
            kind: MutationKind::ChildList {
                added: Vec::new(),
                removed: Vec::new(),
            },
        };
        assert!(!observer.is_relevant(&doc, &record));
    }

    #[test]
    fn disconnected_observer_ignores_everything() {
        let (mut doc, _, _, target) = setup();
        let mut observer = ChangeObserver::observe(&doc, target, None);
        observer.disconnect();
        assert!(!observer.is_connected());
        doc.set_attribute(target, "style", "height: 10px").unwrap();
        let records = doc.take_mutations();
        assert!(!observer.any_relevant(&doc, &records));
    }
}
