#![forbid(unsafe_code)]

//! Mutation records, as delivered to a change observer.

use crate::document::NodeId;

/// One observed change to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The element whose children, attributes or text changed.
    pub target: NodeId,
    pub kind: MutationKind,
}

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were inserted and/or removed.
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// An attribute was set or removed.
    Attributes { name: String },
    /// Text content changed.
    CharacterData,
}

impl MutationRecord {
    pub fn child_added(parent: NodeId, child: NodeId) -> Self {
        Self {
            target: parent,
            kind: MutationKind::ChildList {
                added: vec![child],
                removed: Vec::new(),
            },
        }
    }

    pub fn child_removed(parent: NodeId, child: NodeId) -> Self {
        Self {
            target: parent,
            kind: MutationKind::ChildList {
                added: Vec::new(),
                removed: vec![child],
            },
        }
    }

    pub fn attribute(target: NodeId, name: impl Into<String>) -> Self {
        Self {
            target,
            kind: MutationKind::Attributes { name: name.into() },
        }
    }

    pub fn character_data(target: NodeId) -> Self {
        Self {
            target,
            kind: MutationKind::CharacterData,
        }
    }

    /// Name of the changed attribute, for attribute records.
    #[must_use]
    pub fn attribute_name(&self) -> Option<&str> {
        match &self.kind {
            MutationKind::Attributes { name } => Some(name),
            _ => None,
        }
    }

    /// Whether a child-list record actually inserted or removed nodes.
    #[must_use]
    pub fn changes_children(&self) -> bool {
        matches!(
            &self.kind,
            MutationKind::ChildList { added, removed } if !added.is_empty() || !removed.is_empty()
        )
    }
}
