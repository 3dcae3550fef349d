//! Mutation records produced by a diff pass.

use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Attributes,
    ChildList,
    CharacterData,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Attributes => "attributes",
            MutationKind::ChildList => "childList",
            MutationKind::CharacterData => "characterData",
        }
    }
}

/// One reported change. Fields that do not apply to `kind` stay at their defaults.
///
/// A `ChildList` record that lists the same node in both `added_nodes` and
/// `removed_nodes` is a move signal: the node was repositioned in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    pub target: N,
    pub added_nodes: Vec<N>,
    pub removed_nodes: Vec<N>,
    pub previous_sibling: Option<N>,
    pub next_sibling: Option<N>,
    pub attribute_name: Option<Arc<str>>,
    pub attribute_namespace: Option<Arc<str>>,
    pub old_value: Option<String>,
}

impl<N: Copy + PartialEq> MutationRecord<N> {
    fn empty(kind: MutationKind, target: N) -> Self {
        Self {
            kind,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            attribute_namespace: None,
            old_value: None,
        }
    }

    pub fn attribute(
        target: N,
        name: &str,
        namespace: Option<&str>,
        old_value: Option<String>,
    ) -> Self {
        Self {
            attribute_name: Some(Arc::from(name)),
            attribute_namespace: namespace.map(Arc::from),
            old_value,
            ..Self::empty(MutationKind::Attributes, target)
        }
    }

    pub fn character_data(target: N, old_value: Option<String>) -> Self {
        Self {
            old_value,
            ..Self::empty(MutationKind::CharacterData, target)
        }
    }

    pub fn inserted(target: N, node: N, previous: Option<N>, next: Option<N>) -> Self {
        Self {
            added_nodes: vec![node],
            previous_sibling: previous,
            next_sibling: next,
            ..Self::empty(MutationKind::ChildList, target)
        }
    }

    pub fn removed(target: N, node: N, previous: Option<N>, next: Option<N>) -> Self {
        Self {
            removed_nodes: vec![node],
            previous_sibling: previous,
            next_sibling: next,
            ..Self::empty(MutationKind::ChildList, target)
        }
    }

    pub fn moved(target: N, node: N, previous: Option<N>, next: Option<N>) -> Self {
        Self {
            added_nodes: vec![node],
            removed_nodes: vec![node],
            previous_sibling: previous,
            next_sibling: next,
            ..Self::empty(MutationKind::ChildList, target)
        }
    }

    /// True for the synthetic "moved in place" child-list record.
    pub fn is_move(&self) -> bool {
        self.kind == MutationKind::ChildList
            && self.added_nodes.len() == 1
            && self.removed_nodes.len() == 1
            && self.added_nodes[0] == self.removed_nodes[0]
    }
}
