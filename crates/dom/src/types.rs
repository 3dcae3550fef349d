use std::sync::Arc;

pub type NodeId = u32;

/// Non-owning handle to a node in a [`Document`](crate::Document).
///
/// Keys are allocated monotonically and never reused, so a key that outlives
/// its node simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub NodeId);

impl NodeKey {
    /// Reserved sentinel for "unassigned/invalid" identity.
    pub const INVALID: NodeKey = NodeKey(0);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub namespace: Option<Arc<str>>,
    pub name: Arc<str>,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            namespace: None,
            name: Arc::from(name),
            value: value.to_string(),
        }
    }

    pub fn with_namespace(namespace: &str, name: &str, value: &str) -> Self {
        Self {
            namespace: Some(Arc::from(namespace)),
            name: Arc::from(name),
            value: value.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<Attribute>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl NodeKind {
    pub fn allows_children(&self) -> bool {
        matches!(self, NodeKind::Document | NodeKind::Element { .. })
    }
}
