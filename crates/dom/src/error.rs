use crate::types::NodeKey;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DomError {
    MissingNode(NodeKey),
    NotAContainer(NodeKey),
    NotAChild { parent: NodeKey, child: NodeKey },
    CycleDetected { parent: NodeKey, child: NodeKey },
    AlreadyAttached(NodeKey),
    WrongNodeKind(NodeKey),
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::MissingNode(key) => write!(f, "node {} does not exist", key.0),
            DomError::NotAContainer(key) => write!(f, "node {} cannot have children", key.0),
            DomError::NotAChild { parent, child } => {
                write!(f, "node {} is not a child of {}", child.0, parent.0)
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "inserting {} under {} would create a cycle", child.0, parent.0)
            }
            DomError::AlreadyAttached(key) => write!(f, "node {} already has a parent", key.0),
            DomError::WrongNodeKind(key) => write!(f, "node {} has the wrong kind", key.0),
        }
    }
}

impl std::error::Error for DomError {}
