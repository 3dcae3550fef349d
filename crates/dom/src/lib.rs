pub mod debug;
#[cfg(any(test, feature = "test-harness"))]
pub mod fixtures;

mod document;
mod error;
mod types;

pub use crate::document::Document;
pub use crate::error::DomError;
pub use crate::types::{Attribute, NodeId, NodeKey, NodeKind};
