//! Capabilities the observer needs from a host tree.
//!
//! The observer never owns host nodes. It holds `Node` handles, reads through
//! this trait and keeps any identity bookkeeping in its own side-table.

use dom::{Document, NodeKey, NodeKind};
use std::fmt::Debug;
use std::hash::Hash;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeCategory {
    /// Elements and documents: may carry attributes and children.
    Element,
    /// Character data that is diffed for content.
    Text,
    /// Comments, doctypes and anything else: cloned but never diffed for content.
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttrRef<'a> {
    pub namespace: Option<&'a str>,
    pub name: &'a str,
    pub value: &'a str,
}

pub trait ObservedTree {
    type Node: Copy + Eq + Hash + Debug;

    fn category(&self, node: Self::Node) -> NodeCategory;

    fn children(&self, node: Self::Node) -> &[Self::Node];

    fn attributes(&self, node: Self::Node) -> impl Iterator<Item = AttrRef<'_>> + '_;

    fn text(&self, node: Self::Node) -> Option<&str>;

    /// Whether the handle still resolves to a node.
    fn contains(&self, node: Self::Node) -> bool;

    /// Whether the node may be given an identity tag. Untaggable nodes are
    /// matched by linear search instead.
    fn supports_tagging(&self, node: Self::Node) -> bool {
        let _ = node;
        true
    }
}

impl ObservedTree for Document {
    type Node = NodeKey;

    fn category(&self, node: NodeKey) -> NodeCategory {
        match self.kind(node) {
            Some(NodeKind::Document) | Some(NodeKind::Element { .. }) => NodeCategory::Element,
            Some(NodeKind::Text { .. }) => NodeCategory::Text,
            Some(NodeKind::Comment { .. }) | None => NodeCategory::Other,
        }
    }

    fn children(&self, node: NodeKey) -> &[NodeKey] {
        Document::children(self, node)
    }

    fn attributes(&self, node: NodeKey) -> impl Iterator<Item = AttrRef<'_>> + '_ {
        Document::attributes(self, node).iter().map(|attr| AttrRef {
            namespace: attr.namespace.as_deref(),
            name: &attr.name,
            value: &attr.value,
        })
    }

    fn text(&self, node: NodeKey) -> Option<&str> {
        match self.kind(node) {
            Some(NodeKind::Text { text }) => Some(text),
            _ => None,
        }
    }

    fn contains(&self, node: NodeKey) -> bool {
        Document::contains(self, node)
    }

    fn supports_tagging(&self, node: NodeKey) -> bool {
        node != NodeKey::INVALID && Document::contains(self, node)
    }
}
