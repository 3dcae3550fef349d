//! Structural copies of a watched subtree, used as the diff baseline.
//!
//! A snapshot is a flat arena: index 0 is the watch root and each node's
//! children occupy one contiguous block, so the diff engine walks it with
//! plain indices.
//!
//! What gets copied depends on the watch flags and the depth:
//! - depth 0 copies attributes when attributes are watched;
//! - children of depth 0 are copied when child lists, character data, or
//!   attributes-with-subtree are watched;
//! - below depth 0 both only continue while `subtree` is set;
//! - text nodes keep their payload when character data is watched;
//! - comments and other nodes are copied as bare identities.

use crate::config::WatchFlags;
use crate::host::{NodeCategory, ObservedTree};
use crate::identity::IdentityTable;
use core_types::NodeTag;
use std::ops::Range;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotAttr {
    pub namespace: Option<Arc<str>>,
    pub name: Arc<str>,
    pub value: String,
}

/// Index of the watch root inside every snapshot.
pub const ROOT: usize = 0;

#[derive(Clone, Debug)]
pub enum SnapshotData {
    Element {
        attributes: Option<Vec<SnapshotAttr>>,
        children: Option<ChildBlock>,
    },
    Text {
        payload: Option<String>,
    },
    Other,
}

/// A node's block of children inside a snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildBlock {
    start: u32,
    len: u32,
}

#[derive(Clone, Debug)]
pub struct SnapshotNode<N> {
    pub node: N,
    pub tag: Option<NodeTag>,
    pub data: SnapshotData,
}

#[derive(Clone, Debug)]
pub struct Snapshot<N> {
    nodes: Vec<SnapshotNode<N>>,
}

impl<N: Copy + Eq + std::hash::Hash + std::fmt::Debug> Snapshot<N> {
    /// Copy `root` and as much of its subtree as `flags` require.
    pub(crate) fn capture<T>(
        tree: &T,
        root: N,
        flags: &WatchFlags,
        identity: &mut IdentityTable<N>,
    ) -> Self
    where
        T: ObservedTree<Node = N>,
    {
        let copy_children =
            flags.child_list || flags.character_data || (flags.attributes && flags.subtree);

        let mut nodes = vec![SnapshotNode {
            node: root,
            tag: identity.tag(tree, root),
            data: SnapshotData::Other,
        }];
        let mut stack = vec![(ROOT, 0usize)];
        while let Some((index, depth)) = stack.pop() {
            let node = nodes[index].node;
            let within_reach = depth == 0 || flags.subtree;
            let data = match tree.category(node) {
                NodeCategory::Element => {
                    let attributes = (flags.attributes && within_reach).then(|| {
                        tree.attributes(node)
                            .filter(|attr| flags.accepts_attribute(attr.name))
                            .map(|attr| SnapshotAttr {
                                namespace: attr.namespace.map(Arc::from),
                                name: Arc::from(attr.name),
                                value: attr.value.to_string(),
                            })
                            .collect()
                    });
                    let children = (copy_children && within_reach).then(|| {
                        let kids = tree.children(node);
                        let start = nodes.len();
                        for kid in kids {
                            nodes.push(SnapshotNode {
                                node: *kid,
                                tag: identity.tag(tree, *kid),
                                data: SnapshotData::Other,
                            });
                        }
                        for offset in (0..kids.len()).rev() {
                            stack.push((start + offset, depth + 1));
                        }
                        ChildBlock {
                            start: start as u32,
                            len: kids.len() as u32,
                        }
                    });
                    SnapshotData::Element {
                        attributes,
                        children,
                    }
                }
                NodeCategory::Text => SnapshotData::Text {
                    payload: flags
                        .character_data
                        .then(|| tree.text(node).unwrap_or_default().to_string()),
                },
                NodeCategory::Other => SnapshotData::Other,
            };
            nodes[index].data = data;
        }
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: usize) -> &SnapshotNode<N> {
        &self.nodes[index]
    }

    pub fn root_node(&self) -> N {
        self.nodes[ROOT].node
    }

    /// Absolute indices of the copied children of `index`; empty when none were copied.
    pub fn children(&self, index: usize) -> Range<usize> {
        match &self.nodes[index].data {
            SnapshotData::Element {
                children: Some(block),
                ..
            } => {
                let start = block.start as usize;
                start..start + block.len as usize
            }
            _ => 0..0,
        }
    }

    pub fn has_children(&self, index: usize) -> bool {
        !self.children(index).is_empty()
    }

    pub fn attributes(&self, index: usize) -> Option<&[SnapshotAttr]> {
        match &self.nodes[index].data {
            SnapshotData::Element {
                attributes: Some(attributes),
                ..
            } => Some(attributes),
            _ => None,
        }
    }

    pub fn payload(&self, index: usize) -> Option<&str> {
        match &self.nodes[index].data {
            SnapshotData::Text {
                payload: Some(payload),
            } => Some(payload),
            _ => None,
        }
    }
}
