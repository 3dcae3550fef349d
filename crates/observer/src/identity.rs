//! Identity tags for observed nodes, kept in a side-table.
//!
//! Host nodes are never written to. The first time the engine needs the
//! identity of a node it asks the tree whether the node can be tagged and, if
//! so, records a fresh process-unique tag. Nodes that cannot be tagged get
//! `None` and the caller falls back to a linear search.

use crate::host::ObservedTree;
use core_types::NodeTag;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TAG: AtomicU64 = AtomicU64::new(1);

fn next_tag() -> NodeTag {
    NodeTag(NEXT_TAG.fetch_add(1, Ordering::Relaxed))
}

pub struct IdentityTable<N> {
    tags: HashMap<N, NodeTag>,
    fallbacks: u64,
}

impl<N: Copy + Eq + Hash + std::fmt::Debug> IdentityTable<N> {
    pub fn new() -> Self {
        Self {
            tags: HashMap::new(),
            fallbacks: 0,
        }
    }

    /// Tag for `node`, assigning one on first encounter.
    pub fn tag<T>(&mut self, tree: &T, node: N) -> Option<NodeTag>
    where
        T: ObservedTree<Node = N>,
    {
        if let Some(tag) = self.tags.get(&node) {
            return Some(*tag);
        }
        if !tree.supports_tagging(node) {
            self.fallbacks = self.fallbacks.saturating_add(1);
            log::trace!(target: "observer.identity", "node {node:?} rejected tagging; using linear search");
            return None;
        }
        let tag = next_tag();
        self.tags.insert(node, tag);
        Some(tag)
    }

    /// Tag already assigned to `node`, without assigning one.
    pub fn peek(&self, node: N) -> Option<NodeTag> {
        self.tags.get(&node).copied()
    }

    /// Drop tags of nodes the tree no longer resolves.
    pub fn retain_live<T>(&mut self, tree: &T)
    where
        T: ObservedTree<Node = N>,
    {
        let before = self.tags.len();
        self.tags.retain(|node, _| tree.contains(*node));
        let dropped = before - self.tags.len();
        if dropped > 0 {
            log::trace!(target: "observer.identity", "released {dropped} stale tags");
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of lookups that fell back to linear search.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }
}

impl<N: Copy + Eq + Hash + std::fmt::Debug> Default for IdentityTable<N> {
    fn default() -> Self {
        Self::new()
    }
}
