//! Active watches, kept in registration order.
//!
//! Invariants:
//! - At most one entry per root; registering a root again replaces its entry
//!   (config, snapshot and subscriber) and moves it to the end of the order.
//! - An entry's snapshot reflects the tree as of its last diff that produced
//!   records, or its registration if none has.

use crate::config::{ObserveConfig, WatchFlags};
use crate::diff::diff_subtree;
use crate::host::ObservedTree;
use crate::identity::IdentityTable;
use crate::observer::Subscriber;
use crate::record::MutationRecord;
use crate::snapshot::Snapshot;
use core_types::WatchHandle;

/// Where an entry's records are delivered.
pub(crate) enum Route<T: ObservedTree> {
    /// The observer-wide subscriber passed to `MutationObserver::new`.
    Shared,
    Own(Subscriber<T>),
}

pub struct WatchEntry<T: ObservedTree> {
    handle: WatchHandle,
    root: T::Node,
    config: ObserveConfig,
    flags: WatchFlags,
    snapshot: Snapshot<T::Node>,
    pub(crate) route: Route<T>,
}

impl<T: ObservedTree> WatchEntry<T> {
    pub fn handle(&self) -> WatchHandle {
        self.handle
    }

    pub fn root(&self) -> T::Node {
        self.root
    }

    pub fn config(&self) -> &ObserveConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &Snapshot<T::Node> {
        &self.snapshot
    }

    /// Diff the live tree against the stored snapshot. The snapshot is rebuilt
    /// only when the pass produced records.
    pub(crate) fn collect(
        &mut self,
        tree: &T,
        identity: &mut IdentityTable<T::Node>,
    ) -> Vec<MutationRecord<T::Node>> {
        let mut records = Vec::new();
        diff_subtree(
            tree,
            self.root,
            &self.flags,
            &self.snapshot,
            identity,
            &mut records,
        );
        if !records.is_empty() {
            self.snapshot = Snapshot::capture(tree, self.root, &self.flags, identity);
        }
        records
    }
}

pub struct Registry<T: ObservedTree> {
    entries: Vec<WatchEntry<T>>,
    next_handle: u64,
}

impl<T: ObservedTree> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_handle: 1,
        }
    }

    pub(crate) fn register(
        &mut self,
        tree: &T,
        root: T::Node,
        config: ObserveConfig,
        route: Route<T>,
        identity: &mut IdentityTable<T::Node>,
    ) -> WatchHandle {
        if let Some(pos) = self.entries.iter().position(|entry| entry.root == root) {
            let replaced = self.entries.remove(pos);
            log::debug!(
                target: "observer.registry",
                "replacing watch {} on {root:?}",
                replaced.handle.0
            );
        }
        let handle = WatchHandle(self.next_handle);
        self.next_handle += 1;
        let flags = WatchFlags::from_config(&config);
        let snapshot = Snapshot::capture(tree, root, &flags, identity);
        log::debug!(
            target: "observer.registry",
            "watch {} on {root:?}: {config:?} ({} nodes captured)",
            handle.0,
            snapshot.len()
        );
        self.entries.push(WatchEntry {
            handle,
            root,
            config,
            flags,
            snapshot,
            route,
        });
        handle
    }

    /// Remove the entry for `handle`. Returns false for unknown handles.
    pub fn unregister(&mut self, handle: WatchHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        let removed = self.entries.len() != before;
        if removed {
            log::debug!(target: "observer.registry", "unregistered watch {}", handle.0);
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, handle: WatchHandle) -> Option<&WatchEntry<T>> {
        self.entries.iter().find(|entry| entry.handle == handle)
    }

    pub fn handle_for(&self, root: T::Node) -> Option<WatchHandle> {
        self.entries
            .iter()
            .find(|entry| entry.root == root)
            .map(|entry| entry.handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchEntry<T>> {
        self.entries.iter()
    }

    pub(crate) fn entries_mut(&mut self) -> std::slice::IterMut<'_, WatchEntry<T>> {
        self.entries.iter_mut()
    }
}

impl<T: ObservedTree> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
