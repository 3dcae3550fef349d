//! Snapshot-versus-live diffing.
//!
//! Contract:
//! - Children are walked in lockstep (`i` over live children, `j` over the
//!   snapshot). Identical nodes at both cursors advance with no record.
//! - On a mismatch the unmatched live node is looked up in the snapshot from
//!   `j` onward and the unmatched snapshot node in the live list from `i`
//!   onward. A miss is an insert (or remove); a hit is a conflict pair.
//! - A run of conflicts is resolved at the next lockstep match, or when both
//!   lists are exhausted. Pairs are resolved last-recorded first.
//! - A pair is reported as a move when its displacement `|i - j|` reaches the
//!   run threshold and the run still has move budget. Every pair gets content
//!   diffing and, with `subtree`, a walk of its own children.
//! - Record order: content before children at a node, parent before child,
//!   left-to-right among siblings.
//!
//! The walk keeps an explicit frame stack instead of recursing, and the pass
//! never fails: a node that cannot be tagged is matched by linear search.

use crate::config::WatchFlags;
use crate::host::{NodeCategory, ObservedTree};
use crate::identity::IdentityTable;
use crate::record::MutationRecord;
use crate::snapshot::{ROOT, Snapshot, SnapshotAttr};
use core_types::NodeTag;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::ops::Range;

/// Smallest displacement ever reported as a move. A pair shifted by a single
/// slot is explained equally well by its neighbour moving, so it is left alone.
pub const MIN_MOVE_DISPLACEMENT: usize = 2;

/// Compare the live subtree under `root` against `old` and append records to `out`.
pub(crate) fn diff_subtree<T: ObservedTree>(
    tree: &T,
    root: T::Node,
    flags: &WatchFlags,
    old: &Snapshot<T::Node>,
    identity: &mut IdentityTable<T::Node>,
    out: &mut Vec<MutationRecord<T::Node>>,
) {
    let before = out.len();
    let mut pass = DiffPass {
        tree,
        flags,
        old,
        identity,
        out,
    };
    if flags.attributes {
        if let Some(attrs) = old.attributes(ROOT) {
            pass.diff_attributes(root, attrs);
        }
    }
    if flags.character_data && tree.category(root) == NodeCategory::Text {
        pass.diff_character_data(root, ROOT);
    }
    if flags.child_list || flags.subtree {
        pass.walk(root);
    }
    log::trace!(
        target: "observer.diff",
        "diffed {root:?}: {} records",
        pass.out.len() - before
    );
}

struct DiffPass<'t, 'a, T: ObservedTree> {
    tree: &'t T,
    flags: &'a WatchFlags,
    old: &'a Snapshot<T::Node>,
    identity: &'a mut IdentityTable<T::Node>,
    out: &'a mut Vec<MutationRecord<T::Node>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Conflict {
    i: usize,
    j: usize,
}

/// Lazily built state for the non-fast path of one child list.
struct Scan<N> {
    visited: HashSet<NodeTag>,
    /// Nodes handled without a tag.
    visited_untagged: HashSet<N>,
    conflicts: Vec<Conflict>,
    old_index: Option<TagIndex>,
    live_index: Option<TagIndex>,
}

impl<N> Default for Scan<N> {
    fn default() -> Self {
        Self {
            visited: HashSet::new(),
            visited_untagged: HashSet::new(),
            conflicts: Vec::new(),
            old_index: None,
            live_index: None,
        }
    }
}

/// Tag to position lookup over one child sequence.
struct TagIndex {
    positions: HashMap<NodeTag, usize>,
    /// Some entries could not be tagged; a miss must be confirmed linearly.
    partial: bool,
}

impl TagIndex {
    fn build(tags: impl Iterator<Item = Option<NodeTag>>) -> Self {
        let mut positions = HashMap::new();
        let mut partial = false;
        for (pos, tag) in tags.enumerate() {
            match tag {
                Some(tag) => {
                    positions.insert(tag, pos);
                }
                None => partial = true,
            }
        }
        Self { positions, partial }
    }
}

/// Resolution state of one conflict run.
struct Resolution {
    pending: Vec<Conflict>,
    threshold: usize,
    budget: isize,
}

enum Step<N> {
    Descend(N, usize),
    Done,
}

struct Frame<'t, N> {
    parent: N,
    live: &'t [N],
    old: Range<usize>,
    i: usize,
    j: usize,
    net_inserted: isize,
    scan: Option<Scan<N>>,
    resolution: Option<Resolution>,
    /// Lockstep pair whose children are walked once the pending run is resolved.
    matched: Option<(usize, usize)>,
    exhausted: bool,
}

impl<'t, 'a, T: ObservedTree> DiffPass<'t, 'a, T> {
    fn diff_attributes(&mut self, node: T::Node, old_attrs: &[SnapshotAttr]) {
        let tree = self.tree;
        for attr in tree.attributes(node) {
            if !self.flags.accepts_attribute(attr.name) {
                continue;
            }
            let previous = old_attrs.iter().find(|old| &*old.name == attr.name);
            if previous.is_some_and(|old| old.value == attr.value) {
                continue;
            }
            self.out.push(MutationRecord::attribute(
                node,
                attr.name,
                attr.namespace,
                previous.map(|old| old.value.clone()),
            ));
        }
        for old in old_attrs {
            let still_present = tree.attributes(node).any(|attr| attr.name == &*old.name);
            if !still_present {
                self.out.push(MutationRecord::attribute(
                    node,
                    &old.name,
                    old.namespace.as_deref(),
                    Some(old.value.clone()),
                ));
            }
        }
    }

    fn diff_character_data(&mut self, node: T::Node, old_index: usize) {
        let Some(previous) = self.old.payload(old_index) else {
            return;
        };
        let current = self.tree.text(node).unwrap_or_default();
        if current != previous {
            self.out
                .push(MutationRecord::character_data(node, Some(previous.to_string())));
        }
    }

    /// Attribute and character-data diff of a node that persisted across the edit.
    fn diff_content(&mut self, node: T::Node, old_index: usize) {
        let old = self.old;
        if self.flags.attributes {
            if let Some(attrs) = old.attributes(old_index) {
                self.diff_attributes(node, attrs);
            }
        }
        if self.flags.character_data && self.tree.category(node) == NodeCategory::Text {
            self.diff_character_data(node, old_index);
        }
    }

    fn frame(&self, parent: T::Node, old_index: usize) -> Frame<'t, T::Node> {
        Frame {
            parent,
            live: self.tree.children(parent),
            old: self.old.children(old_index),
            i: 0,
            j: 0,
            net_inserted: 0,
            scan: None,
            resolution: None,
            matched: None,
            exhausted: false,
        }
    }

    fn walk(&mut self, root: T::Node) {
        let mut stack = vec![self.frame(root, ROOT)];
        while let Some(frame) = stack.last_mut() {
            match self.step(frame) {
                Step::Descend(node, old_index) => {
                    let child = self.frame(node, old_index);
                    stack.push(child);
                }
                Step::Done => {
                    stack.pop();
                }
            }
        }
    }

    /// Advance `frame` until it needs a child walk or has finished.
    fn step(&mut self, frame: &mut Frame<'t, T::Node>) -> Step<T::Node> {
        loop {
            if let Some(resolution) = frame.resolution.as_mut() {
                if let Some(conflict) = resolution.pending.pop() {
                    let node = frame.live[conflict.i];
                    let old_index = frame.old.start + conflict.j;
                    if self.flags.child_list
                        && resolution.budget > 0
                        && conflict.i.abs_diff(conflict.j) >= resolution.threshold
                    {
                        resolution.budget -= 1;
                        let (previous, next) = neighbours(frame.live, conflict.i);
                        self.out
                            .push(MutationRecord::moved(frame.parent, node, previous, next));
                    }
                    self.diff_content(node, old_index);
                    if self.flags.subtree {
                        return Step::Descend(node, old_index);
                    }
                    continue;
                }
                frame.resolution = None;
            }

            if let Some((i, j)) = frame.matched.take() {
                let node = frame.live[i];
                let old_index = frame.old.start + j;
                if self.flags.subtree
                    && (!self.tree.children(node).is_empty() || self.old.has_children(old_index))
                {
                    return Step::Descend(node, old_index);
                }
                continue;
            }

            if frame.exhausted {
                return Step::Done;
            }

            let (i, j) = (frame.i, frame.j);
            let live_node = frame.live.get(i).copied();
            let old_node = (j < frame.old.len()).then(|| self.old.node(frame.old.start + j).node);

            if live_node.is_none() && old_node.is_none() {
                frame.exhausted = true;
                self.begin_resolution(frame);
                continue;
            }

            if live_node.is_some() && live_node == old_node {
                let node = frame.live[i];
                self.diff_content(node, frame.old.start + j);
                frame.i += 1;
                frame.j += 1;
                frame.matched = Some((i, j));
                self.begin_resolution(frame);
                continue;
            }

            if let Some(node) = live_node {
                let tag = self.identity.tag(self.tree, node);
                if first_visit(frame, node, tag) {
                    match self.find_in_old(frame, node, tag, j) {
                        Some(found) => scan_of(frame).conflicts.push(Conflict { i, j: found }),
                        None => {
                            if self.flags.child_list {
                                let (previous, next) = neighbours(frame.live, i);
                                self.out.push(MutationRecord::inserted(
                                    frame.parent,
                                    node,
                                    previous,
                                    next,
                                ));
                                frame.net_inserted += 1;
                            }
                        }
                    }
                }
                frame.i += 1;
            }

            if let Some(node) = old_node {
                // The live cursor may have just caught up with this node; if so
                // leave `j` alone so the lockstep path picks the pair up.
                if frame.live.get(frame.i) != Some(&node) {
                    let tag = self
                        .old
                        .node(frame.old.start + j)
                        .tag
                        .or_else(|| self.identity.peek(node));
                    if first_visit(frame, node, tag) {
                        match self.find_in_live(frame, node, tag, frame.i) {
                            Some(found) => scan_of(frame).conflicts.push(Conflict { i: found, j }),
                            None => {
                                if self.flags.child_list {
                                    let (previous, next) = self.old_neighbours(frame, j);
                                    self.out.push(MutationRecord::removed(
                                        frame.parent,
                                        node,
                                        previous,
                                        next,
                                    ));
                                    frame.net_inserted -= 1;
                                }
                            }
                        }
                    }
                    frame.j += 1;
                }
            }
        }
    }

    /// Move the accumulated conflicts into a resolution run.
    fn begin_resolution(&self, frame: &mut Frame<'t, T::Node>) {
        let Some(scan) = frame.scan.as_mut() else {
            return;
        };
        if scan.conflicts.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut scan.conflicts);
        let span = pending.len() - 1;
        let budget = (span as isize - frame.net_inserted) / 2 + 1;
        log::trace!(
            target: "observer.diff",
            "resolving {} conflicts under {:?} (net inserted {}, budget {budget})",
            pending.len(),
            frame.parent,
            frame.net_inserted
        );
        frame.net_inserted = 0;
        frame.resolution = Some(Resolution {
            pending,
            threshold: span.max(MIN_MOVE_DISPLACEMENT),
            budget,
        });
    }

    /// Position of live `node` among the snapshot children at or after `from`.
    fn find_in_old(
        &mut self,
        frame: &mut Frame<'t, T::Node>,
        node: T::Node,
        tag: Option<NodeTag>,
        from: usize,
    ) -> Option<usize> {
        let old = self.old;
        let range = frame.old.clone();
        if let Some(tag) = tag {
            let index = scan_of(frame).old_index.get_or_insert_with(|| {
                TagIndex::build(range.clone().map(|index| old.node(index).tag))
            });
            match index.positions.get(&tag) {
                Some(&pos) if pos >= from => return Some(pos),
                Some(_) => return None,
                None if !index.partial => return None,
                None => {}
            }
        }
        (from..range.len()).find(|&pos| old.node(range.start + pos).node == node)
    }

    /// Position of snapshot `node` among the live children at or after `from`.
    fn find_in_live(
        &mut self,
        frame: &mut Frame<'t, T::Node>,
        node: T::Node,
        tag: Option<NodeTag>,
        from: usize,
    ) -> Option<usize> {
        let live = frame.live;
        if let Some(tag) = tag {
            if scan_of(frame).live_index.is_none() {
                let tags: Vec<Option<NodeTag>> = live
                    .iter()
                    .map(|child| self.identity.tag(self.tree, *child))
                    .collect();
                scan_of(frame).live_index = Some(TagIndex::build(tags.into_iter()));
            }
            if let Some(index) = scan_of(frame).live_index.as_ref() {
                match index.positions.get(&tag) {
                    Some(&pos) if pos >= from => return Some(pos),
                    Some(_) => return None,
                    None if !index.partial => return None,
                    None => {}
                }
            }
        }
        live.iter()
            .skip(from)
            .position(|child| *child == node)
            .map(|pos| pos + from)
    }

    fn old_neighbours(
        &self,
        frame: &Frame<'t, T::Node>,
        j: usize,
    ) -> (Option<T::Node>, Option<T::Node>) {
        let previous = j
            .checked_sub(1)
            .map(|prev| self.old.node(frame.old.start + prev).node);
        let next = (j + 1 < frame.old.len()).then(|| self.old.node(frame.old.start + j + 1).node);
        (previous, next)
    }
}

fn scan_of<'f, N>(frame: &'f mut Frame<'_, N>) -> &'f mut Scan<N> {
    frame.scan.get_or_insert_with(Scan::default)
}

/// Marks `node` as handled in this child list; false if it already was.
fn first_visit<N: Eq + Hash>(frame: &mut Frame<'_, N>, node: N, tag: Option<NodeTag>) -> bool {
    let scan = scan_of(frame);
    if scan.visited_untagged.contains(&node) || tag.is_some_and(|tag| scan.visited.contains(&tag)) {
        return false;
    }
    match tag {
        Some(tag) => scan.visited.insert(tag),
        None => scan.visited_untagged.insert(node),
    }
}

fn neighbours<N: Copy>(list: &[N], index: usize) -> (Option<N>, Option<N>) {
    let previous = index.checked_sub(1).map(|prev| list[prev]);
    let next = list.get(index + 1).copied();
    (previous, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObserveConfig;
    use crate::record::MutationKind;
    use dom::fixtures::{append_element, append_text, labelled_list, numbered_list};
    use dom::{Document, NodeKey};

    struct Harness {
        flags: WatchFlags,
        identity: IdentityTable<NodeKey>,
        snapshot: Snapshot<NodeKey>,
        root: NodeKey,
    }

    impl Harness {
        fn new(doc: &Document, root: NodeKey, config: ObserveConfig) -> Self {
            let flags = WatchFlags::from_config(&config);
            let mut identity = IdentityTable::new();
            let snapshot = Snapshot::capture(doc, root, &flags, &mut identity);
            Self {
                flags,
                identity,
                snapshot,
                root,
            }
        }

        fn diff(&mut self, doc: &Document) -> Vec<MutationRecord<NodeKey>> {
            let mut out = Vec::new();
            diff_subtree(
                doc,
                self.root,
                &self.flags,
                &self.snapshot,
                &mut self.identity,
                &mut out,
            );
            if !out.is_empty() {
                self.snapshot = Snapshot::capture(doc, self.root, &self.flags, &mut self.identity);
            }
            out
        }
    }

    #[test]
    fn unchanged_tree_is_quiet() {
        let mut doc = Document::new();
        let (list, _) = numbered_list(&mut doc, 5);
        let config = ObserveConfig::new().attributes().child_list().subtree().character_data();
        let mut harness = Harness::new(&doc, list, config);
        assert!(harness.diff(&doc).is_empty());
        assert!(harness.diff(&doc).is_empty());
    }

    #[test]
    fn append_reports_single_insert() {
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a", "b"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        let c = append_element(&mut doc, list, "li");
        let records = harness.diff(&doc);
        assert_eq!(records, vec![MutationRecord::inserted(list, c, Some(items[1]), None)]);
        assert!(harness.diff(&doc).is_empty());
    }

    #[test]
    fn remove_reports_snapshot_siblings() {
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a", "b", "c"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        doc.remove_child(list, items[1]).unwrap();
        let records = harness.diff(&doc);
        assert_eq!(
            records,
            vec![MutationRecord::removed(list, items[1], Some(items[0]), Some(items[2]))]
        );
    }

    #[test]
    fn mid_list_insert_is_not_a_move() {
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a", "b", "c"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        let x = doc.create_element("li");
        doc.insert_before(list, x, items[1]).unwrap();
        let records = harness.diff(&doc);
        assert_eq!(
            records,
            vec![MutationRecord::inserted(list, x, Some(items[0]), Some(items[1]))]
        );
    }

    #[test]
    fn replace_reports_insert_then_remove() {
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a", "b", "c"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        let x = doc.create_element("li");
        doc.insert_before(list, x, items[1]).unwrap();
        doc.remove_child(list, items[1]).unwrap();
        let records = harness.diff(&doc);
        assert_eq!(
            records,
            vec![
                MutationRecord::inserted(list, x, Some(items[0]), Some(items[2])),
                MutationRecord::removed(list, items[1], Some(items[0]), Some(items[2])),
            ]
        );
    }

    #[test]
    fn adjacent_swap_is_below_move_threshold() {
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a", "b", "c"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        doc.move_to(list, items[2], 1).unwrap();
        assert_eq!(doc.children(list), &[items[0], items[2], items[1]]);
        assert!(harness.diff(&doc).is_empty());
    }

    #[test]
    fn far_move_reports_single_move() {
        let mut doc = Document::new();
        let (list, items) = numbered_list(&mut doc, 10);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        doc.move_to(list, items[0], 9).unwrap();
        let records = harness.diff(&doc);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(record.is_move());
        assert_eq!(record.added_nodes, vec![items[0]]);
        assert_eq!(record.previous_sibling, Some(items[9]));
        assert_eq!(record.next_sibling, None);
    }

    struct FrontInserts {
        list: NodeKey,
        items: Vec<NodeKey>,
        added: Vec<NodeKey>,
        records: Vec<MutationRecord<NodeKey>>,
    }

    /// Move item 0 of a ten-item list to the end and insert `count` fresh
    /// items at the front, then diff once.
    fn far_move_behind_front_inserts(count: usize) -> FrontInserts {
        let mut doc = Document::new();
        let (list, items) = numbered_list(&mut doc, 10);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        doc.move_to(list, items[0], 9).unwrap();
        let added: Vec<NodeKey> = (0..count)
            .map(|index| {
                let key = doc.create_element("li");
                doc.insert_at(list, key, index).unwrap();
                key
            })
            .collect();
        let records = harness.diff(&doc);
        FrontInserts {
            list,
            items,
            added,
            records,
        }
    }

    #[test]
    fn one_front_insert_keeps_the_far_move() {
        let FrontInserts {
            list,
            items,
            added,
            records,
        } = far_move_behind_front_inserts(1);
        assert_eq!(
            records,
            vec![
                MutationRecord::inserted(list, added[0], None, Some(items[1])),
                MutationRecord::moved(list, items[0], Some(items[9]), None),
            ]
        );
    }

    #[test]
    fn two_front_inserts_exhaust_the_move_budget() {
        // The run resolves at items[1] with span 0 and two net inserts:
        // budget (0 - 2) / 2 + 1 == 0, so the far move goes unreported.
        let FrontInserts {
            list,
            items,
            added,
            records,
        } = far_move_behind_front_inserts(2);
        assert_eq!(
            records,
            vec![
                MutationRecord::inserted(list, added[0], None, Some(added[1])),
                MutationRecord::inserted(list, added[1], Some(added[0]), Some(items[1])),
            ]
        );
    }

    #[test]
    fn three_front_inserts_fold_into_one_long_run() {
        // Lockstep never resumes, so all ten snapshot items join one run:
        // span 9, budget (9 - 3) / 2 + 1 == 4, threshold 9. Only item 0 moved
        // that far.
        let FrontInserts {
            list,
            items,
            added,
            records,
        } = far_move_behind_front_inserts(3);
        assert_eq!(
            records,
            vec![
                MutationRecord::inserted(list, added[0], None, Some(added[1])),
                MutationRecord::inserted(list, added[1], Some(added[0]), Some(added[2])),
                MutationRecord::inserted(list, added[2], Some(added[1]), Some(items[1])),
                MutationRecord::moved(list, items[0], Some(items[9]), None),
            ]
        );
    }

    #[test]
    fn negative_move_budget_reports_no_move() {
        // [a] -> [x0, x1, x2, x3, a]: one conflict, four net inserts,
        // budget (0 - 4) / 2 + 1 == -1.
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list());
        let added: Vec<NodeKey> = (0..4)
            .map(|index| {
                let key = doc.create_element("li");
                doc.insert_at(list, key, index).unwrap();
                key
            })
            .collect();
        let records = harness.diff(&doc);
        assert_eq!(records.len(), 4);
        assert!(records.iter().all(|record| !record.is_move()));
        assert_eq!(
            records[3],
            MutationRecord::inserted(list, added[3], Some(added[2]), Some(items[0]))
        );
    }

    #[test]
    fn moved_node_content_changes_are_still_reported() {
        let mut doc = Document::new();
        let (list, items) = numbered_list(&mut doc, 6);
        let config = ObserveConfig::new().child_list().attributes().subtree();
        let mut harness = Harness::new(&doc, list, config);
        doc.move_to(list, items[5], 0).unwrap();
        doc.set_attribute(items[5], "data-label", "moved").unwrap();
        let records = harness.diff(&doc);
        assert!(records.iter().any(|r| r.is_move() && r.added_nodes == vec![items[5]]));
        let attr = records
            .iter()
            .find(|r| r.kind == MutationKind::Attributes)
            .expect("attribute record");
        assert_eq!(attr.target, items[5]);
        assert_eq!(attr.old_value.as_deref(), Some("item5"));
    }

    #[test]
    fn attribute_change_add_and_remove() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = append_element(&mut doc, root, "div");
        doc.set_attribute(div, "class", "x").unwrap();
        doc.set_attribute(div, "id", "a").unwrap();
        let mut harness = Harness::new(&doc, div, ObserveConfig::new().attributes());
        doc.set_attribute(div, "class", "y").unwrap();
        doc.remove_attribute(div, "id").unwrap();
        doc.set_attribute_ns(div, "xlink", "href", "#t").unwrap();
        let records = harness.diff(&doc);
        assert_eq!(
            records,
            vec![
                MutationRecord::attribute(div, "class", None, Some("x".into())),
                MutationRecord::attribute(div, "href", Some("xlink"), None),
                MutationRecord::attribute(div, "id", None, Some("a".into())),
            ]
        );
    }

    #[test]
    fn attribute_filter_hides_other_names() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = append_element(&mut doc, root, "div");
        let mut harness = Harness::new(&doc, div, ObserveConfig::new().attribute_filter(["class"]));
        doc.set_attribute(div, "id", "a").unwrap();
        assert!(harness.diff(&doc).is_empty());
        doc.set_attribute(div, "class", "b").unwrap();
        assert_eq!(harness.diff(&doc).len(), 1);
    }

    #[test]
    fn child_attributes_need_subtree() {
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a"]);
        let mut shallow = Harness::new(&doc, list, ObserveConfig::new().attributes().child_list());
        let mut deep = Harness::new(
            &doc,
            list,
            ObserveConfig::new().attributes().child_list().subtree(),
        );
        doc.set_attribute(items[0], "data-label", "z").unwrap();
        assert!(shallow.diff(&doc).is_empty());
        let records = deep.diff(&doc);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, items[0]);
    }

    #[test]
    fn character_data_in_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let div = append_element(&mut doc, root, "div");
        let p = append_element(&mut doc, div, "p");
        let text = append_text(&mut doc, p, "old");
        let comment = doc.create_comment("c");
        doc.append_child(p, comment).unwrap();
        let mut harness = Harness::new(&doc, div, ObserveConfig::new().character_data().subtree());
        doc.set_text(text, "new").unwrap();
        doc.set_text(comment, "ignored").unwrap();
        let records = harness.diff(&doc);
        assert_eq!(records, vec![MutationRecord::character_data(text, Some("old".into()))]);
    }

    #[test]
    fn text_root_compares_payload() {
        let mut doc = Document::new();
        let root = doc.root();
        let text = append_text(&mut doc, root, "a");
        let mut harness = Harness::new(&doc, text, ObserveConfig::new().character_data());
        doc.set_text(text, "b").unwrap();
        assert_eq!(
            harness.diff(&doc),
            vec![MutationRecord::character_data(text, Some("a".into()))]
        );
    }

    #[test]
    fn nested_insert_reported_under_its_parent() {
        let mut doc = Document::new();
        let (list, items) = labelled_list(&mut doc, &["a", "b"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().child_list().subtree());
        let span = append_element(&mut doc, items[1], "span");
        let records = harness.diff(&doc);
        assert_eq!(records, vec![MutationRecord::inserted(items[1], span, None, None)]);
    }

    #[test]
    fn subtree_without_child_list_reports_no_structure() {
        let mut doc = Document::new();
        let (list, _) = labelled_list(&mut doc, &["a"]);
        let mut harness = Harness::new(&doc, list, ObserveConfig::new().subtree().attributes());
        append_element(&mut doc, list, "li");
        assert!(harness.diff(&doc).is_empty());
    }

    #[test]
    fn untaggable_nodes_use_linear_search() {
        struct Untagged<'a>(&'a Document);

        impl ObservedTree for Untagged<'_> {
            type Node = NodeKey;

            fn category(&self, node: NodeKey) -> NodeCategory {
                self.0.category(node)
            }
            fn children(&self, node: NodeKey) -> &[NodeKey] {
                self.0.children(node)
            }
            fn attributes(
                &self,
                node: NodeKey,
            ) -> impl Iterator<Item = crate::host::AttrRef<'_>> + '_ {
                ObservedTree::attributes(self.0, node)
            }
            fn text(&self, node: NodeKey) -> Option<&str> {
                ObservedTree::text(self.0, node)
            }
            fn contains(&self, node: NodeKey) -> bool {
                self.0.contains(node)
            }
            fn supports_tagging(&self, _node: NodeKey) -> bool {
                false
            }
        }

        let mut doc = Document::new();
        let (list, items) = numbered_list(&mut doc, 10);
        doc.move_to(list, items[0], 9).unwrap();
        let rotated = doc.children(list).to_vec();
        let flags = WatchFlags::from_config(&ObserveConfig::new().child_list());
        let mut identity = IdentityTable::new();

        // Snapshot taken through the untaggable view, then the list is rotated back.
        let view = Untagged(&doc);
        let snapshot = Snapshot::capture(&view, list, &flags, &mut identity);
        assert!(snapshot.node(snapshot.children(ROOT).start).tag.is_none());
        drop(view);
        doc.move_to(list, rotated[9], 0).unwrap();
        let view = Untagged(&doc);
        let mut out = Vec::new();
        diff_subtree(&view, list, &flags, &snapshot, &mut identity, &mut out);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_move());
        assert_eq!(out[0].added_nodes, vec![items[0]]);
        assert!(identity.fallbacks() > 0);
    }
}
