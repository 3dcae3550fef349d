#![no_main]

use dom::fixtures::{append_element, append_text, numbered_list};
use dom::{Document, NodeKey, NodeKind};
use libfuzzer_sys::fuzz_target;
use observer::{Delivery, MutationObserver, MutationRecord, ObserveConfig};

const MAX_EDITS: usize = 64;

fn pick(nodes: &[NodeKey], byte: u8) -> Option<NodeKey> {
    if nodes.is_empty() {
        return None;
    }
    Some(nodes[byte as usize % nodes.len()])
}

fn is_element(doc: &Document, key: NodeKey) -> bool {
    matches!(doc.kind(key), Some(NodeKind::Element { .. }))
}

/// Apply one edit chosen by `op`. Failed edits (cycles, detached parents) are ignored.
fn apply(doc: &mut Document, live: &mut Vec<NodeKey>, op: u8, a: u8, b: u8) {
    live.retain(|key| doc.contains(*key));
    let (Some(target), Some(other)) = (pick(live, a), pick(live, b)) else {
        return;
    };
    let _ = match op % 7 {
        0 if is_element(doc, target) => {
            live.push(append_element(doc, target, "div"));
            Ok(())
        }
        1 if is_element(doc, target) => {
            live.push(append_text(doc, target, "t"));
            Ok(())
        }
        2 if is_element(doc, other) => doc.move_to(other, target, b as usize),
        3 => doc.destroy(target),
        4 if is_element(doc, target) => doc
            .set_attribute(target, if b % 2 == 0 { "class" } else { "id" }, &a.to_string())
            .map(drop),
        5 if is_element(doc, target) => doc.remove_attribute(target, "class").map(drop),
        6 if !is_element(doc, target) => doc.set_text(target, &b.to_string()),
        _ => Ok(()),
    };
}

fn config_for(bits: u8) -> ObserveConfig {
    let mut config = ObserveConfig::new();
    if bits & 1 != 0 {
        config = config.child_list();
    }
    if bits & 2 != 0 {
        config = config.attributes();
    }
    if bits & 4 != 0 {
        config = config.character_data();
    }
    if bits & 8 != 0 {
        config = config.subtree();
    }
    config
}

fuzz_target!(|data: &[u8]| {
    let Some((&bits, edits)) = data.split_first() else {
        return;
    };
    let mut doc = Document::new();
    let (list, mut live) = numbered_list(&mut doc, 8);
    live.push(list);

    let mut observer =
        MutationObserver::new(|_: &[MutationRecord<NodeKey>], _: &mut Delivery<'_, Document>| Ok(()));
    observer.observe(&doc, list, config_for(bits));

    for chunk in edits.chunks_exact(3).take(MAX_EDITS) {
        apply(&mut doc, &mut live, chunk[0], chunk[1], chunk[2]);
    }

    let records = observer.take_records(&doc);
    for record in &records {
        for added in &record.added_nodes {
            assert!(doc.contains(*added), "added node {added:?} is not live");
        }
    }
    // A diff that produced records re-snapshots, so an immediate second pass is quiet.
    assert!(observer.take_records(&doc).is_empty());
});
