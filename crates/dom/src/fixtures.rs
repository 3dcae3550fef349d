//! Tree-building helpers shared by unit tests, integration tests and benches.

use crate::Document;
use crate::types::NodeKey;

/// Append a fresh element named `name` under `parent`.
pub fn append_element(doc: &mut Document, parent: NodeKey, name: &str) -> NodeKey {
    let key = doc.create_element(name);
    doc.append_child(parent, key)
        .expect("fixture parent must accept children");
    key
}

pub fn append_text(doc: &mut Document, parent: NodeKey, text: &str) -> NodeKey {
    let key = doc.create_text(text);
    doc.append_child(parent, key)
        .expect("fixture parent must accept children");
    key
}

/// Build `<container>` under the document root with one `<li>` per entry of
/// `labels`, each carrying a `data-label` attribute. Returns the container and
/// its children.
pub fn labelled_list(doc: &mut Document, labels: &[&str]) -> (NodeKey, Vec<NodeKey>) {
    let root = doc.root();
    let container = append_element(doc, root, "ul");
    let items = labels
        .iter()
        .map(|label| {
            let li = append_element(doc, container, "li");
            doc.set_attribute(li, "data-label", label)
                .expect("fixture item is an element");
            li
        })
        .collect();
    (container, items)
}

/// Same as [`labelled_list`] with labels `item0..itemN`.
pub fn numbered_list(doc: &mut Document, len: usize) -> (NodeKey, Vec<NodeKey>) {
    let labels: Vec<String> = (0..len).map(|i| format!("item{i}")).collect();
    let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
    labelled_list(doc, &refs)
}
