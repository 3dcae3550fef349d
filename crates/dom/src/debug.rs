use crate::Document;
use crate::types::{NodeKey, NodeKind};
use std::fmt::Write;

/// One line per node, indented by depth. Intended for logs and test failure output.
pub fn outline(doc: &Document, root: NodeKey) -> Vec<String> {
    const INDENT_STEP: &str = "  ";

    let mut out = Vec::new();
    let mut stack = vec![(root, 0usize)];
    while let Some((key, depth)) = stack.pop() {
        let mut line = INDENT_STEP.repeat(depth);
        match doc.kind(key) {
            Some(NodeKind::Document) => line.push_str("#document"),
            Some(NodeKind::Element { name, attributes }) => {
                let _ = write!(&mut line, "<{name}");
                for attr in attributes {
                    match &attr.namespace {
                        Some(ns) => {
                            let _ = write!(&mut line, " {ns}:{}=\"{}\"", attr.name, attr.value);
                        }
                        None => {
                            let _ = write!(&mut line, " {}=\"{}\"", attr.name, attr.value);
                        }
                    }
                }
                line.push('>');
            }
            Some(NodeKind::Text { text }) => {
                let _ = write!(&mut line, "\"{text}\"");
            }
            Some(NodeKind::Comment { text }) => {
                let _ = write!(&mut line, "<!--{text}-->");
            }
            None => {
                let _ = write!(&mut line, "<stale #{}>", key.0);
            }
        }
        let _ = write!(&mut line, " #{}", key.0);
        out.push(line);
        for child in doc.children(key).iter().rev() {
            stack.push((*child, depth + 1));
        }
    }
    out
}
