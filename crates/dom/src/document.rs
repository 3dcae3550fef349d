//! Mutable arena document.
//!
//! Invariants:
//! - Every live node except the document root has at most one parent.
//! - A node's `children` list holds live keys only, in document order.
//! - Keys are never reused; `destroy` frees a subtree and its keys stop resolving.
//! - Detached nodes (no parent) stay live and can be re-inserted.

use crate::error::DomError;
use crate::types::{Attribute, NodeKey, NodeKind};
use std::sync::Arc;

pub struct Document {
    nodes: Vec<Option<NodeRecord>>,
    root: NodeKey,
}

struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeKey::INVALID,
        };
        doc.root = doc.alloc(NodeKind::Document);
        doc
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn create_element(&mut self, name: &str) -> NodeKey {
        self.create_element_with(name, Vec::new())
    }

    pub fn create_element_with(&mut self, name: &str, attributes: Vec<Attribute>) -> NodeKey {
        self.alloc(NodeKind::Element {
            name: Arc::from(name),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeKey {
        self.alloc(NodeKind::Text {
            text: text.to_string(),
        })
    }

    pub fn create_comment(&mut self, text: &str) -> NodeKey {
        self.alloc(NodeKind::Comment {
            text: text.to_string(),
        })
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.record(key).is_some()
    }

    pub fn kind(&self, key: NodeKey) -> Option<&NodeKind> {
        self.record(key).map(|record| &record.kind)
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.record(key).and_then(|record| record.parent)
    }

    /// Children of `key` in document order; empty for leaves and stale keys.
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.record(key)
            .map(|record| record.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn previous_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let siblings = self.children(self.parent(key)?);
        let pos = siblings.iter().position(|k| *k == key)?;
        pos.checked_sub(1).map(|prev| siblings[prev])
    }

    pub fn next_sibling(&self, key: NodeKey) -> Option<NodeKey> {
        let siblings = self.children(self.parent(key)?);
        let pos = siblings.iter().position(|k| *k == key)?;
        siblings.get(pos + 1).copied()
    }

    pub fn attributes(&self, key: NodeKey) -> &[Attribute] {
        match self.kind(key) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.attributes(key)
            .iter()
            .find(|attr| &*attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Text payload of text and comment nodes.
    pub fn text(&self, key: NodeKey) -> Option<&str> {
        match self.kind(key) {
            Some(NodeKind::Text { text }) | Some(NodeKind::Comment { text }) => Some(text),
            _ => None,
        }
    }

    pub fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        let index = self.children(parent).len();
        self.insert_at(parent, child, index)
    }

    pub fn insert_before(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        before: NodeKey,
    ) -> Result<(), DomError> {
        let index = self
            .children(parent)
            .iter()
            .position(|k| *k == before)
            .ok_or(DomError::NotAChild {
                parent,
                child: before,
            })?;
        self.insert_at(parent, child, index)
    }

    /// Insert a detached `child` at `index` in `parent`'s children, clamped to the end.
    pub fn insert_at(
        &mut self,
        parent: NodeKey,
        child: NodeKey,
        index: usize,
    ) -> Result<(), DomError> {
        self.ensure_container(parent)?;
        let child_record = self.record(child).ok_or(DomError::MissingNode(child))?;
        if child_record.parent.is_some() || child == self.root {
            return Err(DomError::AlreadyAttached(child));
        }
        if parent == child || self.is_descendant(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        let siblings = &mut self.record_mut(parent)?.children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.record_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.record_mut(parent)?.children.retain(|k| *k != child);
        self.record_mut(child)?.parent = None;
        Ok(())
    }

    /// Detach `key` from its parent, if it has one.
    pub fn detach(&mut self, key: NodeKey) -> Result<(), DomError> {
        match self.parent(key) {
            Some(parent) => self.remove_child(parent, key),
            None if self.contains(key) => Ok(()),
            None => Err(DomError::MissingNode(key)),
        }
    }

    /// Detach `key` and reinsert it at `index` under `parent`.
    ///
    /// `index` is interpreted against the parent's children after the detach.
    pub fn move_to(
        &mut self,
        parent: NodeKey,
        key: NodeKey,
        index: usize,
    ) -> Result<(), DomError> {
        self.detach(key)?;
        self.insert_at(parent, key, index)
    }

    /// Detach `key` and free it together with its whole subtree.
    pub fn destroy(&mut self, key: NodeKey) -> Result<(), DomError> {
        if key == self.root {
            return Err(DomError::WrongNodeKind(key));
        }
        self.detach(key)?;
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(record) = self.slot_mut(current).and_then(Option::take) {
                stack.extend(record.children);
            }
        }
        log::trace!(target: "dom", "destroyed subtree rooted at {}", key.0);
        Ok(())
    }

    /// Set (or add) a non-namespaced attribute. Returns the previous value.
    pub fn set_attribute(
        &mut self,
        key: NodeKey,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, DomError> {
        let attributes = self.attributes_mut(key)?;
        match attributes.iter_mut().find(|attr| &*attr.name == name) {
            Some(existing) => Ok(Some(std::mem::replace(
                &mut existing.value,
                value.to_string(),
            ))),
            None => {
                attributes.push(Attribute::new(name, value));
                Ok(None)
            }
        }
    }

    pub fn set_attribute_ns(
        &mut self,
        key: NodeKey,
        namespace: &str,
        name: &str,
        value: &str,
    ) -> Result<Option<String>, DomError> {
        let attributes = self.attributes_mut(key)?;
        match attributes.iter_mut().find(|attr| &*attr.name == name) {
            Some(existing) => {
                existing.namespace = Some(Arc::from(namespace));
                Ok(Some(std::mem::replace(
                    &mut existing.value,
                    value.to_string(),
                )))
            }
            None => {
                attributes.push(Attribute::with_namespace(namespace, name, value));
                Ok(None)
            }
        }
    }

    pub fn remove_attribute(&mut self, key: NodeKey, name: &str) -> Result<Option<String>, DomError> {
        let attributes = self.attributes_mut(key)?;
        let removed = attributes
            .iter()
            .position(|attr| &*attr.name == name)
            .map(|pos| attributes.remove(pos).value);
        Ok(removed)
    }

    /// Replace the payload of a text or comment node.
    pub fn set_text(&mut self, key: NodeKey, text: &str) -> Result<(), DomError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Text { text: existing } | NodeKind::Comment { text: existing } => {
                existing.clear();
                existing.push_str(text);
                Ok(())
            }
            _ => Err(DomError::WrongNodeKind(key)),
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeKey {
        self.nodes.push(Some(NodeRecord {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        NodeKey(self.nodes.len() as u32)
    }

    fn slot_mut(&mut self, key: NodeKey) -> Option<&mut Option<NodeRecord>> {
        let index = (key.0 as usize).checked_sub(1)?;
        self.nodes.get_mut(index)
    }

    fn record(&self, key: NodeKey) -> Option<&NodeRecord> {
        let index = (key.0 as usize).checked_sub(1)?;
        self.nodes.get(index)?.as_ref()
    }

    fn record_mut(&mut self, key: NodeKey) -> Result<&mut NodeRecord, DomError> {
        self.slot_mut(key)
            .and_then(Option::as_mut)
            .ok_or(DomError::MissingNode(key))
    }

    fn attributes_mut(&mut self, key: NodeKey) -> Result<&mut Vec<Attribute>, DomError> {
        match &mut self.record_mut(key)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::WrongNodeKind(key)),
        }
    }

    fn ensure_container(&self, key: NodeKey) -> Result<(), DomError> {
        let record = self.record(key).ok_or(DomError::MissingNode(key))?;
        if !record.kind.allows_children() {
            return Err(DomError::NotAContainer(key));
        }
        Ok(())
    }

    fn is_descendant(&self, ancestor: NodeKey, maybe_descendant: NodeKey) -> bool {
        let mut stack: Vec<NodeKey> = self.children(ancestor).to_vec();
        while let Some(current) = stack.pop() {
            if current == maybe_descendant {
                return true;
            }
            stack.extend(self.children(current).iter().copied());
        }
        false
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(doc: &mut Document, names: &[&str]) -> (NodeKey, Vec<NodeKey>) {
        let parent = doc.create_element("ul");
        doc.append_child(doc.root(), parent).expect("append parent");
        let kids = names
            .iter()
            .map(|name| {
                let li = doc.create_element(name);
                doc.append_child(parent, li).expect("append child");
                li
            })
            .collect();
        (parent, kids)
    }

    #[test]
    fn append_and_siblings() {
        let mut doc = Document::new();
        let (parent, kids) = list(&mut doc, &["a", "b", "c"]);
        assert_eq!(doc.children(parent), kids.as_slice());
        assert_eq!(doc.previous_sibling(kids[1]), Some(kids[0]));
        assert_eq!(doc.next_sibling(kids[1]), Some(kids[2]));
        assert_eq!(doc.next_sibling(kids[2]), None);
        assert_eq!(doc.parent(kids[0]), Some(parent));
    }

    #[test]
    fn insert_rejects_attached_and_cycles() {
        let mut doc = Document::new();
        let (parent, kids) = list(&mut doc, &["a"]);
        assert_eq!(
            doc.append_child(parent, kids[0]),
            Err(DomError::AlreadyAttached(kids[0]))
        );
        doc.detach(parent).expect("detach");
        assert_eq!(
            doc.append_child(kids[0], parent),
            Err(DomError::CycleDetected {
                parent: kids[0],
                child: parent
            })
        );
    }

    #[test]
    fn move_to_reorders_within_parent() {
        let mut doc = Document::new();
        let (parent, kids) = list(&mut doc, &["a", "b", "c"]);
        doc.move_to(parent, kids[0], 2).expect("move");
        assert_eq!(doc.children(parent), &[kids[1], kids[2], kids[0]]);
    }

    #[test]
    fn destroy_frees_subtree_without_reusing_keys() {
        let mut doc = Document::new();
        let (parent, kids) = list(&mut doc, &["a", "b"]);
        doc.destroy(parent).expect("destroy");
        assert!(!doc.contains(parent));
        assert!(!doc.contains(kids[1]));
        assert!(doc.children(doc.root()).is_empty());
        let fresh = doc.create_element("p");
        assert!(kids.iter().all(|k| *k != fresh));
    }

    #[test]
    fn attribute_updates_return_previous_value() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        assert_eq!(doc.set_attribute(div, "class", "x"), Ok(None));
        assert_eq!(
            doc.set_attribute(div, "class", "y"),
            Ok(Some("x".to_string()))
        );
        assert_eq!(doc.attribute(div, "class"), Some("y"));
        assert_eq!(doc.remove_attribute(div, "class"), Ok(Some("y".to_string())));
        assert!(doc.attributes(div).is_empty());
    }

    #[test]
    fn set_text_rejects_elements() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        let text = doc.create_text("hi");
        assert_eq!(doc.set_text(div, "x"), Err(DomError::WrongNodeKind(div)));
        doc.set_text(text, "bye").expect("set text");
        assert_eq!(doc.text(text), Some("bye"));
    }
}
