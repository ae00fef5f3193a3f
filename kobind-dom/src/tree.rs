use std::borrow::Cow;

use crate::escape::{decode_entities, escape_attr, escape_text};

/// Handle to a node inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Double,
    Single,
    Bare,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    /// Source form of the value, `None` for boolean attributes.
    pub raw: Option<String>,
    pub quote: Quote,
}

impl Attr {
    /// Build an attribute from an unescaped value.
    pub fn new(name: impl Into<String>, value: &str) -> Self {
        Attr {
            name: name.into(),
            raw: Some(escape_attr(value).into_owned()),
            quote: Quote::Double,
        }
    }

    /// Entity-decoded value; empty for boolean attributes.
    pub fn value(&self) -> Cow<'_, str> {
        match &self.raw {
            Some(raw) => decode_entities(raw),
            None => Cow::Borrowed(""),
        }
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub self_closing: bool,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            self_closing: false,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.tag.eq_ignore_ascii_case(tag)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.iter().any(|v| self.is(v))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.attrs
            .iter()
            .position(|a| a.name.eq_ignore_ascii_case(name))
    }

    pub fn attr(&self, name: &str) -> Option<Cow<'_, str>> {
        self.position(name).map(|i| self.attrs[i].value())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let attr = Attr::new(name, value);
        match self.position(name) {
            Some(i) => {
                self.attrs[i].raw = attr.raw;
                self.attrs[i].quote = Quote::Double;
            }
            None => self.attrs.push(attr),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<Attr> {
        self.position(name).map(|i| self.attrs.remove(i))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element(Element),
    /// Source form, entities still encoded.
    Text(String),
    /// Everything between `<!--` and `-->`.
    Comment(String),
    /// Everything between `<!` and `>`.
    Doctype(String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An HTML tree stored in an arena. Nodes are addressed by [`NodeId`];
/// every structural change goes through this type so parent and child
/// links always agree.
///
/// Detached nodes stay allocated until the document is dropped.
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            slots: vec![Slot {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        NodeId(self.slots.len() - 1)
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.slots[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.slots[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.slots[id.0].data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn tag_is(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|e| e.is(tag))
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<Cow<'_, str>> {
        self.element(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(e) = self.element_mut(id) {
            e.set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> bool {
        self.element_mut(id)
            .and_then(|e| e.remove_attr(name))
            .is_some()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.0].parent
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeData::Element(Element::new(tag)))
    }

    /// Create a text node from plain text; markup characters are escaped.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Text(escape_text(text).into_owned()))
    }

    /// Create a text node whose content is already in source form.
    pub fn create_raw_text(&mut self, raw: &str) -> NodeId {
        self.alloc(NodeData::Text(raw.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeData::Comment(text.to_string()))
    }

    pub(crate) fn create_node(&mut self, data: NodeData) -> NodeId {
        self.alloc(data)
    }

    /// Unlink `id` from its parent, if any.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.slots[id.0].parent.take() {
            self.slots[parent.0].children.retain(|c| *c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.slots[child.0].parent = Some(parent);
        self.slots[parent.0].children.push(child);
    }

    /// Insert `child` before `reference`; appends when `reference` is not a
    /// child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        self.slots[child.0].parent = Some(parent);
        let children = &mut self.slots[parent.0].children;
        match children.iter().position(|c| *c == reference) {
            Some(i) => children.insert(i, child),
            None => children.push(child),
        }
    }

    /// Detach and return all children of `parent`, in order.
    pub fn take_children(&mut self, parent: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.slots[parent.0].children);
        for c in &children {
            self.slots[c.0].parent = None;
        }
        children
    }

    pub fn replace_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        self.take_children(parent);
        for c in children {
            self.append_child(parent, c);
        }
    }

    /// Copy `id` and its subtree; the copy is detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let data = self.slots[id.0].data.clone();
        let copy = self.alloc(data);
        let children = self.slots[id.0].children.clone();
        for c in children {
            let child_copy = self.deep_clone(c);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Copy a subtree of another document into this one; the copy is
    /// detached.
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.alloc(other.data(id).clone());
        for &c in other.children(id) {
            let child_copy = self.import(other, c);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Pre-order walk below `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    pub fn descendants_with_attr<'a>(
        &'a self,
        id: NodeId,
        name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.descendants(id)
            .filter(move |n| self.element(*n).is_some_and(|e| e.has_attr(name)))
    }

    /// Concatenated, entity-decoded text of `id` and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(raw) = self.data(id) {
            out.push_str(&decode_entities(raw));
        }
        for n in self.descendants(id) {
            if let NodeData::Text(raw) = self.data(n) {
                out.push_str(&decode_entities(raw));
            }
        }
        out
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        let t = self.create_text(text);
        self.replace_children(id, vec![t]);
    }

    pub fn is_whitespace_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(t) if t.chars().all(char::is_whitespace))
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_moves_between_parents() {
        let mut doc = Document::new();
        let a = doc.create_element("div");
        let b = doc.create_element("p");
        let t = doc.create_text("x");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), b);
        doc.append_child(a, t);
        doc.append_child(b, t);
        assert!(doc.children(a).is_empty());
        assert_eq!(doc.children(b), &[t]);
        assert_eq!(doc.parent(t), Some(b));
    }

    #[test]
    fn set_attr_keeps_position() {
        let mut e = Element::new("input");
        e.set_attr("type", "radio");
        e.set_attr("value", "a");
        e.set_attr("TYPE", "checkbox");
        assert_eq!(e.attrs[0].name, "type");
        assert_eq!(e.attr("type").as_deref(), Some("checkbox"));
    }
}
