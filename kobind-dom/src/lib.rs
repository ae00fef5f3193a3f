//! Arena-backed HTML tree: lenient parsing, in-place mutation through
//! [`Document`], and serialization that keeps untouched markup as written.

pub mod escape;
pub mod parse;
mod serialize;
pub mod tree;

pub use parse::ParseError;
pub use tree::{Attr, Descendants, Document, Element, NodeData, NodeId, Quote};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_tree() {
        let mut doc = Document::new();
        let id = doc.create_element("div");
        doc.set_attr(id, "class", "app");
        let hello = doc.create_text("hello");
        let span = doc.create_element("span");
        let world = doc.create_text("world");
        doc.append_child(span, world);
        doc.append_child(id, hello);
        doc.append_child(id, span);
        doc.append_child(doc.root(), id);

        assert!(doc.tag_is(id, "div"));
        assert_eq!(doc.attr(id, "class").as_deref(), Some("app"));
        assert_eq!(doc.children(id).len(), 2);
        assert_eq!(
            doc.to_html(),
            r#"<div class="app">hello<span>world</span></div>"#
        );
    }
}
