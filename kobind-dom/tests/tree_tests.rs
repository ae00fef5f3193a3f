use kobind_dom::Document;

fn first_element(doc: &Document) -> kobind_dom::NodeId {
    doc.children(doc.root())[0]
}

#[test]
fn deep_clone_is_detached_and_independent() {
    let mut doc = Document::parse(r#"<ul><li class="a">one</li></ul>"#).unwrap();
    let ul = first_element(&doc);
    let li = doc.children(ul)[0];

    let copy = doc.deep_clone(li);
    assert_eq!(doc.parent(copy), None);
    doc.set_attr(copy, "class", "b");
    doc.append_child(ul, copy);

    assert_eq!(
        doc.to_html(),
        r#"<ul><li class="a">one</li><li class="b">one</li></ul>"#
    );
}

#[test]
fn import_copies_from_another_document() {
    let other = Document::parse("<b>bold</b><i>it</i>").unwrap();
    let mut doc = Document::parse("<p></p>").unwrap();
    let p = first_element(&doc);
    for &c in other.children(other.root()) {
        let copy = doc.import(&other, c);
        doc.append_child(p, copy);
    }
    assert_eq!(doc.to_html(), "<p><b>bold</b><i>it</i></p>");
}

#[test]
fn insert_before_and_take_children() {
    let mut doc = Document::parse("<div><b></b></div>").unwrap();
    let div = first_element(&doc);
    let b = doc.children(div)[0];
    let c = doc.create_comment(" marker ");
    doc.insert_before(div, c, b);
    assert_eq!(doc.to_html(), "<div><!-- marker --><b></b></div>");

    let taken = doc.take_children(div);
    assert_eq!(taken, vec![c, b]);
    assert_eq!(doc.parent(b), None);
    assert_eq!(doc.to_html(), "<div></div>");
}

#[test]
fn descendants_are_in_document_order() {
    let doc = Document::parse(
        r#"<div data-bind="a"><p data-bind="b"><span data-bind="c"></span></p><i data-bind="d"></i></div>"#,
    )
    .unwrap();
    let order: Vec<String> = doc
        .descendants_with_attr(doc.root(), "data-bind")
        .map(|n| doc.attr(n, "data-bind").unwrap().into_owned())
        .collect();
    assert_eq!(order, vec!["a", "b", "c", "d"]);
}

#[test]
fn set_text_content_escapes() {
    let mut doc = Document::parse("<span>old</span>").unwrap();
    let span = first_element(&doc);
    doc.set_text_content(span, "<Earth & Moon>");
    assert_eq!(doc.to_html(), "<span>&lt;Earth &amp; Moon&gt;</span>");
    assert_eq!(doc.text_content(span), "<Earth & Moon>");
}

#[test]
fn created_nodes_serialize() {
    let mut doc = Document::new();
    let sel = doc.create_element("select");
    doc.set_attr(sel, "multiple", "multiple");
    let option = doc.create_element("option");
    let label = doc.create_text("Alpha");
    doc.append_child(option, label);
    doc.append_child(sel, option);
    doc.append_child(doc.root(), sel);
    assert_eq!(
        doc.to_html(),
        r#"<select multiple="multiple"><option>Alpha</option></select>"#
    );
}

#[test]
fn whitespace_text_detection() {
    let doc = Document::parse("<ul>\n\t<li>x</li>\n</ul>").unwrap();
    let ul = first_element(&doc);
    let kids = doc.children(ul);
    assert!(doc.is_whitespace_text(kids[0]));
    assert!(!doc.is_whitespace_text(kids[1]));
    assert!(doc.is_whitespace_text(kids[2]));
}
