use kobind_dom::{Document, NodeData, ParseError};

#[test]
fn untouched_markup_round_trips() {
    let src = r#"<!DOCTYPE html>
<html>
<head><title>Hello &amp; welcome</title></head>
<body>
  <p class='lead' data-bind="text: FirstName">Placeholder</p>
  <input type="checkbox" checked data-bind="checked: BooleanValue" />
  <!-- a comment -->
  <script>if (a < b) { run(); }</script>
  <p>1 < 2 &amp;&amp; 3 > 2</p>
</body>
</html>
"#;
    let doc = Document::parse(src).expect("parse ok");
    assert_eq!(doc.to_html(), src);
}

#[test]
fn implied_end_tags_are_closed() {
    let doc = Document::parse("<ul><li>a<li>b</ul>").unwrap();
    assert_eq!(doc.to_html(), "<ul><li>a</li><li>b</li></ul>");

    let doc = Document::parse("<select><option>x<option>y</select>").unwrap();
    assert_eq!(
        doc.to_html(),
        "<select><option>x</option><option>y</option></select>"
    );
}

#[test]
fn stray_end_tag_is_dropped() {
    let doc = Document::parse("<div>x</span></div>").unwrap();
    assert_eq!(doc.to_html(), "<div>x</div>");
}

#[test]
fn open_elements_close_at_end_of_input() {
    let doc = Document::parse("<div><p>x").unwrap();
    assert_eq!(doc.to_html(), "<div><p>x</p></div>");
}

#[test]
fn comments_become_comment_nodes() {
    let doc = Document::parse("<div><!-- ko text: Name --><!-- /ko --></div>").unwrap();
    let div = doc.children(doc.root())[0];
    let kids = doc.children(div);
    assert_eq!(kids.len(), 2);
    assert_eq!(
        doc.data(kids[0]),
        &NodeData::Comment(" ko text: Name ".to_string())
    );
}

#[test]
fn unterminated_comment_is_an_error() {
    let err = Document::parse("<div><!-- oops</div>").unwrap_err();
    assert_eq!(err, ParseError::UnterminatedComment { offset: 5 });
}

#[test]
fn unterminated_tag_is_an_error() {
    let err = Document::parse(r#"<p>ok</p><div class="x"#).unwrap_err();
    assert_eq!(
        err,
        ParseError::UnterminatedTag {
            tag: "div".into(),
            offset: 9
        }
    );
}

#[test]
fn values_are_decoded_on_read() {
    let doc = Document::parse(r#"<a title="say &quot;hi&quot;">fish &amp; chips</a>"#).unwrap();
    let a = doc.children(doc.root())[0];
    assert_eq!(doc.attr(a, "title").as_deref(), Some(r#"say "hi""#));
    assert_eq!(doc.text_content(a), "fish & chips");
}

#[test]
fn raw_text_elements_keep_markup_inside() {
    let doc = Document::parse("<textarea><b>not bold</b></textarea>").unwrap();
    let ta = doc.children(doc.root())[0];
    assert_eq!(doc.children(ta).len(), 1);
    assert_eq!(doc.text_content(ta), "<b>not bold</b>");
}
