use log::debug;
use thiserror::Error;

use crate::tree::{Attr, Document, Element, NodeData, NodeId, Quote};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },
    #[error("unterminated tag `{tag}` starting at byte {offset}")]
    UnterminatedTag { tag: String, offset: usize },
}

/// Elements whose content is kept verbatim up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

impl Document {
    /// Parse markup into a new document.
    ///
    /// The parser is lenient: stray end tags are dropped, elements left open
    /// at the end of input are closed, and the usual implied end tags
    /// (`li`, `option`, `tr`, `td`, ...) are honored. Text and attribute
    /// values keep their source form so unmodified input serializes back
    /// unchanged.
    pub fn parse(input: &str) -> Result<Document, ParseError> {
        let mut doc = Document::new();
        let root = doc.root();
        parse_into(&mut doc, root, input)?;
        Ok(doc)
    }
}

/// Parse `input` and append the resulting nodes to `parent`.
pub fn parse_into(doc: &mut Document, parent: NodeId, input: &str) -> Result<(), ParseError> {
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut open: Vec<NodeId> = vec![parent];

    while i < bytes.len() {
        let top = *open.last().unwrap_or(&parent);

        if !is_markup_start(bytes, i) {
            let start = i;
            i += 1;
            while i < bytes.len() && !is_markup_start(bytes, i) {
                i += 1;
            }
            let t = doc.create_raw_text(&input[start..i]);
            doc.append_child(top, t);
            continue;
        }

        if bytes[i + 1] == b'!' {
            if input[i..].starts_with("<!--") {
                let end = input[i + 4..]
                    .find("-->")
                    .ok_or(ParseError::UnterminatedComment { offset: i })?;
                let c = doc.create_comment(&input[i + 4..i + 4 + end]);
                doc.append_child(top, c);
                i += 4 + end + 3;
            } else {
                let end = input[i..].find('>').ok_or_else(|| ParseError::UnterminatedTag {
                    tag: "!".to_string(),
                    offset: i,
                })?;
                let d = doc.create_node(NodeData::Doctype(input[i + 2..i + end].to_string()));
                doc.append_child(top, d);
                i += end + 1;
            }
            continue;
        }

        if bytes[i + 1] == b'/' {
            let offset = i;
            i += 2;
            let tag = read_name(input, &mut i);
            let end = input[i..].find('>').ok_or_else(|| ParseError::UnterminatedTag {
                tag: format!("/{tag}"),
                offset,
            })?;
            i += end + 1;
            close_element(doc, &mut open, &tag);
            continue;
        }

        // start tag
        let offset = i;
        i += 1;
        let tag = read_name(input, &mut i);
        let mut element = Element::new(tag.clone());
        loop {
            skip_ws(bytes, &mut i);
            if i >= bytes.len() {
                return Err(ParseError::UnterminatedTag { tag, offset });
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    element.self_closing = true;
                    i += 2;
                    break;
                }
                _ => match read_attribute(input, &mut i) {
                    Some(attr) => element.attrs.push(attr),
                    // skip unknown token
                    None => i += 1,
                },
            }
        }

        while open.len() > 1 {
            let current = open[open.len() - 1];
            let closes = doc
                .element(current)
                .is_some_and(|e| implies_end(&e.tag, &tag));
            if !closes {
                break;
            }
            open.pop();
        }
        let top = *open.last().unwrap_or(&parent);

        let is_void = element.is_void() || element.self_closing;
        let is_raw = RAW_TEXT_ELEMENTS.iter().any(|r| element.is(r));
        let id = doc.create_node(NodeData::Element(element));
        doc.append_child(top, id);

        if is_void {
            continue;
        }
        if is_raw {
            let (content_end, resume) = find_raw_end(input, i, &tag);
            if content_end > i {
                let t = doc.create_raw_text(&input[i..content_end]);
                doc.append_child(id, t);
            }
            i = resume;
            continue;
        }
        open.push(id);
    }

    Ok(())
}

/// A `<` that opens a tag, end tag, comment or declaration.
fn is_markup_start(bytes: &[u8], i: usize) -> bool {
    if bytes[i] != b'<' || i + 1 >= bytes.len() {
        return false;
    }
    let next = bytes[i + 1];
    next.is_ascii_alphabetic()
        || next == b'!'
        || (next == b'/' && bytes.get(i + 2).is_some_and(|b| b.is_ascii_alphabetic()))
}

fn implies_end(open_tag: &str, new_tag: &str) -> bool {
    let open_tag = open_tag.to_ascii_lowercase();
    let new_tag = new_tag.to_ascii_lowercase();
    match open_tag.as_str() {
        "li" => new_tag == "li",
        "option" => matches!(new_tag.as_str(), "option" | "optgroup"),
        "optgroup" => new_tag == "optgroup",
        "tr" => new_tag == "tr",
        "td" | "th" => matches!(new_tag.as_str(), "td" | "th" | "tr"),
        "dt" | "dd" => matches!(new_tag.as_str(), "dt" | "dd"),
        "p" => matches!(
            new_tag.as_str(),
            "p" | "div" | "ul" | "ol" | "dl" | "table" | "form" | "section" | "pre" | "blockquote"
                | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
        ),
        _ => false,
    }
}

fn close_element(doc: &Document, open: &mut Vec<NodeId>, tag: &str) {
    // open[0] is the parse target and never closed here
    let found = open
        .iter()
        .skip(1)
        .rposition(|id| doc.element(*id).is_some_and(|e| e.is(tag)));
    match found {
        Some(pos) => open.truncate(pos + 1),
        None => debug!("dropping stray end tag </{tag}>"),
    }
}

/// Returns (end of content, position after the end tag).
fn find_raw_end(input: &str, from: usize, tag: &str) -> (usize, usize) {
    let needle = format!("</{}", tag.to_ascii_lowercase());
    let lower = input[from..].to_ascii_lowercase();
    match lower.find(&needle) {
        Some(pos) => {
            let start = from + pos;
            let resume = input[start..]
                .find('>')
                .map_or(input.len(), |e| start + e + 1);
            (start, resume)
        }
        None => (input.len(), input.len()),
    }
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn read_name(input: &str, i: &mut usize) -> String {
    let bytes = input.as_bytes();
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_whitespace() || c == b'>' || c == b'/' || c == b'=' {
            break;
        }
        *i += 1;
    }
    input[start..*i].to_string()
}

/// `None` when no attribute name could be read at `i`. An unterminated
/// quoted value runs to the end of input, which the caller reports.
fn read_attribute(input: &str, i: &mut usize) -> Option<Attr> {
    let bytes = input.as_bytes();
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_whitespace() || matches!(c, b'>' | b'/' | b'=' | b'"' | b'\'') {
            break;
        }
        *i += 1;
    }
    if *i == start {
        return None;
    }
    let name = input[start..*i].to_string();

    let mut j = *i;
    skip_ws(bytes, &mut j);
    if j >= bytes.len() || bytes[j] != b'=' {
        return Some(Attr {
            name,
            raw: None,
            quote: Quote::Bare,
        });
    }
    j += 1;
    skip_ws(bytes, &mut j);
    *i = j;

    let attr = match bytes.get(*i) {
        Some(&q) if q == b'"' || q == b'\'' => {
            let value_start = *i + 1;
            let Some(len) = input[value_start..].find(q as char) else {
                *i = bytes.len();
                return Some(Attr {
                    name,
                    raw: Some(input[value_start..].to_string()),
                    quote: Quote::Bare,
                });
            };
            *i = value_start + len + 1;
            Attr {
                name,
                raw: Some(input[value_start..value_start + len].to_string()),
                quote: if q == b'"' { Quote::Double } else { Quote::Single },
            }
        }
        _ => {
            let value_start = *i;
            while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
                *i += 1;
            }
            Attr {
                name,
                raw: Some(input[value_start..*i].to_string()),
                quote: Quote::Bare,
            }
        }
    };
    Some(attr)
}
