//! Virtual blocks: `<!-- ko BODY -->` ... `<!-- /ko -->` comment pairs are
//! turned into synthetic `<ko data-bind="BODY">` elements before binding and
//! turned back into comments (or unwrapped) afterwards.

use kobind_dom::{Document, NodeData, NodeId};
use log::trace;
use thiserror::Error;

use crate::options::RenderOptions;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("`<!-- /{tag} -->` has no matching opening marker")]
    UnexpectedClose { tag: String },
    #[error("`<!-- {tag} {body} -->` is never closed")]
    Unclosed { tag: String, body: String },
}

enum Marker {
    Open(String),
    Close,
}

fn marker(doc: &Document, id: NodeId, tag: &str) -> Option<Marker> {
    let NodeData::Comment(text) = doc.data(id) else {
        return None;
    };
    let text = text.trim();
    if let Some(rest) = text.strip_prefix('/') {
        return (rest.trim() == tag).then_some(Marker::Close);
    }
    let rest = text.strip_prefix(tag)?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.trim();
    (!body.is_empty()).then(|| Marker::Open(body.to_string()))
}

/// Replace every balanced marker pair below `root` with a synthetic element.
pub fn normalize(
    doc: &mut Document,
    root: NodeId,
    options: &RenderOptions,
) -> Result<(), NormalizeError> {
    let mut pending = vec![root];
    while let Some(parent) = pending.pop() {
        normalize_children(doc, parent, options)?;
        pending.extend(
            doc.children(parent)
                .iter()
                .copied()
                .filter(|c| doc.element(*c).is_some()),
        );
    }
    Ok(())
}

fn normalize_children(
    doc: &mut Document,
    parent: NodeId,
    options: &RenderOptions,
) -> Result<(), NormalizeError> {
    let tag = options.virtual_tag.as_str();
    if !doc
        .children(parent)
        .iter()
        .any(|c| marker(doc, *c, tag).is_some())
    {
        return Ok(());
    }

    // (synthetic element, body, collected children); the bottom frame is `parent`
    let mut frames: Vec<(Option<NodeId>, String, Vec<NodeId>)> =
        vec![(None, String::new(), Vec::new())];
    for child in doc.take_children(parent) {
        match marker(doc, child, tag) {
            Some(Marker::Open(body)) => {
                let el = doc.create_element(tag);
                doc.set_attr(el, &options.attribute, &body);
                trace!("virtual block `{body}`");
                frames.push((Some(el), body, Vec::new()));
            }
            Some(Marker::Close) => {
                let Some((Some(el), _, children)) = frames.pop().filter(|_| !frames.is_empty())
                else {
                    return Err(NormalizeError::UnexpectedClose {
                        tag: tag.to_string(),
                    });
                };
                for c in children {
                    doc.append_child(el, c);
                }
                if let Some(top) = frames.last_mut() {
                    top.2.push(el);
                }
            }
            None => {
                if let Some(top) = frames.last_mut() {
                    top.2.push(child);
                }
            }
        }
    }

    if frames.len() > 1 {
        let body = frames.pop().map(|f| f.1).unwrap_or_default();
        return Err(NormalizeError::Unclosed {
            tag: tag.to_string(),
            body,
        });
    }
    for (_, _, children) in frames {
        for c in children {
            doc.append_child(parent, c);
        }
    }
    Ok(())
}

pub fn is_synthetic(doc: &Document, id: NodeId, options: &RenderOptions) -> bool {
    doc.tag_is(id, &options.virtual_tag)
}

/// Undo [`normalize`] for one synthetic element. With directives left it
/// becomes a marker comment pair around its children; otherwise its
/// children take its place.
pub fn simplify(doc: &mut Document, id: NodeId, options: &RenderOptions) {
    if !is_synthetic(doc, id, options) {
        return;
    }
    let Some(parent) = doc.parent(id) else {
        return;
    };
    let tag = &options.virtual_tag;
    let remaining = doc
        .attr(id, &options.attribute)
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    if let Some(body) = &remaining {
        let open = doc.create_comment(&format!(" {tag} {body} "));
        doc.insert_before(parent, open, id);
    }
    for c in doc.take_children(id) {
        doc.insert_before(parent, c, id);
    }
    if remaining.is_some() {
        let close = doc.create_comment(&format!(" /{tag} "));
        doc.insert_before(parent, close, id);
    }
    doc.detach(id);
}
