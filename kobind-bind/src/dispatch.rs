//! Applies one resolved directive to its node.

use kobind_dom::{Document, NodeId};
use kobind_expr::{EvalError, to_display_string, truthy};
use serde_json::Value;

use crate::style::PendingStyleSet;

/// What applying a directive did to the node's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Attributes or pending styles only.
    Attributes,
    /// The node's children were replaced.
    Content,
}

fn type_error(key: &str, expected: &str, v: &Value) -> EvalError {
    EvalError::Type(format!(
        "`{key}` expects {expected}, got {}",
        kobind_expr::value::kind_name(v)
    ))
}

/// Keys whose null result means `false` instead of "nothing to apply".
fn is_boolean_key(key: &str) -> bool {
    ["visible", "enable", "disable", "checked"]
        .iter()
        .any(|k| k.eq_ignore_ascii_case(key))
}

/// Set an attribute named by the key to the value's string form.
fn set_plain(doc: &mut Document, id: NodeId, key: &str, value: &Value) -> Applied {
    doc.set_attr(id, key, &to_display_string(value));
    Applied::Attributes
}

pub fn apply(
    doc: &mut Document,
    id: NodeId,
    key: &str,
    value: &Value,
    styles: &mut PendingStyleSet,
) -> Result<Applied, EvalError> {
    match value {
        Value::String(s) if s.is_empty() => return Ok(Applied::Attributes),
        Value::Null if !is_boolean_key(key) => return Ok(Applied::Attributes),
        _ => {}
    }

    // keys match case-insensitively, like loop and client-only keys
    match key.to_ascii_lowercase().as_str() {
        "visible" => {
            if !truthy(value) {
                styles.insert("display", "none");
            }
        }
        "text" => {
            doc.set_text_content(id, &to_display_string(value));
            return Ok(Applied::Content);
        }
        "html" => {
            set_inner_html(doc, id, &to_display_string(value))?;
            return Ok(Applied::Content);
        }
        "enable" => {
            if !truthy(value) {
                doc.set_attr(id, "disabled", "disabled");
            }
        }
        "disable" => {
            if truthy(value) {
                doc.set_attr(id, "disabled", "disabled");
            }
        }
        "value" => {
            let shown = to_display_string(value);
            if doc.tag_is(id, "textarea") {
                doc.set_text_content(id, &shown);
                return Ok(Applied::Content);
            }
            if doc.tag_is(id, "select") {
                mark_selected(doc, id, &shown);
            } else {
                doc.set_attr(id, "value", &shown);
            }
        }
        "checked" => {
            let checked = match value {
                Value::String(s) => doc.attr(id, "value").is_some_and(|v| v == s.as_str()),
                other => truthy(other),
            };
            if checked {
                doc.set_attr(id, "checked", "checked");
            }
        }
        "options" => {
            let Value::Array(items) = value else {
                return Err(type_error(key, "an array", value));
            };
            let mut options = Vec::with_capacity(items.len());
            for item in items {
                if item.is_array() || item.is_object() {
                    return Err(type_error(key, "an array of scalars", item));
                }
                let option = doc.create_element("option");
                let label = doc.create_text(&to_display_string(item));
                doc.append_child(option, label);
                options.push(option);
            }
            doc.replace_children(id, options);
            return Ok(Applied::Content);
        }
        "selectedoptions" => {
            let Value::Array(items) = value else {
                return Err(type_error(key, "an array", value));
            };
            for item in items {
                mark_selected(doc, id, &to_display_string(item));
            }
        }
        "style" => {
            let map = match value {
                Value::Object(map) => map,
                Value::String(_) => return Ok(set_plain(doc, id, key, value)),
                other => return Err(type_error(key, "an object or a string", other)),
            };
            for (prop, v) in map {
                let shown = match v {
                    Value::Null => continue,
                    other => to_display_string(other),
                };
                if !shown.is_empty() {
                    styles.insert(prop, shown);
                }
            }
        }
        "css" => {
            let map = match value {
                Value::Object(map) => map,
                Value::String(_) => return Ok(set_plain(doc, id, key, value)),
                other => return Err(type_error(key, "an object or a string", other)),
            };
            for (class, cond) in map {
                set_class(doc, id, class, truthy(cond));
            }
        }
        "attr" => {
            let map = match value {
                Value::Object(map) => map,
                Value::String(_) => return Ok(set_plain(doc, id, key, value)),
                other => return Err(type_error(key, "an object or a string", other)),
            };
            for (name, v) in map {
                match v {
                    Value::Null | Value::Bool(false) => {
                        doc.remove_attr(id, name);
                    }
                    other => doc.set_attr(id, name, &to_display_string(other)),
                }
            }
        }
        _ => return Ok(set_plain(doc, id, key, value)),
    }
    Ok(Applied::Attributes)
}

fn set_inner_html(doc: &mut Document, id: NodeId, markup: &str) -> Result<(), EvalError> {
    let holder = doc.create_element("div");
    kobind_dom::parse::parse_into(doc, holder, markup)
        .map_err(|e| EvalError::Type(format!("`html` value is not valid markup: {e}")))?;
    let children = doc.take_children(holder);
    doc.replace_children(id, children);
    Ok(())
}

fn mark_selected(doc: &mut Document, select: NodeId, shown: &str) {
    let matching: Vec<NodeId> = doc
        .descendants(select)
        .filter(|n| doc.tag_is(*n, "option") && doc.text_content(*n) == shown)
        .collect();
    for option in matching {
        doc.set_attr(option, "selected", "selected");
    }
}

fn set_class(doc: &mut Document, id: NodeId, class: &str, on: bool) {
    let current = doc.attr(id, "class").map(|c| c.into_owned()).unwrap_or_default();
    let mut classes: Vec<&str> = current.split_whitespace().collect();
    for name in class.split_whitespace() {
        let present = classes.contains(&name);
        if on && !present {
            classes.push(name);
        } else if !on && present {
            classes.retain(|c| *c != name);
        }
    }
    let joined = classes.join(" ");
    if joined == current {
        return;
    }
    if joined.is_empty() {
        doc.remove_attr(id, "class");
    } else {
        doc.set_attr(id, "class", &joined);
    }
}
