use std::collections::BTreeMap;

use kobind_dom::{Document, NodeId};

/// Inline style declarations collected while one node's directives are
/// applied. Flushed once per node.
#[derive(Debug, Default)]
pub struct PendingStyleSet {
    decls: BTreeMap<String, String>,
}

impl PendingStyleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `property: value`; camelCase property names are converted to
    /// their CSS spelling.
    pub fn insert(&mut self, property: &str, value: impl Into<String>) {
        self.decls.insert(kebab_case(property), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    fn serialize(&self) -> String {
        self.decls
            .iter()
            .map(|(k, v)| format!("{k}:{v}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Append the pending declarations to the node's `style` attribute and
    /// clear the set.
    pub fn flush(&mut self, doc: &mut Document, id: NodeId) {
        if self.decls.is_empty() {
            return;
        }
        let added = self.serialize();
        self.decls.clear();
        let merged = match doc.attr(id, "style") {
            Some(existing) if !existing.trim().is_empty() => {
                format!("{};{added}", existing.trim().trim_end_matches(';'))
            }
            _ => added,
        };
        doc.set_attr(id, "style", &merged);
    }
}

pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
