//! Rewrites directive expressions so they only reference names the
//! evaluator binds: `$data`, `$root`, `$parentsK` and `ko`.
//!
//! The rewrite runs on tokens, so string literals are never touched:
//!
//! 1. `$root` reached through `$parent`, `$parents[n]` or `$data` hops
//!    collapses to a bare `$root`.
//! 2. A chain of `$parent` / `$parents[n]` hops folds into a single
//!    `$parentsK`, where `K` is the total number of hops.
//! 3. Bare identifiers become `$data.Name` members. Member names are
//!    recased according to [`MemberCase`].

use serde::Deserialize;

use crate::error::EvalError;
use crate::lexer::{Token, TokenKind, tokenize};

pub const RESERVED: &[&str] = &[
    "break", "case", "catch", "continue", "const", "default", "delete", "do", "else", "export",
    "false", "finally", "for", "function", "if", "import", "in", "instanceof", "ko", "label", "let",
    "new", "null", "return", "switch", "this", "throw", "true", "try", "typeof", "undefined", "var",
    "void", "while", "with", "yield",
];

/// How identifiers are recased when they are turned into member accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberCase {
    /// `firstName` becomes `FirstName`.
    #[default]
    Pascal,
    Preserve,
}

impl MemberCase {
    fn apply(self, name: &str) -> String {
        match self {
            MemberCase::Preserve => name.to_string(),
            MemberCase::Pascal => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    text: String,
    ancestors: Vec<usize>,
}

impl Translated {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Hop counts referenced as `$parentsK`, ascending and deduplicated.
    pub fn ancestors(&self) -> &[usize] {
        &self.ancestors
    }

    pub fn ancestor_var(hops: usize) -> String {
        format!("$parents{hops}")
    }
}

pub fn translate(raw: &str, case: MemberCase) -> Result<Translated, EvalError> {
    let tokens = collapse_root(tokenize(raw)?);
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len() + 4);
    let mut ancestors = Vec::new();
    let mut brackets: Vec<&'static str> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let tok = &tokens[i];
        match &tok.kind {
            TokenKind::Ident(name) if name.starts_with('$') => {
                match fold_hops(&tokens, i) {
                    Some((hops, next)) => {
                        ancestors.push(hops);
                        out.push(synthetic(&Translated::ancestor_var(hops), tok.space_before));
                        i = next;
                    }
                    None => {
                        out.push(tok.clone());
                        i += 1;
                    }
                }
                continue;
            }
            TokenKind::Ident(name) => {
                let after_dot = out.last().is_some_and(|t| t.is_punct("."));
                let object_key = brackets.last() == Some(&"{")
                    && out.last().is_some_and(|t| t.is_punct("{") || t.is_punct(","))
                    && tokens.get(i + 1).is_some_and(|t| t.is_punct(":"));
                if after_dot {
                    out.push(synthetic(&case.apply(name), tok.space_before));
                } else if object_key || RESERVED.contains(&name.as_str()) {
                    out.push(tok.clone());
                } else {
                    out.push(synthetic("$data", tok.space_before));
                    out.push(synthetic(".", false));
                    out.push(synthetic(&case.apply(name), false));
                }
            }
            TokenKind::Punct(p @ ("(" | "[" | "{")) => {
                brackets.push(*p);
                out.push(tok.clone());
            }
            TokenKind::Punct(")" | "]" | "}") => {
                brackets.pop();
                out.push(tok.clone());
            }
            _ => out.push(tok.clone()),
        }
        i += 1;
    }

    ancestors.sort_unstable();
    ancestors.dedup();
    Ok(Translated {
        text: render(&out),
        ancestors,
    })
}

fn synthetic(text: &str, space_before: bool) -> Token {
    let kind = match text {
        "." => TokenKind::Punct("."),
        _ => TokenKind::Ident(text.to_string()),
    };
    Token {
        kind,
        text: text.to_string(),
        offset: 0,
        space_before,
    }
}

fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, tok) in tokens.iter().enumerate() {
        if i > 0 && tok.space_before {
            out.push(' ');
        }
        out.push_str(&tok.text);
    }
    out
}

/// One ancestor hop starting at `i`: `$parent` or `$parents[n]`.
fn hop(tokens: &[Token], i: usize) -> Option<(usize, usize)> {
    match tokens.get(i)?.ident()? {
        "$parent" => Some((1, i + 1)),
        "$parents" => {
            let open = tokens.get(i + 1)?;
            let close = tokens.get(i + 3)?;
            let TokenKind::Number(n) = tokens.get(i + 2)?.kind else {
                return None;
            };
            let whole = n >= 0.0 && n.fract() == 0.0;
            (open.is_punct("[") && close.is_punct("]") && whole).then_some((n as usize, i + 4))
        }
        _ => None,
    }
}

/// Fold a `.`-joined chain of hops starting at `i` into a total hop count
/// and the index of the first token after the chain.
fn fold_hops(tokens: &[Token], i: usize) -> Option<(usize, usize)> {
    let (mut total, mut next) = hop(tokens, i)?;
    while tokens.get(next).is_some_and(|t| t.is_punct(".")) {
        match hop(tokens, next + 1) {
            Some((hops, after)) => {
                total += hops;
                next = after;
            }
            None => break,
        }
    }
    Some((total, next))
}

fn collapse_root(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        if tok.ident() == Some("$root") {
            let mut space_before = tok.space_before;
            while out.last().is_some_and(|t| t.is_punct(".")) {
                let dot = out.len() - 1;
                let Some(start) = hop_before(&out[..dot]) else {
                    break;
                };
                space_before = out[start].space_before;
                out.truncate(start);
            }
            out.push(Token { space_before, ..tok });
            continue;
        }
        out.push(tok);
    }
    out
}

/// Start index of a hop (`$parent`, `$data`, `$parents[n]`) ending the slice.
fn hop_before(tokens: &[Token]) -> Option<usize> {
    let last = tokens.len().checked_sub(1)?;
    match tokens[last].ident() {
        Some("$parent" | "$data") => return Some(last),
        _ => {}
    }
    let start = tokens.len().checked_sub(4)?;
    (tokens[start].ident() == Some("$parents")
        && tokens[start + 1].is_punct("[")
        && matches!(tokens[start + 2].kind, TokenKind::Number(_))
        && tokens[last].is_punct("]"))
    .then_some(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(raw: &str) -> String {
        translate(raw, MemberCase::Pascal)
            .expect("translate")
            .as_str()
            .to_string()
    }

    #[test]
    fn bare_identifiers_become_data_members() {
        assert_eq!(tr("firstName"), "$data.FirstName");
        assert_eq!(tr("items().length"), "$data.Items().Length");
        assert_eq!(tr("a && !b"), "$data.A && !$data.B");
    }

    #[test]
    fn reserved_words_and_strings_untouched() {
        assert_eq!(tr("true ? 'name' : null"), "true ? 'name' : null");
        assert_eq!(tr("ko.utils.range(0, max)"), "ko.Utils.Range(0, $data.Max)");
    }

    #[test]
    fn object_keys_untouched() {
        assert_eq!(
            tr("{ color: shade, fontSize: size }"),
            "{ color: $data.Shade, fontSize: $data.Size }"
        );
    }

    #[test]
    fn parent_chains_fold() {
        let a = translate("$parent.$parent.x", MemberCase::Pascal).expect("translate");
        let b = translate("$parents[2].x", MemberCase::Pascal).expect("translate");
        assert_eq!(a.as_str(), "$parents2.X");
        assert_eq!(a, b);
        assert_eq!(a.ancestors(), &[2]);
    }

    #[test]
    fn mixed_hops_sum() {
        let t = translate("$parents[1].$parent.name + $parent.id", MemberCase::Pascal)
            .expect("translate");
        assert_eq!(t.as_str(), "$parents2.Name + $parents1.Id");
        assert_eq!(t.ancestors(), &[1, 2]);
    }

    #[test]
    fn root_collapses() {
        assert_eq!(tr("$parent.$parents[2].$root.title"), "$root.Title");
        assert_eq!(tr("$data.$root.title"), "$root.Title");
        assert_eq!(tr("$root.items"), "$root.Items");
    }

    #[test]
    fn preserve_case() {
        let t = translate("firstName", MemberCase::Preserve).expect("translate");
        assert_eq!(t.as_str(), "$data.firstName");
    }
}
