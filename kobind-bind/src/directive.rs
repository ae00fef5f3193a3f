use pest::Parser;
use pest::error::InputLocation;
use pest::iterators::Pair;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "directive.pest"]
struct DirectiveParser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("malformed binding `{fragment}` at byte {offset}")]
    Malformed { fragment: String, offset: usize },
}

/// One `key: expression` entry of a binding attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub key: String,
    pub expression: String,
}

impl Directive {
    pub fn new(key: impl Into<String>, expression: impl Into<String>) -> Self {
        Directive {
            key: key.into(),
            expression: expression.into(),
        }
    }

    pub fn is_key(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

/// Split a binding attribute value into its directives, in source order.
pub fn parse_directives(source: &str) -> Result<Vec<Directive>, DirectiveError> {
    let mut pairs =
        DirectiveParser::parse(Rule::directives, source).map_err(|e| malformed(source, e))?;
    let Some(root) = pairs.next() else {
        return Ok(Vec::new());
    };
    Ok(root
        .into_inner()
        .filter(|p| p.as_rule() == Rule::directive)
        .map(build_directive)
        .collect())
}

fn build_directive(pair: Pair<Rule>) -> Directive {
    let mut key = String::new();
    let mut expression = String::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::key => key = key_text(inner),
            Rule::expression => expression = inner.as_str().trim_end().to_string(),
            _ => {}
        }
    }
    Directive { key, expression }
}

fn key_text(pair: Pair<Rule>) -> String {
    let text = pair.as_str();
    // quoted keys keep only their body
    match pair.into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::quoted_key => inner
            .into_inner()
            .next()
            .map_or_else(String::new, |body| body.as_str().to_string()),
        _ => text.to_string(),
    }
}

/// Report the comma-delimited stretch of `source` around the failure.
fn malformed(source: &str, error: pest::error::Error<Rule>) -> DirectiveError {
    let offset = match error.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let offset = offset.min(source.len());
    let start = source[..offset].rfind(',').map_or(0, |i| i + 1);
    let end = source[offset..]
        .find(',')
        .map_or(source.len(), |i| offset + i);
    let fragment = source[start..end].trim();
    DirectiveError::Malformed {
        fragment: if fragment.is_empty() {
            source.trim().to_string()
        } else {
            fragment.to_string()
        },
        offset,
    }
}

/// Serialize directives back into attribute form.
pub fn format_directives(directives: &[Directive]) -> String {
    directives
        .iter()
        .map(|d| format!("{}: {}", d.key, d.expression))
        .collect::<Vec<_>>()
        .join(", ")
}
