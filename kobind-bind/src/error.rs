use kobind_dom::ParseError;
use kobind_expr::EvalError;
use thiserror::Error;

use crate::directive::DirectiveError;
use crate::normalize::NormalizeError;
use crate::scope::ScopeError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid markup: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("cannot resolve `{key}: {expression}`")]
    Unresolved {
        key: String,
        expression: String,
        #[source]
        source: EvalError,
    },
}
