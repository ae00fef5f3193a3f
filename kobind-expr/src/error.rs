use thiserror::Error;

/// Failure to resolve one expression. Always recoverable by the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error at byte {offset}: {message}")]
    Syntax { message: String, offset: usize },
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
    #[error("no member `{member}` on {on}")]
    MissingMember { member: String, on: &'static str },
    #[error("type error: {0}")]
    Type(String),
    #[error("`{0}` is not callable")]
    NotCallable(String),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("arithmetic error: {0}")]
    Arithmetic(String),
}

impl EvalError {
    pub(crate) fn syntax(message: impl Into<String>, offset: usize) -> Self {
        EvalError::Syntax {
            message: message.into(),
            offset,
        }
    }
}
