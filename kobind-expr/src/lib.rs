//! Binding expressions: translation of directive text into evaluable form
//! and a small sandboxed evaluator over `serde_json::Value`.

pub mod ast;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod translate;
pub mod utilities;
pub mod value;

pub use error::EvalError;
pub use eval::{Bindings, Evaluator, ExprEvaluator, UTILITIES_NAME};
pub use translate::{MemberCase, Translated, translate};
pub use utilities::Utilities;
pub use value::{to_display_string, truthy};
