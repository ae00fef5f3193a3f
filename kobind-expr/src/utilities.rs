use serde_json::Value;

use crate::error::EvalError;
use crate::value::{kind_name, to_number};

/// Helper functions templates reach through the `ko` binding, e.g.
/// `ko.utils.range(0, 4)`. Path segments match case-insensitively so
/// translated (`ko.Utils.Range`) and source spellings both resolve.
#[derive(Debug, Clone, Default)]
pub struct Utilities {
    _private: (),
}

impl Utilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Integers from `min` to `max`, both inclusive.
    pub fn range(min: i64, max: i64) -> Vec<Value> {
        (min..=max).map(Value::from).collect()
    }

    pub fn call(&self, path: &[String], args: &[Value]) -> Result<Value, EvalError> {
        let lower: Vec<String> = path.iter().map(|s| s.to_ascii_lowercase()).collect();
        let lower: Vec<&str> = lower.iter().map(String::as_str).collect();
        match lower.as_slice() {
            ["utils", "range"] => {
                let [min, max] = args else {
                    return Err(EvalError::Type(format!(
                        "range expects 2 arguments, got {}",
                        args.len()
                    )));
                };
                Ok(Value::Array(Self::range(integer(min)?, integer(max)?)))
            }
            ["utils", "unwrapobservable"] | ["unwrap"] => {
                Ok(args.first().cloned().unwrap_or(Value::Null))
            }
            _ => Err(EvalError::UnknownFunction(format!("ko.{}", path.join(".")))),
        }
    }
}

fn integer(v: &Value) -> Result<i64, EvalError> {
    match to_number(v) {
        Some(f) if f.is_finite() => Ok(f.floor() as i64),
        _ => Err(EvalError::Type(format!(
            "range bound must be a number, got {}",
            kind_name(v)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> Vec<String> {
        p.split('.').map(str::to_string).collect()
    }

    #[test]
    fn range_is_inclusive() {
        let u = Utilities::new();
        let v = u.call(&path("Utils.Range"), &[json!(0), json!(3)]).expect("range");
        assert_eq!(v, json!([0, 1, 2, 3]));
        let empty = u.call(&path("utils.range"), &[json!(2), json!(1)]).expect("range");
        assert_eq!(empty, json!([]));
    }

    #[test]
    fn unknown_function() {
        let u = Utilities::new();
        let err = u.call(&path("utils.nope"), &[]).unwrap_err();
        assert_eq!(err, EvalError::UnknownFunction("ko.utils.nope".into()));
    }
}
