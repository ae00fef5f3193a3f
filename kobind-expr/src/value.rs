//! Script-style value semantics over `serde_json::Value`.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::error::EvalError;

/// Largest integer `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The string form a value takes when written into markup. Arrays join
/// their elements with `,`.
pub fn to_display_string(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_json_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => v.to_string(),
    }
}

pub fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        format!("{}", f as i64)
    } else {
        format!("{f}")
    }
}

fn format_json_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        n.to_string()
    } else {
        n.as_f64().map_or_else(|| n.to_string(), format_number)
    }
}

/// Build a JSON number, keeping integral results integral.
pub fn number(f: f64) -> Result<Value, EvalError> {
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Ok(Value::from(f as i64));
    }
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or_else(|| EvalError::Arithmetic(format!("{f} is not a finite number")))
}

pub fn to_number(v: &Value) -> Option<f64> {
    match v {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse().ok()
            }
        }
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn require_number(v: &Value, op: &str) -> Result<f64, EvalError> {
    to_number(v).ok_or_else(|| {
        EvalError::Type(format!("cannot apply `{op}` to {}", kind_name(v)))
    })
}

pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => a == b,
        _ => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

pub fn compare(a: &Value, b: &Value) -> Result<Option<Ordering>, EvalError> {
    if let (Value::String(x), Value::String(y)) = (a, b) {
        return Ok(Some(x.cmp(y)));
    }
    let x = require_number(a, "<")?;
    let y = require_number(b, "<")?;
    Ok(x.partial_cmp(&y))
}

/// `+`: concatenation when either side is a string, addition otherwise.
pub fn add(a: &Value, b: &Value) -> Result<Value, EvalError> {
    if a.is_string() || b.is_string() {
        let mut s = to_display_string(a);
        s.push_str(&to_display_string(b));
        return Ok(Value::String(s));
    }
    number(require_number(a, "+")? + require_number(b, "+")?)
}

pub fn arithmetic(op: char, a: &Value, b: &Value) -> Result<Value, EvalError> {
    let name = op.to_string();
    let x = require_number(a, &name)?;
    let y = require_number(b, &name)?;
    let result = match op {
        '-' => x - y,
        '*' => x * y,
        '/' | '%' if y == 0.0 => {
            return Err(EvalError::Arithmetic("division by zero".to_string()));
        }
        '/' => x / y,
        '%' => x % y,
        _ => return Err(EvalError::Type(format!("unknown operator `{op}`"))),
    };
    number(result)
}
