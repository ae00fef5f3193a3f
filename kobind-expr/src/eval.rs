use std::borrow::Cow;
use std::cmp::Ordering;

use log::trace;
use serde_json::{Map, Value};

use crate::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::error::EvalError;
use crate::parser::parse_expression;
use crate::utilities::Utilities;
use crate::value::{self, kind_name, truthy};

/// Name the utility object is bound under.
pub const UTILITIES_NAME: &str = "ko";

/// Variables visible to one evaluation.
#[derive(Debug, Clone, Default)]
pub struct Bindings<'a> {
    vars: Vec<(String, &'a Value)>,
    utilities: Option<&'a Utilities>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, shadowing any earlier binding of the same name.
    pub fn bind(&mut self, name: impl Into<String>, value: &'a Value) -> &mut Self {
        self.vars.push((name.into(), value));
        self
    }

    pub fn with_utilities(&mut self, utilities: &'a Utilities) -> &mut Self {
        self.utilities = Some(utilities);
        self
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn utilities(&self) -> Option<&'a Utilities> {
        self.utilities
    }
}

/// Resolves a translated expression against a set of bindings.
pub trait Evaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings<'_>) -> Result<Value, EvalError>;
}

/// The built-in sandboxed evaluator. Holds no per-call state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExprEvaluator;

impl Evaluator for ExprEvaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings<'_>) -> Result<Value, EvalError> {
        let expr = parse_expression(expression)?;
        let result = Scope { bindings }.eval(&expr)?.into_value()?.into_owned();
        trace!("`{expression}` => {result}");
        Ok(result)
    }
}

/// Intermediate result: plain data, or a path into the utility object.
enum Operand<'a> {
    Data(Cow<'a, Value>),
    Utility(&'a Utilities, Vec<String>),
}

impl<'a> Operand<'a> {
    fn into_value(self) -> Result<Cow<'a, Value>, EvalError> {
        match self {
            Operand::Data(v) => Ok(v),
            Operand::Utility(_, path) => Err(EvalError::Type(format!(
                "`{}` is not a value",
                utility_path(&path)
            ))),
        }
    }
}

fn utility_path(path: &[String]) -> String {
    std::iter::once(UTILITIES_NAME)
        .chain(path.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(".")
}

struct Scope<'b, 'a> {
    bindings: &'b Bindings<'a>,
}

impl<'a> Scope<'_, 'a> {
    fn value(&self, expr: &Expr) -> Result<Cow<'a, Value>, EvalError> {
        self.eval(expr)?.into_value()
    }

    fn eval(&self, expr: &Expr) -> Result<Operand<'a>, EvalError> {
        let data = |v: Value| -> Result<Operand<'a>, EvalError> {
            Ok(Operand::Data(Cow::Owned(v)))
        };
        match expr {
            Expr::Literal(v) => data(v.clone()),
            Expr::Var(name) => {
                if let Some(v) = self.bindings.get(name) {
                    return Ok(Operand::Data(Cow::Borrowed(v)));
                }
                match self.bindings.utilities() {
                    Some(u) if name == UTILITIES_NAME => Ok(Operand::Utility(u, Vec::new())),
                    _ => Err(EvalError::UnknownVariable(name.clone())),
                }
            }
            Expr::Member(obj, name) => match self.eval(obj)? {
                Operand::Utility(u, mut path) => {
                    path.push(name.clone());
                    Ok(Operand::Utility(u, path))
                }
                Operand::Data(v) => member(v, name).map(Operand::Data),
            },
            Expr::Index(obj, index) => {
                let target = self.value(obj)?;
                let index = self.value(index)?;
                match index.as_ref() {
                    Value::String(key) => member(target, key).map(Operand::Data),
                    Value::Number(n) => element(target, n.as_f64().unwrap_or(f64::NAN)),
                    other => Err(EvalError::Type(format!(
                        "cannot index with {}",
                        kind_name(other)
                    ))),
                }
            }
            Expr::Call(callee, args) => {
                let Operand::Utility(u, path) = self.eval(callee)? else {
                    return Err(EvalError::NotCallable(callee.describe()));
                };
                let args = args
                    .iter()
                    .map(|a| self.value(a).map(Cow::into_owned))
                    .collect::<Result<Vec<_>, _>>()?;
                data(u.call(&path, &args)?)
            }
            Expr::Array(items) => {
                let items = items
                    .iter()
                    .map(|a| self.value(a).map(Cow::into_owned))
                    .collect::<Result<Vec<_>, _>>()?;
                data(Value::Array(items))
            }
            Expr::Object(props) => {
                let mut map = Map::new();
                for (key, e) in props {
                    map.insert(key.clone(), self.value(e)?.into_owned());
                }
                data(Value::Object(map))
            }
            Expr::Unary(op, operand) => {
                let v = self.value(operand)?;
                match op {
                    UnaryOp::Not => data(Value::Bool(!truthy(&v))),
                    UnaryOp::Neg => data(value::arithmetic('-', &Value::from(0), &v)?),
                    UnaryOp::Plus => match value::to_number(&v) {
                        Some(n) => data(value::number(n)?),
                        None => Err(EvalError::Type(format!(
                            "cannot convert {} to a number",
                            kind_name(&v)
                        ))),
                    },
                }
            }
            Expr::Logical(op, lhs, rhs) => {
                let l = self.value(lhs)?;
                let short_circuit = match op {
                    LogicalOp::And => !truthy(&l),
                    LogicalOp::Or => truthy(&l),
                };
                if short_circuit {
                    Ok(Operand::Data(l))
                } else {
                    self.value(rhs).map(Operand::Data)
                }
            }
            Expr::Conditional(cond, then, otherwise) => {
                let cond = self.value(cond)?;
                if truthy(&cond) {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = self.value(lhs)?;
                let r = self.value(rhs)?;
                data(binary(*op, &l, &r)?)
            }
        }
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    let ordered = |accept: fn(Ordering) -> bool| -> Result<Value, EvalError> {
        Ok(Value::Bool(value::compare(l, r)?.is_some_and(accept)))
    };
    match op {
        BinaryOp::Add => value::add(l, r),
        BinaryOp::Sub => value::arithmetic('-', l, r),
        BinaryOp::Mul => value::arithmetic('*', l, r),
        BinaryOp::Div => value::arithmetic('/', l, r),
        BinaryOp::Rem => value::arithmetic('%', l, r),
        BinaryOp::Lt => ordered(Ordering::is_lt),
        BinaryOp::Le => ordered(Ordering::is_le),
        BinaryOp::Gt => ordered(Ordering::is_gt),
        BinaryOp::Ge => ordered(Ordering::is_ge),
        BinaryOp::LooseEq => Ok(Value::Bool(value::loose_eq(l, r))),
        BinaryOp::LooseNe => Ok(Value::Bool(!value::loose_eq(l, r))),
        BinaryOp::StrictEq => Ok(Value::Bool(value::strict_eq(l, r))),
        BinaryOp::StrictNe => Ok(Value::Bool(!value::strict_eq(l, r))),
    }
}

/// Exact match first, then a case-insensitive one.
fn lookup<'v>(map: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

fn member<'a>(target: Cow<'a, Value>, name: &str) -> Result<Cow<'a, Value>, EvalError> {
    let missing = |on: &Value| EvalError::MissingMember {
        member: name.to_string(),
        on: kind_name(on),
    };
    let len = match target.as_ref() {
        Value::Array(items) => Some(items.len()),
        Value::String(s) => Some(s.chars().count()),
        _ => None,
    };
    if let Some(len) = len {
        if matches!(name.to_ascii_lowercase().as_str(), "length" | "count") {
            return Ok(Cow::Owned(Value::from(len)));
        }
        return Err(missing(&target));
    }
    match target {
        Cow::Borrowed(v) => match v {
            Value::Object(map) => lookup(map, name).map(Cow::Borrowed).ok_or_else(|| missing(v)),
            Value::Null => Err(EvalError::Type(format!("cannot read `{name}` of null"))),
            other => Err(missing(other)),
        },
        Cow::Owned(v) => match &v {
            Value::Object(map) => lookup(map, name)
                .map(|m| Cow::Owned(m.clone()))
                .ok_or_else(|| missing(&v)),
            Value::Null => Err(EvalError::Type(format!("cannot read `{name}` of null"))),
            other => Err(missing(other)),
        },
    }
}

fn element<'a>(target: Cow<'a, Value>, index: f64) -> Result<Operand<'a>, EvalError> {
    let out_of_range = || EvalError::Type(format!("index {index} out of range"));
    let not_indexable =
        |v: &Value| EvalError::Type(format!("cannot index into {}", kind_name(v)));
    if index < 0.0 || index.fract() != 0.0 {
        return Err(out_of_range());
    }
    let i = index as usize;
    let item = match target {
        Cow::Borrowed(v) => match v {
            Value::Array(items) => items.get(i).map(Cow::Borrowed),
            Value::String(s) => char_at(s, i),
            other => return Err(not_indexable(other)),
        },
        Cow::Owned(v) => match v {
            Value::Array(mut items) if i < items.len() => Some(Cow::Owned(items.swap_remove(i))),
            Value::Array(_) => None,
            Value::String(s) => char_at(&s, i),
            other => return Err(not_indexable(&other)),
        },
    };
    item.map(Operand::Data).ok_or_else(out_of_range)
}

fn char_at<'a>(s: &str, i: usize) -> Option<Cow<'a, Value>> {
    s.chars()
        .nth(i)
        .map(|c| Cow::Owned(Value::String(c.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eval(expr: &str, data: &Value) -> Result<Value, EvalError> {
        let utilities = Utilities::new();
        let mut b = Bindings::new();
        b.bind("$data", data).bind("$root", data).with_utilities(&utilities);
        ExprEvaluator.evaluate(expr, &b)
    }

    #[test]
    fn member_lookup_falls_back_to_case_insensitive() {
        let data = json!({"firstName": "Ada"});
        assert_eq!(eval("$data.FirstName", &data).expect("eval"), json!("Ada"));
    }

    #[test]
    fn missing_member_is_error() {
        let data = json!({"a": 1});
        assert!(matches!(
            eval("$data.B", &data),
            Err(EvalError::MissingMember { .. })
        ));
    }

    #[test]
    fn length_pseudo_members() {
        let data = json!({"Items": [1, 2, 3], "Name": "abcd"});
        assert_eq!(eval("$data.Items.Length", &data).expect("eval"), json!(3));
        assert_eq!(eval("$data.Name.length", &data).expect("eval"), json!(4));
        assert_eq!(eval("$data.Items.Count > 2", &data).expect("eval"), json!(true));
    }

    #[test]
    fn short_circuit_keeps_operand() {
        let data = json!({"Name": "", "Fallback": "anon"});
        assert_eq!(
            eval("$data.Name || $data.Fallback", &data).expect("eval"),
            json!("anon")
        );
        assert_eq!(eval("$data.Name && $data.Nope", &data).expect("eval"), json!(""));
    }

    #[test]
    fn utility_calls() {
        let data = json!({"Max": 2});
        assert_eq!(
            eval("ko.Utils.Range(0, $data.Max)", &data).expect("eval"),
            json!([0, 1, 2])
        );
        assert!(eval("ko.Utils", &data).is_err());
        assert!(matches!(
            eval("$data.Max(1)", &data),
            Err(EvalError::NotCallable(_))
        ));
    }

    #[test]
    fn index_access() {
        let data = json!({"Row": {"Name": "x"}, "Key": "Name", "List": [10, 20]});
        assert_eq!(eval("$data.Row[$data.Key]", &data).expect("eval"), json!("x"));
        assert_eq!(eval("$data.List[1]", &data).expect("eval"), json!(20));
        assert!(eval("$data.List[5]", &data).is_err());
    }
}
