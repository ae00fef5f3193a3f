use serde_json::Value;

use crate::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::error::EvalError;
use crate::lexer::{Token, TokenKind, tokenize};

/// Keywords with no meaning in a binding expression.
const UNSUPPORTED: &[&str] = &[
    "break", "case", "catch", "continue", "const", "default", "delete", "do", "else", "export",
    "finally", "for", "function", "if", "import", "in", "instanceof", "label", "let", "new",
    "return", "switch", "this", "throw", "try", "typeof", "var", "void", "while", "with", "yield",
];

pub fn parse_expression(src: &str) -> Result<Expr, EvalError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        end: src.len(),
    };
    let expr = parser.expression()?;
    if let Some(tok) = parser.peek() {
        return Err(EvalError::syntax(
            format!("unexpected `{}`", tok.text),
            tok.offset,
        ));
    }
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    end: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(tok)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    fn eat(&mut self, p: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(p)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, p: &str) -> Result<(), EvalError> {
        if self.eat(p) {
            return Ok(());
        }
        let found = self.peek().map_or("end of input", |t| t.text.as_str());
        Err(EvalError::syntax(
            format!("expected `{p}`, found `{found}`"),
            self.offset(),
        ))
    }

    fn eat_any(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        let tok = self.peek()?;
        let TokenKind::Punct(p) = tok.kind else {
            return None;
        };
        if ops.contains(&p) {
            self.pos += 1;
            Some(p)
        } else {
            None
        }
    }

    fn expression(&mut self) -> Result<Expr, EvalError> {
        let cond = self.logical_or()?;
        if !self.eat("?") {
            return Ok(cond);
        }
        let then = self.expression()?;
        self.expect(":")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional(
            Box::new(cond),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn logical_or(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.logical_and()?;
        while self.eat("||") {
            let rhs = self.logical_and()?;
            lhs = Expr::Logical(LogicalOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn logical_and(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.equality()?;
        while self.eat("&&") {
            let rhs = self.equality()?;
            lhs = Expr::Logical(LogicalOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.relational()?;
        while let Some(op) = self.eat_any(&["===", "!==", "==", "!="]) {
            let op = match op {
                "===" => BinaryOp::StrictEq,
                "!==" => BinaryOp::StrictNe,
                "==" => BinaryOp::LooseEq,
                _ => BinaryOp::LooseNe,
            };
            let rhs = self.relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn relational(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.additive()?;
        while let Some(op) = self.eat_any(&["<=", ">=", "<", ">"]) {
            let op = match op {
                "<=" => BinaryOp::Le,
                ">=" => BinaryOp::Ge,
                "<" => BinaryOp::Lt,
                _ => BinaryOp::Gt,
            };
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.multiplicative()?;
        while let Some(op) = self.eat_any(&["+", "-"]) {
            let op = if op == "+" { BinaryOp::Add } else { BinaryOp::Sub };
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_any(&["*", "/", "%"]) {
            let op = match op {
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        let op = match self.eat_any(&["!", "-", "+"]) {
            Some("!") => UnaryOp::Not,
            Some("-") => UnaryOp::Neg,
            Some(_) => UnaryOp::Plus,
            None => return self.postfix(),
        };
        Ok(Expr::Unary(op, Box::new(self.unary()?)))
    }

    fn postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(".") {
                let offset = self.offset();
                let name = self
                    .advance()
                    .and_then(Token::ident)
                    .ok_or_else(|| EvalError::syntax("expected member name after `.`", offset))?;
                expr = Expr::Member(Box::new(expr), name.to_string());
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.eat("(") {
                let args = self.list(")")?;
                expr = Expr::Call(Box::new(expr), args);
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma separated expressions up to `close`; a trailing comma is allowed.
    fn list(&mut self, close: &str) -> Result<Vec<Expr>, EvalError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(",") {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        let offset = self.offset();
        let Some(tok) = self.advance() else {
            return Err(EvalError::syntax("unexpected end of expression", offset));
        };
        match &tok.kind {
            TokenKind::Number(n) => Ok(Expr::Literal(crate::value::number(*n)?)),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::String(s.clone()))),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "undefined" => Ok(Expr::Literal(Value::Null)),
                kw if UNSUPPORTED.contains(&kw) => Err(EvalError::syntax(
                    format!("unsupported keyword `{kw}`"),
                    tok.offset,
                )),
                _ => Ok(Expr::Var(name.clone())),
            },
            TokenKind::Punct("(") => {
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(inner)
            }
            TokenKind::Punct("[") => Ok(Expr::Array(self.list("]")?)),
            TokenKind::Punct("{") => self.object(),
            TokenKind::Punct(_) => Err(EvalError::syntax(
                format!("unexpected `{}`", tok.text),
                tok.offset,
            )),
        }
    }

    fn object(&mut self) -> Result<Expr, EvalError> {
        let mut props = Vec::new();
        while !self.eat("}") {
            let offset = self.offset();
            let key = match self.advance().map(|t| &t.kind) {
                Some(TokenKind::Ident(name)) => name.clone(),
                Some(TokenKind::Str(s)) => s.clone(),
                Some(TokenKind::Number(n)) => crate::value::format_number(*n),
                _ => return Err(EvalError::syntax("expected property name", offset)),
            };
            self.expect(":")?;
            props.push((key, self.expression()?));
            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        Ok(Expr::Object(props))
    }
}
