use crate::error::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifiers, including `$`-prefixed names.
    Ident(String),
    Number(f64),
    /// Decoded string literal.
    Str(String),
    Punct(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token.
    pub text: String,
    /// Byte offset in the source.
    pub offset: usize,
    /// Whitespace separated this token from the previous one.
    pub space_before: bool,
}

impl Token {
    pub fn ident(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_punct(&self, p: &str) -> bool {
        matches!(self.kind, TokenKind::Punct(q) if q == p)
    }
}

// longest first
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "!", "?",
    ":", ".", ",", "(", ")", "[", "]", "{", "}", "=", ";",
];

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    fn current(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(ahead)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.current()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.current().is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.pos > start
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, EvalError> {
        let space_before = self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.current() else {
            return Ok(None);
        };

        let kind = if is_ident_start(ch) {
            while self.current().is_some_and(is_ident_continue) {
                self.bump();
            }
            TokenKind::Ident(self.src[start..self.pos].to_string())
        } else if ch.is_ascii_digit()
            || (ch == '.' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            self.read_number(start)?
        } else if ch == '"' || ch == '\'' {
            self.read_string(ch, start)?
        } else {
            let rest = &self.src[start..];
            let Some(p) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) else {
                return Err(EvalError::syntax(format!("unexpected character `{ch}`"), start));
            };
            self.pos += p.len();
            TokenKind::Punct(p)
        };

        Ok(Some(Token {
            kind,
            text: self.src[start..self.pos].to_string(),
            offset: start,
            space_before,
        }))
    }

    fn read_number(&mut self, start: usize) -> Result<TokenKind, EvalError> {
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.current() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.current(), Some('e' | 'E')) {
            let digit_at = match self.peek_at(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    self.bump();
                }
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
            }
        }
        let text = &self.src[start..self.pos];
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| EvalError::syntax(format!("invalid number `{text}`"), start))
    }

    fn read_string(&mut self, quote: char, start: usize) -> Result<TokenKind, EvalError> {
        self.bump();
        let mut out = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(EvalError::syntax("unterminated string literal", start));
            };
            match ch {
                c if c == quote => break,
                '\\' => {
                    let Some(esc) = self.bump() else {
                        return Err(EvalError::syntax("unterminated string literal", start));
                    };
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'u' => {
                            let hex_start = self.pos;
                            let hex = self.src.get(hex_start..hex_start + 4).unwrap_or("");
                            let ch = u32::from_str_radix(hex, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| {
                                    EvalError::syntax("invalid unicode escape", hex_start)
                                })?;
                            self.pos += 4;
                            out.push(ch);
                        }
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
        Ok(TokenKind::Str(out))
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, EvalError> {
    Lexer::new(src).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src)
            .expect("tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn dollar_names_and_indexing() {
        assert_eq!(
            kinds("$parents[2].name"),
            vec![
                TokenKind::Ident("$parents".into()),
                TokenKind::Punct("["),
                TokenKind::Number(2.0),
                TokenKind::Punct("]"),
                TokenKind::Punct("."),
                TokenKind::Ident("name".into()),
            ]
        );
    }

    #[test]
    fn longest_punctuator_wins() {
        assert_eq!(
            kinds("a !== b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("!=="),
                TokenKind::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn strings_decode_escapes() {
        assert_eq!(kinds(r#"'it\'s' "A""#), vec![
            TokenKind::Str("it's".into()),
            TokenKind::Str("A".into()),
        ]);
    }

    #[test]
    fn records_spacing() {
        let toks = tokenize("a +b").expect("tokenize");
        assert!(!toks[0].space_before);
        assert!(toks[1].space_before);
        assert!(!toks[2].space_before);
    }

    #[test]
    fn unterminated_string_is_error() {
        let err = tokenize("'open").unwrap_err();
        assert!(matches!(err, EvalError::Syntax { offset: 0, .. }));
    }

    #[test]
    fn rejects_unknown_characters() {
        assert!(tokenize("a # b").is_err());
    }
}
