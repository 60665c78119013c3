// src/parser.rs
use serde_json::Value;

use crate::errors::EvalError;

/// Character cursor shared by the template and expression parsers.
pub struct Parser<'a> {
    s: &'a str,
    i: usize,
}

impl<'a> Parser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn rest(&self) -> &'a str {
        &self.s[self.i..]
    }

    pub fn advance(&mut self, bytes: usize) {
        self.i = (self.i + bytes).min(self.s.len());
    }

    pub fn error(&self, msg: impl std::fmt::Display) -> EvalError {
        EvalError::Parse(format!("{msg} at offset {}", self.i))
    }

    pub fn parse_identifier(&mut self) -> Result<&'a str, EvalError> {
        let start = self.i;
        while let Some(c) = self.peek_char() {
            if c == '_' || c == '$' || c.is_ascii_alphanumeric() {
                self.i += 1;
            } else {
                break;
            }
        }
        if self.i == start || self.s[start..].starts_with(|c: char| c.is_ascii_digit()) {
            self.i = start;
            return Err(self.error("identifier expected"));
        }
        Ok(&self.s[start..self.i])
    }

    pub fn parse_number_literal(&mut self) -> Result<Value, EvalError> {
        let start = self.i;
        self.consume_char('-');
        self.skip_digits();
        if self.peek_str(".") && self.s[self.i + 1..].starts_with(|c: char| c.is_ascii_digit()) {
            self.i += 1;
            self.skip_digits();
        }
        let s = &self.s[start..self.i];
        if s.is_empty() || s == "-" {
            return Err(self.error("number expected"));
        }
        if s.contains('.') {
            let f: f64 = s.parse().map_err(|_| self.error("bad float"))?;
            Ok(Value::from(f))
        } else {
            let n: i64 = s.parse().map_err(|_| self.error("bad integer"))?;
            Ok(Value::from(n))
        }
    }

    pub fn parse_quoted_string(&mut self) -> Result<String, EvalError> {
        let quote = match self.peek_char() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.i += 1;
        let mut out = String::new();
        while let Some(c) = self.peek_char() {
            self.i += c.len_utf8();
            if c == quote {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let Some(nc) = self.peek_char() else { break };
            self.i += nc.len_utf8();
            match nc {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' | '"' | '\'' => out.push(nc),
                _ => {
                    out.push('\\');
                    out.push(nc);
                }
            }
        }
        Err(self.error("unterminated string"))
    }

    pub fn expect(&mut self, c: char) -> Result<(), EvalError> {
        if self.consume_char(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    pub fn consume_char(&mut self, c: char) -> bool {
        if self.peek_char() == Some(c) {
            self.i += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn peek_char(&self) -> Option<char> {
        self.s[self.i..].chars().next()
    }

    pub fn peek_str(&self, lit: &str) -> bool {
        self.s[self.i..].starts_with(lit)
    }

    pub fn skip_ws(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.i += c.len_utf8();
        }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    fn skip_digits(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.i += 1;
        }
    }
}
