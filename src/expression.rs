// src/expression.rs
use serde_json::Value;

use crate::errors::EvalError;
use crate::parser::Parser;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Property { target: Box<Expr>, name: String },
    Index { target: Box<Expr>, index: Box<Expr> },
    Call { target: Box<Expr>, method: String, args: Vec<Expr> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    Expr(Expr),
}

/// Literal text interleaved with `{expr}` segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

pub fn parse_template(input: &str) -> Result<Template, EvalError> {
    let mut p = Parser::new(input);
    let mut segments = Vec::new();
    while !p.eof() {
        let rest = p.rest();
        match rest.find('{') {
            Some(0) => {
                p.expect('{')?;
                let expr = parse_node(&mut p)?;
                p.skip_ws();
                p.expect('}')?;
                segments.push(Segment::Expr(expr));
            }
            Some(n) => {
                segments.push(Segment::Text(rest[..n].to_string()));
                p.advance(n);
            }
            None => {
                segments.push(Segment::Text(rest.to_string()));
                p.advance(rest.len());
            }
        }
    }
    Ok(Template { segments })
}

fn parse_node(p: &mut Parser<'_>) -> Result<Expr, EvalError> {
    let mut node = parse_primary(p)?;
    loop {
        p.skip_ws();
        if p.consume_char('.') {
            p.skip_ws();
            let name = p.parse_identifier()?.to_string();
            p.skip_ws();
            node = if p.consume_char('(') {
                let args = parse_args(p)?;
                Expr::Call { target: Box::new(node), method: name, args }
            } else {
                Expr::Property { target: Box::new(node), name }
            };
        } else if p.consume_char('[') {
            let index = parse_node(p)?;
            p.skip_ws();
            p.expect(']')?;
            node = Expr::Index { target: Box::new(node), index: Box::new(index) };
        } else {
            return Ok(node);
        }
    }
}

fn parse_primary(p: &mut Parser<'_>) -> Result<Expr, EvalError> {
    p.skip_ws();
    match p.peek_char() {
        Some('\'' | '"') => Ok(Expr::Literal(Value::String(p.parse_quoted_string()?))),
        Some(c) if c == '-' || c.is_ascii_digit() => Ok(Expr::Literal(p.parse_number_literal()?)),
        Some(_) => {
            // `#name` and `name` both refer to a variable
            p.consume_char('#');
            let ident = p.parse_identifier()?;
            Ok(match ident {
                "null" => Expr::Literal(Value::Null),
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                name => Expr::Variable(name.to_string()),
            })
        }
        None => Err(p.error("expression expected")),
    }
}

fn parse_args(p: &mut Parser<'_>) -> Result<Vec<Expr>, EvalError> {
    let mut out = Vec::new();
    p.skip_ws();
    if p.consume_char(')') {
        return Ok(out);
    }
    loop {
        out.push(parse_node(p)?);
        p.skip_ws();
        if p.consume_char(',') {
            continue;
        }
        p.expect(')')?;
        return Ok(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn var(name: &str) -> Box<Expr> {
        Box::new(Expr::Variable(name.into()))
    }

    fn single(input: &str) -> Expr {
        match parse_template(input).unwrap().segments.as_slice() {
            [Segment::Expr(e)] => e.clone(),
            other => panic!("expected one expression segment, got {other:?}"),
        }
    }

    #[test]
    fn parses_header_accessors() {
        assert_eq!(
            single("{request.header('X')}"),
            Expr::Call {
                target: var("request"),
                method: "header".into(),
                args: vec![Expr::Literal(Value::from("X"))],
            }
        );
        assert_eq!(
            single("{#request.headers['X-Gravitee-Test']}"),
            Expr::Index {
                target: Box::new(Expr::Property { target: var("request"), name: "headers".into() }),
                index: Box::new(Expr::Literal(Value::from("X-Gravitee-Test"))),
            }
        );
    }

    #[test]
    fn splits_template_segments() {
        let t = parse_template("id={request.id}; ok").unwrap();
        assert_eq!(
            t.segments,
            vec![
                Segment::Text("id=".into()),
                Segment::Expr(Expr::Property { target: var("request"), name: "id".into() }),
                Segment::Text("; ok".into()),
            ]
        );
    }

    #[test]
    fn keywords_are_literals() {
        assert_eq!(single("{ null }"), Expr::Literal(Value::Null));
        assert_eq!(single("{true}"), Expr::Literal(Value::Bool(true)));
        assert_eq!(single("{-3}"), Expr::Literal(Value::from(-3)));
    }

    #[test]
    fn braces_inside_strings_do_not_close_segment() {
        assert_eq!(single("{'}'}"), Expr::Literal(Value::from("}")));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_template("{request.header('X')").is_err());
        assert!(parse_template("{}").is_err());
        assert!(parse_template("{request.}").is_err());
        assert!(parse_template("{request extra}").is_err());
        assert!(parse_template("{request.header('X'}").is_err());
    }
}
