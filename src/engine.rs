use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::context::{TemplateEngine, VariableResolver};
use crate::errors::{EvalError, Result};
use crate::expression::{self, Expr, Segment};
use crate::functions::Registry;

/// Resolves `{...}` path templates against bound variables.
///
/// A template that is exactly one `{expr}` yields the raw value; text mixed
/// with segments yields a string; text alone is returned as is.
#[derive(Debug, Clone)]
pub struct PathTemplateEngine {
    registry: Registry,
}

impl Default for PathTemplateEngine {
    fn default() -> Self {
        Self::new(Registry::with_builtins())
    }
}

impl PathTemplateEngine {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    fn eval<'v>(&self, node: &Expr, vars: &'v dyn VariableResolver) -> Result<Cow<'v, Value>> {
        match node {
            Expr::Literal(v) => Ok(Cow::Owned(v.clone())),
            Expr::Variable(name) => vars
                .resolve(name)
                .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
            Expr::Property { target, name } => {
                let target = self.eval(target, vars)?;
                property(target, name)
            }
            Expr::Index { target, index } => {
                let target = self.eval(target, vars)?;
                let index = self.eval(index, vars)?;
                element(target, &index)
            }
            Expr::Call { target, method, args } => {
                let receiver = self.eval(target, vars)?;
                let args = args
                    .iter()
                    .map(|a| self.eval(a, vars).map(Cow::into_owned))
                    .collect::<Result<Vec<_>>>()?;
                self.registry.invoke(method, &receiver, &args).map(Cow::Owned)
            }
        }
    }
}

impl TemplateEngine for PathTemplateEngine {
    fn get_value(&self, expression: &str, variables: &dyn VariableResolver) -> Result<Value> {
        let template = expression::parse_template(expression)?;
        match template.segments.as_slice() {
            [] => Ok(Value::String(String::new())),
            [Segment::Expr(node)] => self.eval(node, variables).map(Cow::into_owned),
            segments => {
                let mut out = String::new();
                for segment in segments {
                    match segment {
                        Segment::Text(text) => out.push_str(text),
                        Segment::Expr(node) => match self.eval(node, variables)?.as_ref() {
                            Value::Null => {}
                            Value::String(s) => out.push_str(s),
                            other => out.push_str(&other.to_string()),
                        },
                    }
                }
                Ok(Value::String(out))
            }
        }
    }
}

// Keys match exactly first, then ignoring ASCII case: header names are
// case-insensitive.
fn folded_key<'m>(map: &'m Map<String, Value>, name: &str) -> Option<&'m str> {
    map.keys().find(|k| k.eq_ignore_ascii_case(name)).map(String::as_str)
}

// Borrowed targets stay borrowed so walking a large subject does not copy it.
fn property<'v>(target: Cow<'v, Value>, name: &str) -> Result<Cow<'v, Value>> {
    match target {
        Cow::Borrowed(Value::Object(map)) => Ok(map
            .get(name)
            .or_else(|| folded_key(map, name).and_then(|k| map.get(k)))
            .map_or(Cow::Owned(Value::Null), Cow::Borrowed)),
        Cow::Owned(Value::Object(mut map)) => {
            let value = match map.remove(name) {
                Some(v) => Some(v),
                None => folded_key(&map, name).map(str::to_owned).and_then(|k| map.remove(&k)),
            };
            Ok(Cow::Owned(value.unwrap_or(Value::Null)))
        }
        Cow::Borrowed(Value::Null) | Cow::Owned(Value::Null) => {
            Err(EvalError::Runtime(format!("cannot read property '{name}' of null")))
        }
        other => Err(EvalError::Runtime(format!(
            "property '{name}' not found on {}",
            kind(&other)
        ))),
    }
}

fn element<'v>(target: Cow<'v, Value>, index: &Value) -> Result<Cow<'v, Value>> {
    if let Value::String(key) = index {
        if target.is_object() {
            return property(target, key);
        }
    }
    let i = match (target.as_ref(), index) {
        (Value::Array(_), Value::Number(n)) => n
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| EvalError::Runtime(format!("invalid array index {n}")))?,
        (Value::Null, _) => return Err(EvalError::Runtime("cannot index into null".into())),
        (t, i) => {
            return Err(EvalError::Runtime(format!(
                "cannot index {} with {}",
                kind(t),
                kind(i)
            )))
        }
    };
    Ok(match target {
        Cow::Borrowed(items) => items.get(i).map_or(Cow::Owned(Value::Null), Cow::Borrowed),
        Cow::Owned(items) => Cow::Owned(items.get(i).cloned().unwrap_or(Value::Null)),
    })
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
