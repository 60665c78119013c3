use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde_json::Value;

use crate::errors::{EvalError, Result};

/// A method callable on a value from a template: `receiver.name(args...)`.
pub trait Method: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> RangeInclusive<usize>;
    fn call(&self, receiver: &Value, args: &[Value]) -> Result<Value>;
}

/// Thread-safe method registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Method>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(builtins::Header);
        registry.register(builtins::Lower);
        registry.register(builtins::Upper);
        registry.register(builtins::Trim);
        registry.register(builtins::Json);
        registry
    }

    pub fn register<M: Method + 'static>(&mut self, m: M) {
        Arc::make_mut(&mut self.inner).insert(m.name(), Arc::new(m));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Method>> {
        self.inner.get(name).cloned()
    }

    /// Looks up `name`, checks arity and invokes it.
    pub fn invoke(&self, name: &str, receiver: &Value, args: &[Value]) -> Result<Value> {
        let method = self
            .get(name)
            .ok_or_else(|| EvalError::Runtime(format!("unknown method '{name}'")))?;
        if !method.arity().contains(&args.len()) {
            return Err(EvalError::Runtime(format!(
                "method '{name}' expects {:?} arguments, got {}",
                method.arity(),
                args.len()
            )));
        }
        method.call(receiver, args)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.inner.keys().collect();
        names.sort();
        f.debug_struct("Registry").field("methods", &names).finish()
    }
}

pub mod builtins {
    use super::*;

    fn string_arg<'v>(method: &str, args: &'v [Value], i: usize) -> Result<&'v str> {
        args.get(i)
            .and_then(Value::as_str)
            .ok_or_else(|| EvalError::Runtime(format!("{method}: argument {i} must be a string")))
    }

    /// `subject.header(name)`: first value of a header, any casing.
    pub struct Header;
    impl Method for Header {
        fn name(&self) -> &'static str { "header" }
        fn arity(&self) -> RangeInclusive<usize> { 1..=1 }
        fn call(&self, receiver: &Value, args: &[Value]) -> Result<Value> {
            let wanted = string_arg("header", args, 0)?;
            let headers = receiver
                .get("headers")
                .and_then(Value::as_object)
                .ok_or_else(|| EvalError::Runtime("header: receiver has no headers".into()))?;
            Ok(headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
                .and_then(|(_, values)| values.get(0).cloned())
                .unwrap_or(Value::Null))
        }
    }

    pub struct Lower;
    impl Method for Lower {
        fn name(&self) -> &'static str { "lower" }
        fn arity(&self) -> RangeInclusive<usize> { 0..=0 }
        fn call(&self, receiver: &Value, _: &[Value]) -> Result<Value> {
            Ok(match receiver {
                Value::String(t) => Value::String(t.to_lowercase()),
                other => other.clone(),
            })
        }
    }

    pub struct Upper;
    impl Method for Upper {
        fn name(&self) -> &'static str { "upper" }
        fn arity(&self) -> RangeInclusive<usize> { 0..=0 }
        fn call(&self, receiver: &Value, _: &[Value]) -> Result<Value> {
            Ok(match receiver {
                Value::String(t) => Value::String(t.to_uppercase()),
                other => other.clone(),
            })
        }
    }

    pub struct Trim;
    impl Method for Trim {
        fn name(&self) -> &'static str { "trim" }
        fn arity(&self) -> RangeInclusive<usize> { 0..=0 }
        fn call(&self, receiver: &Value, _: &[Value]) -> Result<Value> {
            Ok(match receiver {
                Value::String(t) => Value::String(t.trim().to_string()),
                other => other.clone(),
            })
        }
    }

    /// Parses a string (typically a body) as JSON.
    pub struct Json;
    impl Method for Json {
        fn name(&self) -> &'static str { "json" }
        fn arity(&self) -> RangeInclusive<usize> { 0..=0 }
        fn call(&self, receiver: &Value, _: &[Value]) -> Result<Value> {
            match receiver {
                Value::String(raw) => serde_json::from_str(raw)
                    .map_err(|e| EvalError::Runtime(format!("json: {e}"))),
                Value::Null => Ok(Value::Null),
                other => Ok(other.clone()),
            }
        }
    }
}
