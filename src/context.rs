//! Execution context seams shared between the policy and its host.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use serde_json::{json, Value};

use crate::engine::PathTemplateEngine;
use crate::errors::Result;
use crate::http::{Request, Response};
use crate::subject::{EvaluableRequest, EvaluableResponse, REQUEST_VARIABLE, RESPONSE_VARIABLE};

/// Variable name exposing the execution context itself (`context.attributes`).
pub const CONTEXT_VARIABLE: &str = "context";

/// Resolves top-level variable names at evaluation time.
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>>;
}

/// Evaluates an expression string against a set of variables and returns an
/// untyped value. `Value::Null` is a successful "no value" result.
pub trait TemplateEngine: Send + Sync {
    fn get_value(&self, expression: &str, variables: &dyn VariableResolver) -> Result<Value>;
}

/// Variables bound for the expression engine.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, Value>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }
}

impl VariableResolver for TemplateContext {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        self.variables.get(name).map(Cow::Borrowed)
    }
}

/// What the policy needs from the host's per-lifecycle context: an
/// expression evaluator, variable binding, and the attribute store.
pub trait ExecutionContext {
    fn get_value(&self, expression: &str) -> Result<Value>;

    fn set_variable(&mut self, name: &str, value: Value);

    /// Adds or overwrites an attribute.
    fn set_attribute(&mut self, name: &str, value: Value);

    fn get_attribute(&self, name: &str) -> Option<&Value>;
}

/// In-process execution context for one request/response lifecycle.
#[derive(Debug)]
pub struct GatewayContext<E = PathTemplateEngine> {
    engine: E,
    template_context: TemplateContext,
    attributes: BTreeMap<String, Value>,
}

impl GatewayContext<PathTemplateEngine> {
    pub fn new(request: &Request, response: &Response) -> Self {
        Self::with_engine(PathTemplateEngine::default(), request, response)
    }
}

impl<E: TemplateEngine> GatewayContext<E> {
    /// Binds `request` and `response` (without body content) up front.
    pub fn with_engine(engine: E, request: &Request, response: &Response) -> Self {
        let mut template_context = TemplateContext::new();
        template_context.set_variable(REQUEST_VARIABLE, EvaluableRequest::new(request).to_value());
        template_context.set_variable(RESPONSE_VARIABLE, EvaluableResponse::new(response).to_value());
        Self {
            engine,
            template_context,
            attributes: BTreeMap::new(),
        }
    }

    pub fn template_context(&self) -> &TemplateContext {
        &self.template_context
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn into_attributes(self) -> BTreeMap<String, Value> {
        self.attributes
    }
}

impl<E: TemplateEngine> ExecutionContext for GatewayContext<E> {
    fn get_value(&self, expression: &str) -> Result<Value> {
        let scope = EvaluationScope {
            template_context: &self.template_context,
            attributes: &self.attributes,
        };
        self.engine.get_value(expression, &scope)
    }

    fn set_variable(&mut self, name: &str, value: Value) {
        self.template_context.set_variable(name, value);
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }

    fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

// `context` is rebuilt per lookup so expressions see attributes written
// earlier in the same pass.
struct EvaluationScope<'a> {
    template_context: &'a TemplateContext,
    attributes: &'a BTreeMap<String, Value>,
}

impl VariableResolver for EvaluationScope<'_> {
    fn resolve(&self, name: &str) -> Option<Cow<'_, Value>> {
        if name == CONTEXT_VARIABLE {
            return Some(Cow::Owned(json!({ "attributes": self.attributes })));
        }
        self.template_context.resolve(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn binds_request_and_response_on_creation() {
        let req = Request::new("r", "GET", "/").with_header("X", "1");
        let res = Response::new(204);
        let ctx = GatewayContext::new(&req, &res);
        let vars = ctx.template_context();
        assert_eq!(vars.get_variable("request").unwrap()["headers"], json!({"X": ["1"]}));
        assert_eq!(vars.get_variable("response").unwrap()["status"], json!(204));
    }

    #[test]
    fn attributes_are_visible_to_later_evaluations() {
        let req = Request::new("r", "GET", "/");
        let res = Response::new(200);
        let mut ctx = GatewayContext::new(&req, &res);
        ctx.set_attribute("user", json!("alice"));
        let value = ctx.get_value("{context.attributes['user']}").unwrap();
        assert_eq!(value, json!("alice"));
    }

    #[test]
    fn set_attribute_overwrites() {
        let req = Request::new("r", "GET", "/");
        let res = Response::new(200);
        let mut ctx = GatewayContext::new(&req, &res);
        ctx.set_attribute("k", json!(1));
        ctx.set_attribute("k", json!(2));
        assert_eq!(ctx.get_attribute("k"), Some(&json!(2)));
        assert_eq!(ctx.attributes().len(), 1);
        assert_eq!(ctx.into_attributes().into_iter().collect::<Vec<_>>(), vec![("k".to_string(), json!(2))]);
    }
}
