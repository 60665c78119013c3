//! Gateway policy that evaluates configured expressions against the current
//! request or response and stores the results as execution context attributes
//! for downstream policies.
//!
//! ```
//! use assign_attributes::{
//!     AssignAttributesPolicy, AssignAttributesPolicyConfiguration, Attribute, ExecutionContext,
//!     GatewayContext, PolicyChain, PolicyScope, Request, Response,
//! };
//!
//! struct Continue;
//! impl PolicyChain for Continue {
//!     fn do_next(&mut self, _: &Request, _: &Response) {}
//! }
//!
//! let policy = AssignAttributesPolicy::new(AssignAttributesPolicyConfiguration::new(
//!     Some(PolicyScope::Request),
//!     vec![Attribute::new("k1", "{request.header('X')}")],
//! ));
//! let request = Request::new("req-1", "GET", "/").with_header("X", "Value");
//! let response = Response::new(200);
//! let mut context = GatewayContext::new(&request, &response);
//!
//! policy.on_request(&request, &response, &mut context, &mut Continue);
//! assert_eq!(context.get_attribute("k1"), Some(&serde_json::json!("Value")));
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod functions; // methods callable from templates
pub mod http;
pub mod policy;
pub mod stream;
pub mod subject;
mod expression;
mod parser;

pub use config::{AssignAttributesPolicyConfiguration, Attribute, PolicyScope};
pub use context::{ExecutionContext, GatewayContext, TemplateContext, TemplateEngine, VariableResolver};
pub use engine::PathTemplateEngine;
pub use errors::{ConfigError, EvalError, Result};
pub use http::{HttpHeaders, Request, Response};
pub use policy::{AssignAttributesPolicy, Phase, PolicyChain};
pub use stream::{BodyBuffer, ContentStream, ReadWriteStream};
pub use subject::{EvaluableRequest, EvaluableResponse};
