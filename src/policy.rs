use serde_json::Value;

use crate::config::{AssignAttributesPolicyConfiguration, Attribute, PolicyScope};
use crate::context::ExecutionContext;
use crate::http::{Request, Response};
use crate::stream::{ContentStream, ReadWriteStream};

/// The four lifecycle hooks a policy is invoked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Request,
    RequestContent,
    Response,
    ResponseContent,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Request,
        Phase::RequestContent,
        Phase::Response,
        Phase::ResponseContent,
    ];

    /// Content phases run only after the whole body was buffered.
    pub fn is_content(self) -> bool {
        matches!(self, Phase::RequestContent | Phase::ResponseContent)
    }
}

/// Continuation of the host's policy chain for the header phases.
pub trait PolicyChain {
    fn do_next(&mut self, request: &Request, response: &Response);
}

/// Evaluates configured expressions and stores their results as execution
/// context attributes.
///
/// Holds no per-request state; one instance can serve concurrent lifecycles.
/// Evaluation failures never escape: they are logged and the attribute is
/// skipped, and every hook always hands control back to the host.
#[derive(Debug, Clone)]
pub struct AssignAttributesPolicy {
    configuration: AssignAttributesPolicyConfiguration,
}

impl AssignAttributesPolicy {
    pub fn new(configuration: AssignAttributesPolicyConfiguration) -> Self {
        Self { configuration }
    }

    pub fn configuration(&self) -> &AssignAttributesPolicyConfiguration {
        &self.configuration
    }

    /// Whether the configured scope assigns at `phase`.
    pub fn runs_at(&self, phase: Phase) -> bool {
        PolicyScope::phase(self.configuration.scope()) == phase
    }

    /// Request headers hook.
    pub fn on_request(
        &self,
        request: &Request,
        response: &Response,
        context: &mut dyn ExecutionContext,
        chain: &mut dyn PolicyChain,
    ) {
        self.run_headers_phase(Phase::Request, context);
        chain.do_next(request, response);
    }

    /// Response headers hook.
    pub fn on_response(
        &self,
        request: &Request,
        response: &Response,
        context: &mut dyn ExecutionContext,
        chain: &mut dyn PolicyChain,
    ) {
        self.run_headers_phase(Phase::Response, context);
        chain.do_next(request, response);
    }

    /// Request body hook. Write the body into the returned stream and end it;
    /// the body reaches `next` unchanged once the stream ends.
    pub fn on_request_content<'a>(
        &'a self,
        request: &'a Request,
        context: &'a mut dyn ExecutionContext,
        next: &'a mut dyn ReadWriteStream,
    ) -> ContentStream<'a> {
        ContentStream::for_request(self, request, context, next)
    }

    /// Response body hook, see [`AssignAttributesPolicy::on_request_content`].
    pub fn on_response_content<'a>(
        &'a self,
        response: &'a Response,
        context: &'a mut dyn ExecutionContext,
        next: &'a mut dyn ReadWriteStream,
    ) -> ContentStream<'a> {
        ContentStream::for_response(self, response, context, next)
    }

    fn run_headers_phase(&self, phase: Phase, context: &mut dyn ExecutionContext) {
        if self.runs_at(phase) {
            self.assign(context);
        } else {
            tracing::debug!(?phase, "scope does not target this phase");
        }
    }

    /// Evaluates every named attribute in configuration order.
    pub(crate) fn assign(&self, context: &mut dyn ExecutionContext) {
        for attribute in self.configuration.attributes() {
            let Some(name) = attribute.name().filter(|_| attribute.has_name()) else {
                continue;
            };
            match evaluate(attribute, context) {
                Ok(Some(value)) => {
                    tracing::debug!(attribute = %name, "assigning context attribute");
                    context.set_attribute(name, value);
                }
                Ok(None) => {
                    tracing::trace!(attribute = %name, "expression produced no value");
                }
                // Contained per attribute: the chain must keep going.
                Err(error) => {
                    tracing::error!(
                        attribute = %name,
                        %error,
                        "An error occurs while decoding context attribute"
                    );
                }
            }
        }
    }
}

fn evaluate(
    attribute: &Attribute,
    context: &dyn ExecutionContext,
) -> crate::errors::Result<Option<Value>> {
    let Some(expression) = attribute.value() else {
        return Ok(None);
    };
    let value = context.get_value(expression)?;
    Ok((!value.is_null()).then_some(value))
}
