//! Body streaming for the content phases.

use std::borrow::Cow;

use crate::context::ExecutionContext;
use crate::http::{Request, Response};
use crate::policy::{AssignAttributesPolicy, Phase};
use crate::subject::{EvaluableRequest, EvaluableResponse, REQUEST_VARIABLE, RESPONSE_VARIABLE};

/// A stage of a body stream: receives chunks, then exactly one end signal.
pub trait ReadWriteStream {
    fn write(&mut self, chunk: &[u8]);
    fn end(&mut self);
}

/// Accumulates every chunk of one body into a single byte sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyBuffer {
    bytes: Vec<u8>,
}

impl BodyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Body as UTF-8 text; invalid sequences are replaced.
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Writes the buffered bytes downstream (when any), then ends it.
    pub fn flush_into(&self, next: &mut dyn ReadWriteStream) {
        if !self.is_empty() {
            next.write(&self.bytes);
        }
        next.end();
    }
}

#[derive(Debug, Clone, Copy)]
enum ContentSubject<'a> {
    Request(&'a Request),
    Response(&'a Response),
}

/// Per-invocation stream returned by the content hooks.
///
/// When the scope targets this phase the whole body is buffered, attributes
/// are assigned on `end`, then the untouched body is forwarded to `next`.
/// Otherwise chunks pass straight through to `next` as they arrive.
pub struct ContentStream<'a> {
    policy: &'a AssignAttributesPolicy,
    subject: ContentSubject<'a>,
    context: &'a mut dyn ExecutionContext,
    next: &'a mut dyn ReadWriteStream,
    buffer: BodyBuffer,
    ended: bool,
}

impl<'a> ContentStream<'a> {
    pub(crate) fn for_request(
        policy: &'a AssignAttributesPolicy,
        request: &'a Request,
        context: &'a mut dyn ExecutionContext,
        next: &'a mut dyn ReadWriteStream,
    ) -> Self {
        Self::new(policy, ContentSubject::Request(request), context, next)
    }

    pub(crate) fn for_response(
        policy: &'a AssignAttributesPolicy,
        response: &'a Response,
        context: &'a mut dyn ExecutionContext,
        next: &'a mut dyn ReadWriteStream,
    ) -> Self {
        Self::new(policy, ContentSubject::Response(response), context, next)
    }

    fn new(
        policy: &'a AssignAttributesPolicy,
        subject: ContentSubject<'a>,
        context: &'a mut dyn ExecutionContext,
        next: &'a mut dyn ReadWriteStream,
    ) -> Self {
        Self {
            policy,
            subject,
            context,
            next,
            buffer: BodyBuffer::new(),
            ended: false,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.subject {
            ContentSubject::Request(_) => Phase::RequestContent,
            ContentSubject::Response(_) => Phase::ResponseContent,
        }
    }

    pub fn buffer(&self) -> &BodyBuffer {
        &self.buffer
    }

    fn bind_subject(&mut self) {
        let content = self.buffer.as_text();
        let (name, value) = match self.subject {
            ContentSubject::Request(req) => (
                REQUEST_VARIABLE,
                EvaluableRequest::with_content(req, &content).to_value(),
            ),
            ContentSubject::Response(res) => (
                RESPONSE_VARIABLE,
                EvaluableResponse::with_content(res, &content).to_value(),
            ),
        };
        self.context.set_variable(name, value);
    }
}

impl ReadWriteStream for ContentStream<'_> {
    fn write(&mut self, chunk: &[u8]) {
        if self.policy.runs_at(self.phase()) {
            self.buffer.append(chunk);
        } else {
            self.next.write(chunk);
        }
    }

    fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        if self.policy.runs_at(self.phase()) {
            self.bind_subject();
            self.policy.assign(&mut *self.context);
            self.buffer.flush_into(&mut *self.next);
        } else {
            tracing::debug!(phase = ?self.phase(), "scope does not target this phase, body was streamed");
            self.next.end();
        }
    }
}
