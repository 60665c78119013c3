//! Evaluation subjects: the views of a request or response that expressions see.

use serde_json::{json, Map, Value};

use crate::http::{Request, Response};

/// Variable name under which the request subject is bound.
pub const REQUEST_VARIABLE: &str = "request";
/// Variable name under which the response subject is bound.
pub const RESPONSE_VARIABLE: &str = "response";

#[derive(Debug, Clone, Copy)]
pub struct EvaluableRequest<'a> {
    request: &'a Request,
    content: Option<&'a str>,
}

impl<'a> EvaluableRequest<'a> {
    pub fn new(request: &'a Request) -> Self {
        Self { request, content: None }
    }

    pub fn with_content(request: &'a Request, content: &'a str) -> Self {
        Self { request, content: Some(content) }
    }

    pub fn to_value(&self) -> Value {
        let req = self.request;
        let parameters: Map<String, Value> = req
            .parameters()
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        let mut out = json!({
            "id": req.id(),
            "transactionId": req.transaction_id(),
            "method": req.method(),
            "uri": req.uri(),
            "path": req.path(),
            "parameters": parameters,
            "headers": req.headers().to_value(),
            "remoteAddress": req.remote_address(),
            "timestamp": req.timestamp(),
        });
        if let (Some(content), Value::Object(map)) = (self.content, &mut out) {
            map.insert("content".into(), Value::String(content.to_string()));
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluableResponse<'a> {
    response: &'a Response,
    content: Option<&'a str>,
}

impl<'a> EvaluableResponse<'a> {
    pub fn new(response: &'a Response) -> Self {
        Self { response, content: None }
    }

    pub fn with_content(response: &'a Response, content: &'a str) -> Self {
        Self { response, content: Some(content) }
    }

    pub fn to_value(&self) -> Value {
        let mut out = json!({
            "status": self.response.status(),
            "headers": self.response.headers().to_value(),
        });
        if let (Some(content), Value::Object(map)) = (self.content, &mut out) {
            map.insert("content".into(), Value::String(content.to_string()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_subject_exposes_metadata() {
        let req = Request::new("r-1", "POST", "/orders?id=7")
            .with_header("Content-Type", "application/json")
            .with_remote_address("10.0.0.1");
        let value = EvaluableRequest::new(&req).to_value();
        assert_eq!(value["method"], json!("POST"));
        assert_eq!(value["path"], json!("/orders"));
        assert_eq!(value["parameters"], json!({"id": ["7"]}));
        assert_eq!(value["headers"], json!({"Content-Type": ["application/json"]}));
        assert_eq!(value["remoteAddress"], json!("10.0.0.1"));
        assert!(value.get("content").is_none());
    }

    #[test]
    fn content_is_present_only_when_bound() {
        let res = Response::new(201);
        assert!(EvaluableResponse::new(&res).to_value().get("content").is_none());

        let value = EvaluableResponse::with_content(&res, "{\"ok\":true}").to_value();
        assert_eq!(value["status"], json!(201));
        assert_eq!(value["content"], json!("{\"ok\":true}"));
    }
}
