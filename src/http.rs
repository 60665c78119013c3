//! Minimal request/response model handed to the policy by the host.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use itertools::Itertools;
use serde_json::{Map, Value};

/// Multi-valued headers. Lookups ignore case; insertion order and the
/// original casing of the first occurrence are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    entries: Vec<(String, Vec<String>)>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
        self
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.position(name)
            .map(|i| self.entries[i].1.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// `{"Name": ["v1", "v2"], ...}`
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .iter()
            .map(|(name, values)| {
                let values = values.iter().cloned().map(Value::String).collect();
                (name.to_string(), Value::Array(values))
            })
            .collect();
        Value::Object(map)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    id: String,
    transaction_id: String,
    method: String,
    uri: String,
    path: String,
    parameters: BTreeMap<String, Vec<String>>,
    headers: HttpHeaders,
    remote_address: Option<String>,
    timestamp: u64,
}

impl Request {
    /// Builds a request for `uri` (path plus optional query string).
    pub fn new(id: impl Into<String>, method: impl Into<String>, uri: impl Into<String>) -> Self {
        let id = id.into();
        let uri = uri.into();
        let (path, query) = match uri.split_once('?') {
            Some((p, q)) => (p.to_string(), q),
            None => (uri.clone(), ""),
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        Self {
            transaction_id: id.clone(),
            id,
            method: method.into(),
            path,
            parameters: parse_query(query),
            uri,
            headers: HttpHeaders::new(),
            remote_address: None,
            timestamp,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn with_remote_address(mut self, address: impl Into<String>) -> Self {
        self.remote_address = Some(address.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> &BTreeMap<String, Vec<String>> {
        &self.parameters
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HttpHeaders {
        &mut self.headers
    }

    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    /// Milliseconds since the Unix epoch at construction.
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: HttpHeaders,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HttpHeaders::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HttpHeaders {
        &mut self.headers
    }
}

// No percent-decoding: values are exposed as they appear on the wire.
fn parse_query(query: &str) -> BTreeMap<String, Vec<String>> {
    query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.to_string(), value.to_string())
        })
        .into_group_map()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn header_lookup_ignores_case() {
        let mut headers = HttpHeaders::new();
        headers.add("X-Gravitee-Test", "Value").add("x-gravitee-test", "Other");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-GRAVITEE-TEST"), Some("Value"));
        assert_eq!(headers.get_all("x-gravitee-test"), &["Value", "Other"]);
        assert!(headers.contains("X-Gravitee-test"));
        assert!(!headers.contains("missing"));
        assert!(headers.get("missing").is_none());
    }

    #[test]
    fn headers_render_as_value_lists() {
        let mut headers = HttpHeaders::new();
        headers.add("Accept", "a").add("Host", "h").add("accept", "b");
        assert_eq!(headers.to_value(), json!({"Accept": ["a", "b"], "Host": ["h"]}));
    }

    #[test]
    fn request_splits_path_and_query() {
        let req = Request::new("r1", "GET", "/pets?limit=10&tag=a&tag=b&flag");
        assert_eq!(req.path(), "/pets");
        assert_eq!(req.uri(), "/pets?limit=10&tag=a&tag=b&flag");
        assert_eq!(req.parameters()["tag"], vec!["a", "b"]);
        assert_eq!(req.parameters()["flag"], vec![""]);
        assert_eq!(req.parameters().keys().collect::<Vec<_>>(), vec!["flag", "limit", "tag"]);
        assert_eq!(req.transaction_id(), "r1");
    }
}
