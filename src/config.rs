use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::policy::Phase;

/// Lifecycle phase at which attributes are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyScope {
    Request,
    RequestContent,
    Response,
    ResponseContent,
}

impl PolicyScope {
    /// The single phase at which a scope runs its assignment.
    /// An unset scope behaves as `Request`.
    pub fn phase(scope: Option<PolicyScope>) -> Phase {
        match scope {
            None | Some(PolicyScope::Request) => Phase::Request,
            Some(PolicyScope::RequestContent) => Phase::RequestContent,
            Some(PolicyScope::Response) => Phase::Response,
            Some(PolicyScope::ResponseContent) => Phase::ResponseContent,
        }
    }
}

/// A named expression. `value` holds the expression text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: Some(value.into()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Entries without a usable name are never evaluated.
    pub fn has_name(&self) -> bool {
        self.name().is_some_and(|n| !n.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignAttributesPolicyConfiguration {
    #[serde(default)]
    scope: Option<PolicyScope>,
    #[serde(default)]
    attributes: Vec<Attribute>,
}

impl AssignAttributesPolicyConfiguration {
    pub fn new(scope: Option<PolicyScope>, attributes: Vec<Attribute>) -> Self {
        Self { scope, attributes }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn scope(&self) -> Option<PolicyScope> {
        self.scope
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}
