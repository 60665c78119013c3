use thiserror::Error;

/// Failure raised by a template engine while evaluating an attribute expression.
#[derive(Debug, Error)]
pub enum EvalError {
    // The expression text could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    // The expression parsed but could not be evaluated against the bound variables
    #[error("runtime error: {0}")]
    Runtime(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
}

/// Failure while loading a policy configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

// Results produced by expression evaluation
pub type Result<T> = std::result::Result<T, EvalError>;
