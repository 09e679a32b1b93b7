//! Error types for decoding automations and evaluating expressions.

use thiserror::Error;

/// An enumerated token (`by`, `on`, ...) that is not part of the closed set.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid {field} value {value:?}")]
pub struct TokenError {
    pub field: &'static str,
    pub value: String,
}

impl TokenError {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Failures raised while parsing or evaluating `${...}` templates.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("unterminated interpolation starting at byte {0}")]
    Unterminated(usize),

    #[error("invalid reference `{0}`")]
    InvalidReference(String),

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("`{path}` has no attribute `{attribute}`")]
    UnknownAttribute { path: String, attribute: String },

    #[error("`{0}` cannot be rendered into a string")]
    NotRenderable(String),
}

/// Failures raised while loading an automation file.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("YAML decode error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported file extension: {0}")]
    UnsupportedFormat(String),
}
