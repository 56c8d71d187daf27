//! Error types for the expression core

use thiserror::Error;

/// Result type for expression operations
pub type Result<T> = std::result::Result<T, ExprError>;

/// Expression core errors
#[derive(Error, Debug)]
pub enum ExprError {
    #[error("Unresolved name: '{0}' is not a registered operator, fragment or function")]
    UnresolvedName(String),

    #[error("Node at '{path}' cannot be converted: {reason}")]
    NotConvertible { path: String, reason: String },

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
