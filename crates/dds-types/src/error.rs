use thiserror::Error;

/// Errors produced by record and metadata operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid version {value:?}: {reason}")]
    InvalidVersion { value: String, reason: String },
}

/// Result alias for type-level operations.
pub type TypeResult<T> = Result<T, TypeError>;
