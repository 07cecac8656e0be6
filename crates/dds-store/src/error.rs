use std::fmt;

use dds_types::{RecordKind, TypeError};
use thiserror::Error;

/// Errors from datastore operations, shared by every backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record matches the key.
    #[error("no {kind} record found for key {key}")]
    NotFound { kind: RecordKind, key: String },

    /// Add on a key that is already present.
    #[error("{kind} record already exists for key {key}")]
    AlreadyExists { kind: RecordKind, key: String },

    /// Optimistic version conflict: the expected row version is out of date.
    #[error("stale {kind} record for key {key}: row version conflict")]
    Stale { kind: RecordKind, key: String },

    /// The backend permanently rejects this operation for this entity kind.
    #[error("{operation} operation not supported for {kind}")]
    Unsupported {
        kind: RecordKind,
        operation: &'static str,
    },

    /// The env metadata singleton has never been written.
    #[error("env metadata not set")]
    EnvMetadataNotSet,

    #[error("a transaction is already active")]
    TransactionActive,

    #[error("no active transaction")]
    NoActiveTransaction,

    /// The caller-supplied metadata updater rejected the merge.
    #[error("metadata updater failed: {0}")]
    Updater(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Call-channel failure, wrapped with the operation that was running.
    #[error("transport error during {context}: {message}")]
    Transport { context: String, message: String },

    /// Unclassified failure reported by the remote catalog.
    #[error("catalog error during {context}: {message}")]
    Remote { context: String, message: String },

    /// Clone or typed-extraction failure.
    #[error("decode error: {0}")]
    Decode(#[from] TypeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn not_found(kind: RecordKind, key: impl fmt::Display) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn already_exists(kind: RecordKind, key: impl fmt::Display) -> Self {
        Self::AlreadyExists {
            kind,
            key: key.to_string(),
        }
    }

    pub fn stale(kind: RecordKind, key: impl fmt::Display) -> Self {
        Self::Stale {
            kind,
            key: key.to_string(),
        }
    }

    pub fn unsupported(kind: RecordKind, operation: &'static str) -> Self {
        Self::Unsupported { kind, operation }
    }

    pub fn transport(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transport {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_not_set(&self) -> bool {
        matches!(self, Self::EnvMetadataNotSet)
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_delete_message() {
        let err = StoreError::unsupported(RecordKind::ChainMetadata, "delete");
        assert_eq!(
            err.to_string(),
            "delete operation not supported for chain metadata"
        );
    }

    #[test]
    fn sentinel_predicates() {
        assert!(StoreError::not_found(RecordKind::AddressRef, "1:Router:1.0.0:").is_not_found());
        assert!(StoreError::EnvMetadataNotSet.is_not_set());
        assert!(StoreError::stale(RecordKind::ContractMetadata, "1:0x1").is_stale());
        assert!(!StoreError::Cancelled.is_not_found());
    }

    #[test]
    fn not_found_names_kind_and_key() {
        let err = StoreError::not_found(RecordKind::ChainMetadata, 42);
        assert_eq!(err.to_string(), "no chain metadata record found for key 42");
    }
}
