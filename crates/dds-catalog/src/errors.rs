//! Mapping of catalog failure text to typed errors.
//!
//! The catalog reports failures as free text. The phrases below are the only
//! ones the client recognizes; anything else becomes [`StoreError::Remote`].
//! All matching lives in [`classify_remote_error`].
//!
//! TODO: replace substring matching with structured status codes once the
//! catalog service returns them.

use std::fmt;

use dds_store::StoreError;
use dds_types::RecordKind;

/// Find matched nothing.
pub const NO_RECORDS_FOUND: &str = "No records found";
/// Update targeted a record that does not exist.
pub const NO_RECORD_TO_UPDATE: &str = "no record found to update for";
/// The expected row version did not match the stored one.
pub const INCORRECT_ROW_VERSION: &str = "incorrect row version";

/// The kind of catalog call that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoteOperation {
    Find,
    Edit,
    Transaction,
}

impl fmt::Display for RemoteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Find => write!(f, "find"),
            Self::Edit => write!(f, "edit"),
            Self::Transaction => write!(f, "transaction"),
        }
    }
}

/// Turn a catalog failure message into a [`StoreError`].
///
/// - find + `"No records found"`: `NotFound`, or `EnvMetadataNotSet` for env
///   metadata
/// - edit + `"no record found to update for"`: `NotFound`
/// - edit + `"incorrect row version"`: `Stale`
/// - anything else: `Remote`, carrying the operation and the original text
pub fn classify_remote_error(
    kind: RecordKind,
    key: &str,
    operation: RemoteOperation,
    message: &str,
) -> StoreError {
    match operation {
        RemoteOperation::Find if message.contains(NO_RECORDS_FOUND) => match kind {
            RecordKind::EnvMetadata => StoreError::EnvMetadataNotSet,
            _ => StoreError::not_found(kind, key),
        },
        RemoteOperation::Edit if message.contains(NO_RECORD_TO_UPDATE) => {
            StoreError::not_found(kind, key)
        }
        RemoteOperation::Edit if message.contains(INCORRECT_ROW_VERSION) => {
            StoreError::stale(kind, key)
        }
        _ => StoreError::Remote {
            context: format!("{operation} {kind} {key}"),
            message: message.to_string(),
        },
    }
}
