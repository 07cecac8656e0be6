use std::fmt;

use dds_store::StoreError;
use thiserror::Error;

/// The datastore collections, in the order orchestration visits them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    AddressRefs,
    ChainMetadata,
    ContractMetadata,
    EnvMetadata,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressRefs => write!(f, "address refs"),
            Self::ChainMetadata => write!(f, "chain metadata"),
            Self::ContractMetadata => write!(f, "contract metadata"),
            Self::EnvMetadata => write!(f, "env metadata"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to load {collection} from the catalog: {source}")]
    Load {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error("failed to push {collection} to the catalog: {source}")]
    Push {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    #[error("failed to read local {collection}: {source}")]
    Local {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    /// The catalog returned records that cannot form one datastore, e.g.
    /// two rows with the same key.
    #[error("catalog contents are inconsistent: {0}")]
    Inconsistent(#[source] StoreError),

    /// Begin or commit of the catalog transaction failed.
    #[error("catalog transaction failed: {0}")]
    Transaction(#[from] StoreError),
}

impl SyncError {
    /// The collection being processed when the failure happened.
    pub fn collection(&self) -> Option<Collection> {
        match self {
            Self::Load { collection, .. }
            | Self::Push { collection, .. }
            | Self::Local { collection, .. } => Some(*collection),
            Self::Inconsistent(_) | Self::Transaction(_) => None,
        }
    }

    /// The underlying store error.
    pub fn store_error(&self) -> &StoreError {
        match self {
            Self::Load { source, .. } | Self::Push { source, .. } | Self::Local { source, .. } => {
                source
            }
            Self::Inconsistent(source) | Self::Transaction(source) => source,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

pub(crate) fn loading(collection: Collection) -> impl FnOnce(StoreError) -> SyncError {
    move |source| SyncError::Load { collection, source }
}

pub(crate) fn pushing(collection: Collection) -> impl FnOnce(StoreError) -> SyncError {
    move |source| SyncError::Push { collection, source }
}

pub(crate) fn reading(collection: Collection) -> impl FnOnce(StoreError) -> SyncError {
    move |source| SyncError::Local { collection, source }
}
