//! Composable record capabilities.
//!
//! Stores are generic over a key type `K` and a record type `R`. Instead of
//! one monolithic record trait, each capability is its own trait and the
//! bounds are composed where they are needed:
//!
//! - [`RecordKey`]: comparable-by-key identity with a stable string form
//! - [`PrimaryKeyHolder`]: derive the key from a record's identity fields
//! - [`Cloneable`]: precision-preserving deep copy
//! - [`Record`]: static [`RecordKind`] used in error messages and logs
//!
//! [`UniqueRecord`] is the conjunction a keyed collection requires, and
//! [`MetadataRecord`] adds the key/metadata split used by metadata stores.

use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::TypeResult;
use crate::metadata::Metadata;

/// The four entity kinds a datastore holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    AddressRef,
    ChainMetadata,
    ContractMetadata,
    EnvMetadata,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressRef => write!(f, "address ref"),
            Self::ChainMetadata => write!(f, "chain metadata"),
            Self::ContractMetadata => write!(f, "contract metadata"),
            Self::EnvMetadata => write!(f, "env metadata"),
        }
    }
}

/// A record identity. The `Display` form is the stable string used as the
/// version-cache key and in error messages.
pub trait RecordKey:
    Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static
{
}

impl<T> RecordKey for T where
    T: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static
{
}

/// Derives a record's key from its identity fields only.
pub trait PrimaryKeyHolder<K: RecordKey> {
    fn primary_key(&self) -> K;
}

/// A deep copy that shares nothing with the source and keeps every number in
/// nested metadata exact.
pub trait Cloneable: Sized {
    fn deep_clone(&self) -> TypeResult<Self>;
}

/// Static identification of a record type.
pub trait Record {
    const KIND: RecordKind;
}

/// Everything a keyed collection needs from its records.
pub trait UniqueRecord<K: RecordKey>:
    PrimaryKeyHolder<K> + Cloneable + Record + Clone + fmt::Debug + Send + Sync + 'static
{
}

impl<K, R> UniqueRecord<K> for R
where
    K: RecordKey,
    R: PrimaryKeyHolder<K> + Cloneable + Record + Clone + fmt::Debug + Send + Sync + 'static,
{
}

/// A keyed record whose only non-key payload is opaque metadata.
///
/// Metadata stores accept `(key, metadata)` pairs on update and upsert and
/// rebuild the record with [`MetadataRecord::from_parts`].
pub trait MetadataRecord<K: RecordKey>: UniqueRecord<K> {
    fn from_parts(key: &K, metadata: Metadata) -> Self;

    fn metadata(&self) -> &Metadata;
}
