//! Blocking capability traits.
//!
//! Backends implement only the capabilities they offer; orchestration code
//! states the exact combination it needs in its bounds.

use dds_types::Metadata;

use crate::error::StoreResult;
use crate::options::{GetOptions, UpdateOptions};

/// A narrowing step over a fetched record list.
pub type FilterFn<R> = Box<dyn Fn(Vec<R>) -> Vec<R> + Send + Sync>;

/// Apply `filters` to `records` in order. No filters returns `records`.
pub fn apply_filters<R>(records: Vec<R>, filters: &[FilterFn<R>]) -> Vec<R> {
    filters.iter().fold(records, |acc, filter| filter(acc))
}

/// Returns every record of a collection.
///
/// The result is a fresh copy: mutating it never changes stored state.
pub trait Fetcher<R>: Send + Sync {
    fn fetch(&self) -> StoreResult<Vec<R>>;
}

/// Looks up the unique record for a key.
pub trait Getter<K, R>: Send + Sync {
    /// Returns the record whose key equals `key`, or `NotFound`.
    fn get_with_options(&self, key: &K, options: GetOptions) -> StoreResult<R>;

    fn get(&self, key: &K) -> StoreResult<R> {
        self.get_with_options(key, GetOptions::default())
    }
}

/// Fetch followed by sequential narrowing.
pub trait Filterable<R>: Fetcher<R> {
    fn filter(&self, filters: &[FilterFn<R>]) -> StoreResult<Vec<R>> {
        Ok(apply_filters(self.fetch()?, filters))
    }
}

/// Mutation of records that are written whole (address refs).
pub trait MutableRefStore<K, R>: Send + Sync {
    /// Fails with `AlreadyExists` if the key is present.
    fn add(&self, record: R) -> StoreResult<()>;

    /// Add if absent, replace if present. Never fails on existence.
    fn upsert(&self, record: R) -> StoreResult<()>;

    /// Fails with `NotFound` if the key is absent.
    fn update(&self, record: R) -> StoreResult<()>;

    fn delete(&self, key: &K) -> StoreResult<()>;
}

/// Mutation of metadata records addressed by key.
pub trait MutableStore<K, R>: Send + Sync {
    /// Fails with `AlreadyExists` if the key is present.
    fn add(&self, record: R) -> StoreResult<()>;

    /// Write `metadata` under `key`, inserting when absent. The updater in
    /// `options` merges with the stored payload when one exists.
    fn upsert(&self, key: &K, metadata: Metadata, options: UpdateOptions) -> StoreResult<()>;

    /// Like `upsert`, but fails with `NotFound` when the key is absent and
    /// leaves storage untouched.
    fn update(&self, key: &K, metadata: Metadata, options: UpdateOptions) -> StoreResult<()>;

    fn delete(&self, key: &K) -> StoreResult<()>;
}

/// Read side of a singleton record.
pub trait UnaryStore<R>: Send + Sync {
    /// Fails with `EnvMetadataNotSet` if nothing was ever written.
    fn get_with_options(&self, options: GetOptions) -> StoreResult<R>;

    fn get(&self) -> StoreResult<R> {
        self.get_with_options(GetOptions::default())
    }
}

/// Write side of a singleton record.
pub trait MutableUnaryStore<R>: UnaryStore<R> {
    /// Insert or replace the singleton.
    fn set(&self, metadata: Metadata, options: UpdateOptions) -> StoreResult<()>;
}
