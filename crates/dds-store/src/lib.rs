//! Store capability interfaces for the deployment datastore.
//!
//! Every backend (the local in-memory store, the remote catalog) implements
//! the same small, composable contracts. Each contract exists twice:
//!
//! - [`traits`] -- plain blocking contracts used by local code
//! - [`context_traits`] -- async twins that take a [`CallContext`] and can be
//!   cancelled or bounded by a deadline
//!
//! # Contracts
//!
//! - [`Fetcher`] / [`Getter`] / [`Filterable`] -- read side of keyed collections
//! - [`MutableRefStore`] -- add/upsert/update/delete of whole address refs
//! - [`MutableStore`] -- add/upsert/update/delete of metadata records
//! - [`UnaryStore`] / [`MutableUnaryStore`] -- the env metadata singleton
//! - [`DataStore`] -- the four read-side collections bundled together
//!
//! # Design Rules
//!
//! 1. Reads return independently owned copies; mutating them never changes
//!    stored state.
//! 2. `get` returns exactly one record or [`StoreError::NotFound`].
//! 3. Filters narrow a fetched list in order; no filters returns the fetch.
//! 4. Only [`StoreError::NotFound`] and [`StoreError::EnvMetadataNotSet`]
//!    mean "empty". Every other error is a failure.

pub mod context;
pub mod context_traits;
pub mod datastore;
pub mod error;
pub mod filters;
pub mod options;
pub mod traits;

pub use context::CallContext;
pub use context_traits::{
    ContextFetcher, ContextFilterable, ContextGetter, ContextMutableRefStore, ContextMutableStore,
    ContextMutableUnaryStore, ContextUnaryStore,
};
pub use datastore::DataStore;
pub use error::{StoreError, StoreResult};
pub use options::{shallow_merge, GetOptions, MetadataUpdater, UpdateOptions};
pub use traits::{
    apply_filters, Fetcher, FilterFn, Filterable, Getter, MutableRefStore, MutableStore,
    MutableUnaryStore, UnaryStore,
};
