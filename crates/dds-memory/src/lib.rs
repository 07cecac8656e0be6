//! Local transactional datastore.
//!
//! An in-process stand-in for the remote catalog, used by tests and offline
//! tooling. It implements the same capability traits as the catalog store,
//! both the blocking ones and the context-aware twins, and adds
//! begin/commit/rollback transactions across all four collections.
//!
//! # Types
//!
//! - [`MemoryDataStore`] -- the four collections plus transactions,
//!   JSON snapshots and merge
//! - [`MemoryStore`] -- one keyed collection behind a `RwLock`
//! - [`MemoryEnvMetadataStore`] -- the env metadata singleton
//! - [`SealedDataStore`] -- read-only datastore produced by [`MemoryDataStore::seal`]
//! - [`DataStoreSnapshot`] -- serializable layout of a whole datastore
//!
//! # Limitations
//!
//! Transactions are not safe to drive from several threads at once against
//! the same store. There is no version tracking; conflicts are only detected
//! by key existence.

pub mod address_refs;
pub mod collection;
pub mod context;
pub mod datastore;
pub mod env;
pub mod sealed;
pub mod snapshot;
mod transaction;

pub use collection::{
    MemoryAddressRefStore, MemoryChainMetadataStore, MemoryContractMetadataStore, MemoryStore,
};
pub use datastore::MemoryDataStore;
pub use env::MemoryEnvMetadataStore;
pub use sealed::{ReadOnly, SealedDataStore};
pub use snapshot::DataStoreSnapshot;
