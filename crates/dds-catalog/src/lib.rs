//! Remote catalog backend for the deployment datastore.
//!
//! Implements the context-aware store contracts of `dds-store` against a
//! catalog service reached through a `dds-protocol` call channel. Every
//! operation is exactly one request/response exchange, bounded by the
//! caller's [`CallContext`](dds_store::CallContext) and the configured
//! request timeout.
//!
//! # Concurrency
//!
//! Writes use optimistic concurrency. Each store instance keeps a
//! [`VersionCache`] of the last row version it observed per key; finds
//! refresh it, edits send it and advance it by one on success. A write
//! against a record that changed since it was last observed fails with
//! [`StoreError::Stale`](dds_store::StoreError::Stale).
//!
//! Versions cached inside a transaction are staged until
//! [`CatalogDataStore`] commits it, and dropped when it rolls back.
//!
//! # Key Types
//!
//! - [`CatalogDataStore`]: the four catalog collections and their shared transaction
//! - [`CatalogStore`]: one keyed collection, generic over a [`CatalogEntity`]
//! - [`CatalogEnvMetadataStore`]: the env metadata singleton
//! - [`CatalogClient`]: request dispatch and transaction id tracking
//! - [`CatalogConfig`]: domain, environment and request timeout

pub mod client;
pub mod config;
pub mod datastore;
pub mod entity;
pub mod env_store;
pub mod errors;
pub mod store;
pub mod version_cache;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::CatalogClient;
pub use config::{CatalogConfig, ConfigError};
pub use datastore::CatalogDataStore;
pub use entity::{AddressRefEntity, CatalogEntity, ChainMetadataEntity, ContractMetadataEntity};
pub use env_store::CatalogEnvMetadataStore;
pub use errors::{classify_remote_error, RemoteOperation};
pub use store::{
    CatalogAddressRefStore, CatalogChainMetadataStore, CatalogContractMetadataStore, CatalogStore,
};
pub use version_cache::VersionCache;
