//! Foundation types for the deployment datastore (DDS).
//!
//! This crate defines the records that deployment tooling persists and the
//! capability traits every store is parameterised over. Every other DDS crate
//! depends on `dds-types`.
//!
//! # Key Types
//!
//! - [`AddressRef`] -- a deployed contract address with its identity tuple
//! - [`ChainMetadata`] -- opaque metadata attached to a chain selector
//! - [`ContractMetadata`] -- opaque metadata attached to a deployed contract
//! - [`EnvMetadata`] -- the singleton metadata record of an environment
//! - [`LabelSet`] -- deduplicated, order-independent label collection
//! - [`Metadata`] -- opaque payload, either decoded or raw JSON
//!
//! # Record Capabilities
//!
//! Stores never depend on a concrete record type. They are bounded by the
//! composed capabilities in [`record`]: [`RecordKey`], [`PrimaryKeyHolder`],
//! [`Cloneable`] and [`Record`], which together form [`UniqueRecord`].

pub mod address_ref;
pub mod chain_metadata;
pub mod clone;
pub mod contract_metadata;
pub mod env_metadata;
pub mod error;
pub mod labels;
pub mod metadata;
pub mod record;

pub use address_ref::{parse_version, AddressRef, AddressRefKey, ContractType};
pub use chain_metadata::{ChainMetadata, ChainMetadataKey};
pub use clone::deep_clone;
pub use contract_metadata::{ContractMetadata, ContractMetadataKey};
pub use env_metadata::EnvMetadata;
pub use error::{TypeError, TypeResult};
pub use labels::LabelSet;
pub use metadata::{as_typed, Metadata};
pub use record::{
    Cloneable, MetadataRecord, PrimaryKeyHolder, Record, RecordKey, RecordKind, UniqueRecord,
};

pub use semver::Version;
