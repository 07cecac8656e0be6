use dds_types::{
    AddressRef, AddressRefKey, ChainMetadata, ChainMetadataKey, ContractMetadata,
    ContractMetadataKey, EnvMetadata,
};

use crate::traits::{Fetcher, Filterable, Getter, UnaryStore};

/// Read access to all four collections of a datastore.
///
/// Orchestration that only reads local state (sync, merge) is written
/// against this trait, so it works the same for a mutable store and for a
/// sealed one.
pub trait DataStore: Send + Sync {
    type AddressRefStore: Fetcher<AddressRef>
        + Getter<AddressRefKey, AddressRef>
        + Filterable<AddressRef>;
    type ChainMetadataStore: Fetcher<ChainMetadata>
        + Getter<ChainMetadataKey, ChainMetadata>
        + Filterable<ChainMetadata>;
    type ContractMetadataStore: Fetcher<ContractMetadata>
        + Getter<ContractMetadataKey, ContractMetadata>
        + Filterable<ContractMetadata>;
    type EnvMetadataStore: UnaryStore<EnvMetadata>;

    fn addresses(&self) -> &Self::AddressRefStore;

    fn chain_metadata(&self) -> &Self::ChainMetadataStore;

    fn contract_metadata(&self) -> &Self::ContractMetadataStore;

    fn env_metadata(&self) -> &Self::EnvMetadataStore;
}
