use std::path::Path;

use dds_store::{DataStore, Fetcher, Filterable, GetOptions, Getter, StoreResult, UnaryStore};

use crate::collection::{
    MemoryAddressRefStore, MemoryChainMetadataStore, MemoryContractMetadataStore,
};
use crate::env::MemoryEnvMetadataStore;
use crate::snapshot::DataStoreSnapshot;

/// Exposes only the read capabilities of the wrapped store.
#[derive(Debug)]
pub struct ReadOnly<S>(S);

impl<S> ReadOnly<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self(inner)
    }
}

impl<R, S: Fetcher<R>> Fetcher<R> for ReadOnly<S> {
    fn fetch(&self) -> StoreResult<Vec<R>> {
        self.0.fetch()
    }
}

impl<K, R, S: Getter<K, R>> Getter<K, R> for ReadOnly<S> {
    fn get_with_options(&self, key: &K, options: GetOptions) -> StoreResult<R> {
        self.0.get_with_options(key, options)
    }
}

impl<R, S: Fetcher<R>> Filterable<R> for ReadOnly<S> {}

impl<R, S: UnaryStore<R>> UnaryStore<R> for ReadOnly<S> {
    fn get_with_options(&self, options: GetOptions) -> StoreResult<R> {
        self.0.get_with_options(options)
    }
}

/// A datastore that can no longer be written. Produced by
/// [`MemoryDataStore::seal`](crate::MemoryDataStore::seal) and returned by
/// catalog loads.
#[derive(Debug)]
pub struct SealedDataStore {
    addresses: ReadOnly<MemoryAddressRefStore>,
    chain_metadata: ReadOnly<MemoryChainMetadataStore>,
    contract_metadata: ReadOnly<MemoryContractMetadataStore>,
    env_metadata: ReadOnly<MemoryEnvMetadataStore>,
}

impl SealedDataStore {
    pub(crate) fn new(
        addresses: MemoryAddressRefStore,
        chain_metadata: MemoryChainMetadataStore,
        contract_metadata: MemoryContractMetadataStore,
        env_metadata: MemoryEnvMetadataStore,
    ) -> Self {
        Self {
            addresses: ReadOnly::new(addresses),
            chain_metadata: ReadOnly::new(chain_metadata),
            contract_metadata: ReadOnly::new(contract_metadata),
            env_metadata: ReadOnly::new(env_metadata),
        }
    }

    pub fn addresses(&self) -> &ReadOnly<MemoryAddressRefStore> {
        &self.addresses
    }

    pub fn chain_metadata(&self) -> &ReadOnly<MemoryChainMetadataStore> {
        &self.chain_metadata
    }

    pub fn contract_metadata(&self) -> &ReadOnly<MemoryContractMetadataStore> {
        &self.contract_metadata
    }

    pub fn env_metadata(&self) -> &ReadOnly<MemoryEnvMetadataStore> {
        &self.env_metadata
    }

    pub fn snapshot(&self) -> StoreResult<DataStoreSnapshot> {
        DataStoreSnapshot::capture(self)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        self.snapshot()?.to_json()
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl DataStore for SealedDataStore {
    type AddressRefStore = ReadOnly<MemoryAddressRefStore>;
    type ChainMetadataStore = ReadOnly<MemoryChainMetadataStore>;
    type ContractMetadataStore = ReadOnly<MemoryContractMetadataStore>;
    type EnvMetadataStore = ReadOnly<MemoryEnvMetadataStore>;

    fn addresses(&self) -> &Self::AddressRefStore {
        &self.addresses
    }

    fn chain_metadata(&self) -> &Self::ChainMetadataStore {
        &self.chain_metadata
    }

    fn contract_metadata(&self) -> &Self::ContractMetadataStore {
        &self.contract_metadata
    }

    fn env_metadata(&self) -> &Self::EnvMetadataStore {
        &self.env_metadata
    }
}
