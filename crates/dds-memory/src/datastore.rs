use std::path::Path;

use tracing::{debug, warn};

use dds_store::{
    DataStore, MutableRefStore, MutableStore, MutableUnaryStore, StoreError, StoreResult,
    UpdateOptions,
};
use dds_types::{EnvMetadata, PrimaryKeyHolder};

use crate::collection::{
    MemoryAddressRefStore, MemoryChainMetadataStore, MemoryContractMetadataStore,
};
use crate::env::MemoryEnvMetadataStore;
use crate::sealed::SealedDataStore;
use crate::snapshot::DataStoreSnapshot;

/// Local transactional datastore holding all four collections.
///
/// Transactions span every collection: `begin_transaction` stages a copy of
/// each, `commit_transaction` publishes them together and
/// `rollback_transaction` discards them together. Only one transaction may
/// be open at a time and it must be driven by a single writer.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    addresses: MemoryAddressRefStore,
    chain_metadata: MemoryChainMetadataStore,
    contract_metadata: MemoryContractMetadataStore,
    env_metadata: MemoryEnvMetadataStore,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn addresses(&self) -> &MemoryAddressRefStore {
        &self.addresses
    }

    pub fn chain_metadata(&self) -> &MemoryChainMetadataStore {
        &self.chain_metadata
    }

    pub fn contract_metadata(&self) -> &MemoryContractMetadataStore {
        &self.contract_metadata
    }

    pub fn env_metadata(&self) -> &MemoryEnvMetadataStore {
        &self.env_metadata
    }

    pub fn in_transaction(&self) -> StoreResult<bool> {
        self.addresses.in_transaction()
    }

    pub fn begin_transaction(&self) -> StoreResult<()> {
        if self.in_transaction()? {
            return Err(StoreError::TransactionActive);
        }
        self.addresses.begin()?;
        self.chain_metadata.begin()?;
        self.contract_metadata.begin()?;
        self.env_metadata.begin()?;
        debug!("memory transaction started");
        Ok(())
    }

    /// Publish the staged copies of all four collections, or none of them.
    ///
    /// Every collection is locked and checked before any is swapped in, so
    /// a failure leaves the whole transaction open for rollback.
    pub fn commit_transaction(&self) -> StoreResult<()> {
        let mut addresses = self.addresses.write()?;
        let mut chain_metadata = self.chain_metadata.write()?;
        let mut contract_metadata = self.contract_metadata.write()?;
        let mut env_metadata = self.env_metadata.write()?;
        let all_staged = addresses.in_transaction()
            && chain_metadata.in_transaction()
            && contract_metadata.in_transaction()
            && env_metadata.in_transaction();
        if !all_staged {
            return Err(StoreError::NoActiveTransaction);
        }
        addresses.commit()?;
        chain_metadata.commit()?;
        contract_metadata.commit()?;
        env_metadata.commit()?;
        debug!("memory transaction committed");
        Ok(())
    }

    /// Discard staged changes in every collection. All four are rolled back
    /// even if one fails; the first error is returned.
    pub fn rollback_transaction(&self) -> StoreResult<()> {
        let results = [
            self.addresses.rollback(),
            self.chain_metadata.rollback(),
            self.contract_metadata.rollback(),
            self.env_metadata.rollback(),
        ];
        debug!("memory transaction rolled back");
        results.into_iter().collect()
    }

    /// Run `body` inside a transaction.
    ///
    /// Commits when `body` returns `Ok` and rolls back when it returns `Err`.
    /// If `body` panics, the transaction is rolled back while unwinding and
    /// the panic then continues to the caller.
    pub fn with_transaction<T, E, F>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.begin_transaction()?;
        let guard = TransactionGuard {
            store: self,
            finished: false,
        };
        match body(self) {
            Ok(value) => {
                guard.commit()?;
                Ok(value)
            }
            Err(err) => {
                guard.rollback();
                Err(err)
            }
        }
    }

    /// Capture all four collections.
    pub fn snapshot(&self) -> StoreResult<DataStoreSnapshot> {
        DataStoreSnapshot::capture(self)
    }

    /// Build a store holding exactly the records of `snapshot`.
    pub fn from_snapshot(snapshot: DataStoreSnapshot) -> StoreResult<Self> {
        Ok(Self {
            addresses: MemoryAddressRefStore::from_records(snapshot.address_refs)?,
            chain_metadata: MemoryChainMetadataStore::from_records(snapshot.chain_metadata)?,
            contract_metadata: MemoryContractMetadataStore::from_records(
                snapshot.contract_metadata,
            )?,
            env_metadata: MemoryEnvMetadataStore::with_record(
                snapshot.env_metadata.map(EnvMetadata::new),
            ),
        })
    }

    pub fn to_json(&self) -> StoreResult<String> {
        self.snapshot()?.to_json()
    }

    pub fn from_json(text: &str) -> StoreResult<Self> {
        Self::from_snapshot(DataStoreSnapshot::from_json(text)?)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Upsert every record of `other` into this store, all or nothing.
    /// Env metadata is replaced only when `other` has one.
    pub fn merge<D: DataStore>(&self, other: &D) -> StoreResult<()> {
        let incoming = DataStoreSnapshot::capture(other)?;
        self.with_transaction(|store| {
            for record in incoming.address_refs {
                MutableRefStore::upsert(&store.addresses, record)?;
            }
            for record in incoming.chain_metadata {
                let key = record.primary_key();
                MutableStore::upsert(
                    &store.chain_metadata,
                    &key,
                    record.metadata,
                    UpdateOptions::new(),
                )?;
            }
            for record in incoming.contract_metadata {
                let key = record.primary_key();
                MutableStore::upsert(
                    &store.contract_metadata,
                    &key,
                    record.metadata,
                    UpdateOptions::new(),
                )?;
            }
            if let Some(metadata) = incoming.env_metadata {
                MutableUnaryStore::set(&store.env_metadata, metadata, UpdateOptions::new())?;
            }
            Ok(())
        })
    }

    /// Make the store read-only.
    pub fn seal(self) -> SealedDataStore {
        SealedDataStore::new(
            self.addresses,
            self.chain_metadata,
            self.contract_metadata,
            self.env_metadata,
        )
    }
}

impl DataStore for MemoryDataStore {
    type AddressRefStore = MemoryAddressRefStore;
    type ChainMetadataStore = MemoryChainMetadataStore;
    type ContractMetadataStore = MemoryContractMetadataStore;
    type EnvMetadataStore = MemoryEnvMetadataStore;

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

/// Rolls the transaction back on drop unless it was finished explicitly.
struct TransactionGuard<'a> {
    store: &'a MemoryDataStore,
    finished: bool,
}

impl TransactionGuard<'_> {
    fn commit(mut self) -> StoreResult<()> {
        // A failed commit leaves `finished` unset so drop rolls back.
        self.store.commit_transaction()?;
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self) {
        self.finished = true;
        if let Err(e) = self.store.rollback_transaction() {
            warn!(error = %e, "memory transaction rollback failed");
        }
    }
}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            warn!("rolling back memory transaction during unwind");
        }
        if let Err(e) = self.store.rollback_transaction() {
            warn!(error = %e, "memory transaction rollback failed");
        }
    }
}
