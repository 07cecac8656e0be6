//! Keyed in-memory collections.
//!
//! [`MemoryStore`] keeps one collection's records in a `Vec` behind a
//! `RwLock`: reads take the shared lock, writes the exclusive lock. Reads
//! hand out deep clones, so callers never alias stored state.

use std::marker::PhantomData;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dds_store::{
    Fetcher, Filterable, GetOptions, Getter, MutableStore, StoreError, StoreResult,
    UpdateOptions,
};
use dds_types::{
    AddressRef, AddressRefKey, ChainMetadata, ChainMetadataKey, ContractMetadata,
    ContractMetadataKey, Metadata, MetadataRecord, RecordKey, UniqueRecord,
};

use crate::transaction::TxState;

/// One keyed collection of records.
///
/// Not safe for concurrent transactions: a single writer drives
/// begin/commit/rollback at a time.
pub struct MemoryStore<K, R> {
    state: RwLock<TxState<Vec<R>>>,
    _key: PhantomData<fn() -> K>,
}

pub type MemoryAddressRefStore = MemoryStore<AddressRefKey, AddressRef>;
pub type MemoryChainMetadataStore = MemoryStore<ChainMetadataKey, ChainMetadata>;
pub type MemoryContractMetadataStore = MemoryStore<ContractMetadataKey, ContractMetadata>;

impl<K: RecordKey, R: UniqueRecord<K>> MemoryStore<K, R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Build a store from existing records, rejecting duplicate keys.
    pub fn from_records(records: Vec<R>) -> StoreResult<Self> {
        let mut unique: Vec<R> = Vec::with_capacity(records.len());
        for record in records {
            insert(&mut unique, record)?;
        }
        Ok(Self::with_records(unique))
    }

    fn with_records(records: Vec<R>) -> Self {
        Self {
            state: RwLock::new(TxState::new(records)),
            _key: PhantomData,
        }
    }

    /// Number of visible records.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.visible(GetOptions::default()).len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    pub(crate) fn read(&self) -> StoreResult<RwLockReadGuard<'_, TxState<Vec<R>>>> {
        self.state
            .read()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    pub(crate) fn write(&self) -> StoreResult<RwLockWriteGuard<'_, TxState<Vec<R>>>> {
        self.state
            .write()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    pub(crate) fn in_transaction(&self) -> StoreResult<bool> {
        Ok(self.read()?.in_transaction())
    }

    pub(crate) fn begin(&self) -> StoreResult<()> {
        self.write()?.begin()
    }

    /// Rollback also recovers a lock poisoned by a panicking writer: the
    /// staged copy it may have left half-written is discarded.
    pub(crate) fn rollback(&self) -> StoreResult<()> {
        let result = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .rollback();
        self.state.clear_poison();
        result
    }

    pub(crate) fn add_record(&self, record: R) -> StoreResult<()> {
        let mut state = self.write()?;
        insert(state.writable(), record)
    }

    pub(crate) fn delete_record(&self, key: &K) -> StoreResult<()> {
        let mut state = self.write()?;
        let records = state.writable();
        match position(records, key) {
            Some(index) => {
                records.remove(index);
                Ok(())
            }
            None => Err(StoreError::not_found(R::KIND, key)),
        }
    }
}

impl<K: RecordKey, R: UniqueRecord<K>> Default for MemoryStore<K, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, R> std::fmt::Debug for MemoryStore<K, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").finish_non_exhaustive()
    }
}

pub(crate) fn position<K: RecordKey, R: UniqueRecord<K>>(records: &[R], key: &K) -> Option<usize> {
    records.iter().position(|r| r.primary_key() == *key)
}

pub(crate) fn insert<K: RecordKey, R: UniqueRecord<K>>(
    records: &mut Vec<R>,
    record: R,
) -> StoreResult<()> {
    let key = record.primary_key();
    if position(records, &key).is_some() {
        return Err(StoreError::already_exists(R::KIND, key));
    }
    records.push(record);
    Ok(())
}

impl<K: RecordKey, R: UniqueRecord<K>> Fetcher<R> for MemoryStore<K, R> {
    fn fetch(&self) -> StoreResult<Vec<R>> {
        let state = self.read()?;
        state
            .visible(GetOptions::default())
            .iter()
            .map(|r| r.deep_clone().map_err(StoreError::from))
            .collect()
    }
}

impl<K: RecordKey, R: UniqueRecord<K>> Getter<K, R> for MemoryStore<K, R> {
    fn get_with_options(&self, key: &K, options: GetOptions) -> StoreResult<R> {
        let state = self.read()?;
        let records = state.visible(options);
        match position(records, key) {
            Some(index) => Ok(records[index].deep_clone()?),
            None => Err(StoreError::not_found(R::KIND, key)),
        }
    }
}

impl<K: RecordKey, R: UniqueRecord<K>> Filterable<R> for MemoryStore<K, R> {}

impl<K, R> MutableStore<K, R> for MemoryStore<K, R>
where
    K: RecordKey,
    R: MetadataRecord<K>,
{
    fn add(&self, record: R) -> StoreResult<()> {
        self.add_record(record)
    }

    fn upsert(&self, key: &K, metadata: Metadata, options: UpdateOptions) -> StoreResult<()> {
        let mut state = self.write()?;
        let records = state.writable();
        match position(records, key) {
            Some(index) => {
                let merged = options.apply(Some(records[index].metadata()), metadata)?;
                records[index] = R::from_parts(key, merged);
            }
            None => records.push(R::from_parts(key, options.apply(None, metadata)?)),
        }
        Ok(())
    }

    fn update(&self, key: &K, metadata: Metadata, options: UpdateOptions) -> StoreResult<()> {
        let mut state = self.write()?;
        let records = state.writable();
        let index = position(records, key).ok_or_else(|| StoreError::not_found(R::KIND, key))?;
        let merged = options.apply(Some(records[index].metadata()), metadata)?;
        records[index] = R::from_parts(key, merged);
        Ok(())
    }

    fn delete(&self, key: &K) -> StoreResult<()> {
        self.delete_record(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dds_store::shallow_merge;
    use serde_json::json;

    fn chain(selector: u64, value: serde_json::Value) -> ChainMetadata {
        ChainMetadata::new(selector, Metadata::from_value(value))
    }

    #[test]
    fn add_then_get_returns_equal_record() {
        let store = MemoryChainMetadataStore::new();
        let record = chain(1, json!({"router": "0x1"}));
        store.add(record.clone()).unwrap();
        assert_eq!(store.get(&ChainMetadataKey::new(1)).unwrap(), record);
    }

    #[test]
    fn add_duplicate_fails() {
        let store = MemoryChainMetadataStore::new();
        store.add(chain(1, json!(1))).unwrap();
        let err = store.add(chain(1, json!(2))).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn chain_metadata_lifecycle() {
        let store = MemoryChainMetadataStore::new();
        let key = ChainMetadataKey::new(1);
        store.add(chain(1, json!({"v": 1}))).unwrap();
        store
            .update(&key, Metadata::from_value(json!({"v": 2})), UpdateOptions::new())
            .unwrap();
        assert_eq!(
            store.get(&key).unwrap().metadata.to_value().unwrap(),
            json!({"v": 2})
        );
        store.delete(&key).unwrap();
        assert!(store.get(&key).unwrap_err().is_not_found());
        assert!(store.delete(&key).unwrap_err().is_not_found());
    }

    #[test]
    fn update_absent_fails_without_mutation() {
        let store = MemoryChainMetadataStore::new();
        store.add(chain(1, json!(1))).unwrap();
        let before = store.fetch().unwrap();
        let err = store
            .update(&ChainMetadataKey::new(2), Metadata::null(), UpdateOptions::new())
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.fetch().unwrap(), before);
    }

    #[test]
    fn upsert_is_idempotent() {
        let once = MemoryChainMetadataStore::new();
        let twice = MemoryChainMetadataStore::new();
        let key = ChainMetadataKey::new(9);
        let metadata = Metadata::from_value(json!({"a": [1, 2]}));

        once.upsert(&key, metadata.clone(), UpdateOptions::new()).unwrap();
        twice.upsert(&key, metadata.clone(), UpdateOptions::new()).unwrap();
        twice.upsert(&key, metadata, UpdateOptions::new()).unwrap();

        assert_eq!(once.fetch().unwrap(), twice.fetch().unwrap());
        assert_eq!(twice.len().unwrap(), 1);
    }

    #[test]
    fn upsert_applies_updater_only_when_present() {
        let store = MemoryContractMetadataStore::new();
        let key = ContractMetadataKey::new(1, "0xa");
        let options = UpdateOptions::new().with_updater(shallow_merge);

        store
            .upsert(&key, Metadata::from_value(json!({"a": 1})), options.clone())
            .unwrap();
        store
            .upsert(&key, Metadata::from_value(json!({"b": 2})), options)
            .unwrap();

        let stored = store.get(&key).unwrap();
        assert_eq!(stored.metadata.to_value().unwrap(), json!({"a": 1, "b": 2}));
        assert_eq!(stored.address, "0xa");
    }

    #[test]
    fn fetch_returns_independent_copies() {
        let store = MemoryChainMetadataStore::new();
        store.add(chain(1, json!({"n": 1}))).unwrap();
        let mut fetched = store.fetch().unwrap();
        fetched[0].metadata = Metadata::from_value(json!({"n": 2}));
        fetched.clear();
        assert_eq!(
            store.get(&ChainMetadataKey::new(1)).unwrap().metadata.to_value().unwrap(),
            json!({"n": 1})
        );
    }

    #[test]
    fn fetch_preserves_large_integers() {
        let store = MemoryChainMetadataStore::new();
        store
            .add(ChainMetadata::new(
                1,
                Metadata::from_json(r#"{"selector":5009297550715157269}"#).unwrap(),
            ))
            .unwrap();
        let fetched = store.fetch().unwrap();
        assert_eq!(
            fetched[0].metadata.to_json().unwrap(),
            r#"{"selector":5009297550715157269}"#
        );
    }

    #[test]
    fn from_records_rejects_duplicates() {
        let err = MemoryChainMetadataStore::from_records(vec![
            chain(1, json!(1)),
            chain(1, json!(2)),
        ])
        .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn get_outside_transaction_sees_committed() {
        let store = MemoryChainMetadataStore::new();
        store.add(chain(1, json!("old"))).unwrap();
        store.begin().unwrap();
        store
            .upsert(
                &ChainMetadataKey::new(1),
                Metadata::from_value(json!("new")),
                UpdateOptions::new(),
            )
            .unwrap();

        let key = ChainMetadataKey::new(1);
        let staged = store.get(&key).unwrap();
        let committed = store
            .get_with_options(&key, GetOptions::outside_transaction())
            .unwrap();
        assert_eq!(staged.metadata.to_value().unwrap(), json!("new"));
        assert_eq!(committed.metadata.to_value().unwrap(), json!("old"));

        store.rollback().unwrap();
        assert_eq!(
            store.get(&key).unwrap().metadata.to_value().unwrap(),
            json!("old")
        );
    }
}
