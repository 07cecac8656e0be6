use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dds_store::{
    GetOptions, MutableUnaryStore, StoreError, StoreResult, UnaryStore, UpdateOptions,
};
use dds_types::{Cloneable, EnvMetadata, Metadata};

use crate::transaction::TxState;

/// The env metadata singleton.
#[derive(Debug, Default)]
pub struct MemoryEnvMetadataStore {
    state: RwLock<TxState<Option<EnvMetadata>>>,
}

impl MemoryEnvMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: Option<EnvMetadata>) -> Self {
        Self {
            state: RwLock::new(TxState::new(record)),
        }
    }

    pub fn is_set(&self) -> StoreResult<bool> {
        Ok(self.read()?.visible(GetOptions::default()).is_some())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, TxState<Option<EnvMetadata>>>> {
        self.state
            .read()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    pub(crate) fn write(
        &self,
    ) -> StoreResult<RwLockWriteGuard<'_, TxState<Option<EnvMetadata>>>> {
        self.state
            .write()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {e}")))
    }

    pub(crate) fn begin(&self) -> StoreResult<()> {
        self.write()?.begin()
    }

    pub(crate) fn rollback(&self) -> StoreResult<()> {
        let result = self
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .rollback();
        self.state.clear_poison();
        result
    }
}

impl UnaryStore<EnvMetadata> for MemoryEnvMetadataStore {
    fn get_with_options(&self, options: GetOptions) -> StoreResult<EnvMetadata> {
        let state = self.read()?;
        match state.visible(options) {
            Some(record) => Ok(record.deep_clone()?),
            None => Err(StoreError::EnvMetadataNotSet),
        }
    }
}

impl MutableUnaryStore<EnvMetadata> for MemoryEnvMetadataStore {
    fn set(&self, metadata: Metadata, options: UpdateOptions) -> StoreResult<()> {
        let mut state = self.write()?;
        let slot = state.writable();
        let merged = options.apply(slot.as_ref().map(|r| &r.metadata), metadata)?;
        *slot = Some(EnvMetadata::new(merged));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_before_set_is_not_set() {
        let store = MemoryEnvMetadataStore::new();
        assert!(store.get().unwrap_err().is_not_set());
        assert!(!store.is_set().unwrap());
    }

    #[test]
    fn set_inserts_then_replaces() {
        let store = MemoryEnvMetadataStore::new();
        store
            .set(Metadata::from_value(json!({"a": 1})), UpdateOptions::new())
            .unwrap();
        store
            .set(Metadata::from_value(json!({"b": 2})), UpdateOptions::new())
            .unwrap();
        assert_eq!(
            store.get().unwrap().metadata.to_value().unwrap(),
            json!({"b": 2})
        );
    }

    #[test]
    fn set_with_updater_merges() {
        let store = MemoryEnvMetadataStore::new();
        let options = UpdateOptions::new().with_updater(dds_store::shallow_merge);
        store
            .set(Metadata::from_value(json!({"a": 1})), options.clone())
            .unwrap();
        store
            .set(Metadata::from_value(json!({"b": 2})), options)
            .unwrap();
        assert_eq!(
            store.get().unwrap().metadata.to_value().unwrap(),
            json!({"a": 1, "b": 2})
        );
    }

    #[test]
    fn transactional_set_visible_only_inside() {
        let store = MemoryEnvMetadataStore::new();
        store.begin().unwrap();
        store.set(Metadata::from_value(json!(1)), UpdateOptions::new()).unwrap();
        assert!(store.get().is_ok());
        assert!(store
            .get_with_options(GetOptions::outside_transaction())
            .unwrap_err()
            .is_not_set());
        store.rollback().unwrap();
        assert!(store.get().unwrap_err().is_not_set());
    }
}
