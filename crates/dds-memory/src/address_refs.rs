use dds_store::{MutableRefStore, StoreError, StoreResult};
use dds_types::{AddressRef, AddressRefKey, PrimaryKeyHolder, Record};

use crate::collection::{insert, position, MemoryAddressRefStore};

impl MutableRefStore<AddressRefKey, AddressRef> for MemoryAddressRefStore {
    fn add(&self, record: AddressRef) -> StoreResult<()> {
        let mut state = self.write()?;
        insert(state.writable(), record)
    }

    fn upsert(&self, record: AddressRef) -> StoreResult<()> {
        let mut state = self.write()?;
        let records = state.writable();
        match position(records, &record.primary_key()) {
            Some(index) => records[index] = record,
            None => records.push(record),
        }
        Ok(())
    }

    fn update(&self, record: AddressRef) -> StoreResult<()> {
        let mut state = self.write()?;
        let records = state.writable();
        let key = record.primary_key();
        match position(records, &key) {
            Some(index) => {
                records[index] = record;
                Ok(())
            }
            None => Err(StoreError::not_found(AddressRef::KIND, key)),
        }
    }

    fn delete(&self, key: &AddressRefKey) -> StoreResult<()> {
        self.delete_record(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dds_store::{filters, Fetcher, Filterable, Getter};
    use dds_types::{LabelSet, Version};

    fn router(address: &str) -> AddressRef {
        AddressRef::new(address, 1, "Router", Version::new(1, 2, 0))
            .with_labels(LabelSet::new(["b", "a"]))
    }

    #[test]
    fn add_get_roundtrip() {
        let store = MemoryAddressRefStore::new();
        let record = router("0x1");
        store.add(record.clone()).unwrap();
        assert_eq!(store.get(&record.primary_key()).unwrap(), record);
    }

    #[test]
    fn same_key_different_address_is_duplicate() {
        let store = MemoryAddressRefStore::new();
        store.add(router("0x1")).unwrap();
        let err = store.add(router("0x2")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[test]
    fn upsert_replaces_payload_keeping_identity() {
        let store = MemoryAddressRefStore::new();
        store.upsert(router("0x1")).unwrap();
        store.upsert(router("0x2")).unwrap();
        let all = store.fetch().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].address, "0x2");
    }

    #[test]
    fn update_absent_is_not_found() {
        let store = MemoryAddressRefStore::new();
        let err = store.update(router("0x1")).unwrap_err();
        assert!(err.is_not_found());
        assert!(store.fetch().unwrap().is_empty());
    }

    #[test]
    fn delete_removes_record() {
        let store = MemoryAddressRefStore::new();
        let record = router("0x1");
        store.add(record.clone()).unwrap();
        store.delete(&record.primary_key()).unwrap();
        assert!(store.get(&record.primary_key()).unwrap_err().is_not_found());
    }

    #[test]
    fn filter_by_address_and_chain() {
        let store = MemoryAddressRefStore::new();
        store.add(router("0x1")).unwrap();
        store
            .add(router("0x1").with_qualifier("secondary"))
            .unwrap();
        store
            .add(AddressRef::new("0x9", 2, "OnRamp", Version::new(1, 0, 0)))
            .unwrap();

        assert_eq!(store.filter(&[]).unwrap(), store.fetch().unwrap());
        let hits = store
            .filter(&[filters::address_ref_by_address_and_chain("0x1", 1)])
            .unwrap();
        assert_eq!(hits.len(), 2);
    }
}
