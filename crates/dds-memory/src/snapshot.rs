use serde::{Deserialize, Serialize};

use dds_store::{DataStore, Fetcher, StoreError, StoreResult, UnaryStore};
use dds_types::{
    AddressRef, ChainMetadata, ContractMetadata, Metadata, PrimaryKeyHolder, TypeError,
};

/// JSON layout of a whole datastore, used for fixtures and diffing.
///
/// Metadata payloads, env metadata included, are embedded as JSON
/// sub-documents rather than as encoded strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStoreSnapshot {
    #[serde(default)]
    pub address_refs: Vec<AddressRef>,
    #[serde(default)]
    pub chain_metadata: Vec<ChainMetadata>,
    #[serde(default)]
    pub contract_metadata: Vec<ContractMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_metadata: Option<Metadata>,
}

impl DataStoreSnapshot {
    /// Read every collection of `store`.
    pub fn capture<D: DataStore>(store: &D) -> StoreResult<Self> {
        let env_metadata = match store.env_metadata().get() {
            Ok(record) => Some(record.metadata),
            Err(e) if e.is_not_set() => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            address_refs: store.addresses().fetch()?,
            chain_metadata: store.chain_metadata().fetch()?,
            contract_metadata: store.contract_metadata().fetch()?,
            env_metadata,
        })
    }

    /// Order every collection by key so two snapshots of the same data
    /// compare equal regardless of insertion order.
    pub fn sorted(mut self) -> Self {
        self.address_refs
            .sort_by_cached_key(|r| r.primary_key().to_string());
        self.chain_metadata.sort_by_key(|r| r.chain_selector);
        self.contract_metadata
            .sort_by(|a, b| (a.chain_selector, &a.address).cmp(&(b.chain_selector, &b.address)));
        self
    }

    pub fn record_count(&self) -> usize {
        self.address_refs.len()
            + self.chain_metadata.len()
            + self.contract_metadata.len()
            + usize::from(self.env_metadata.is_some())
    }

    pub fn to_json(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Decode(TypeError::Serialization(e.to_string())))
    }

    pub fn from_json(text: &str) -> StoreResult<Self> {
        serde_json::from_str(text).map_err(|e| StoreError::Decode(TypeError::Decode(e.to_string())))
    }
}
