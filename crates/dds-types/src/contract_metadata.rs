use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clone::deep_clone;
use crate::error::TypeResult;
use crate::metadata::Metadata;
use crate::record::{Cloneable, MetadataRecord, PrimaryKeyHolder, Record, RecordKind};

/// Opaque metadata attached to one deployed contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractMetadata {
    pub address: String,
    pub chain_selector: u64,
    pub metadata: Metadata,
}

impl ContractMetadata {
    pub fn new(address: impl Into<String>, chain_selector: u64, metadata: Metadata) -> Self {
        Self {
            address: address.into(),
            chain_selector,
            metadata,
        }
    }
}

/// Identity of a [`ContractMetadata`]: `(chain_selector, address)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContractMetadataKey {
    pub chain_selector: u64,
    pub address: String,
}

impl ContractMetadataKey {
    pub fn new(chain_selector: u64, address: impl Into<String>) -> Self {
        Self {
            chain_selector,
            address: address.into(),
        }
    }
}

impl fmt::Display for ContractMetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain_selector, self.address)
    }
}

impl PrimaryKeyHolder<ContractMetadataKey> for ContractMetadata {
    fn primary_key(&self) -> ContractMetadataKey {
        ContractMetadataKey::new(self.chain_selector, self.address.clone())
    }
}

impl Cloneable for ContractMetadata {
    fn deep_clone(&self) -> TypeResult<Self> {
        deep_clone(self)
    }
}

impl Record for ContractMetadata {
    const KIND: RecordKind = RecordKind::ContractMetadata;
}

impl MetadataRecord<ContractMetadataKey> for ContractMetadata {
    fn from_parts(key: &ContractMetadataKey, metadata: Metadata) -> Self {
        Self::new(key.address.clone(), key.chain_selector, metadata)
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_display() {
        let record = ContractMetadata::new("0xfeed", 16015286601757825753, Metadata::null());
        assert_eq!(
            record.primary_key().to_string(),
            "16015286601757825753:0xfeed"
        );
    }

    #[test]
    fn json_field_names() {
        let record = ContractMetadata::new("0x1", 3, Metadata::from_value(json!({"owner": "0x2"})));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["chainSelector"], 3);
        assert_eq!(json["metadata"]["owner"], "0x2");
    }

    #[test]
    fn deep_clone_roundtrip() {
        let record = ContractMetadata::new(
            "0x1",
            3,
            Metadata::from_json(r#"{"supply":123456789012345678901234567890}"#).unwrap(),
        );
        let copy = record.deep_clone().unwrap();
        assert!(copy.metadata.is_raw());
        assert_eq!(copy, record);
    }
}
