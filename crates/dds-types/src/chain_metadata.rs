use std::fmt;

use serde::{Deserialize, Serialize};

use crate::clone::deep_clone;
use crate::error::TypeResult;
use crate::metadata::Metadata;
use crate::record::{Cloneable, MetadataRecord, PrimaryKeyHolder, Record, RecordKind};

/// Opaque metadata attached to one chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    pub chain_selector: u64,
    pub metadata: Metadata,
}

impl ChainMetadata {
    pub fn new(chain_selector: u64, metadata: Metadata) -> Self {
        Self {
            chain_selector,
            metadata,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChainMetadataKey {
    pub chain_selector: u64,
}

impl ChainMetadataKey {
    pub fn new(chain_selector: u64) -> Self {
        Self { chain_selector }
    }
}

impl fmt::Display for ChainMetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.chain_selector)
    }
}

impl PrimaryKeyHolder<ChainMetadataKey> for ChainMetadata {
    fn primary_key(&self) -> ChainMetadataKey {
        ChainMetadataKey::new(self.chain_selector)
    }
}

impl Cloneable for ChainMetadata {
    fn deep_clone(&self) -> TypeResult<Self> {
        deep_clone(self)
    }
}

impl Record for ChainMetadata {
    const KIND: RecordKind = RecordKind::ChainMetadata;
}

impl MetadataRecord<ChainMetadataKey> for ChainMetadata {
    fn from_parts(key: &ChainMetadataKey, metadata: Metadata) -> Self {
        Self::new(key.chain_selector, metadata)
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
    fn clone_keeps_nineteen_digit_metadata() {
        let original = ChainMetadata::new(
            1,
            Metadata::from_json(r#"{"selector":5009297550715157269,"rmn":[1,2]}"#).unwrap(),
        );
        let copy = original.deep_clone().unwrap();
        assert_eq!(
            copy.metadata.to_json().unwrap(),
            r#"{"selector":5009297550715157269,"rmn":[1,2]}"#
        );
        assert_eq!(copy, original);
    }

    #[test]
    fn clone_does_not_alias_metadata() {
        let original = ChainMetadata::new(7, Metadata::from_value(json!({"tags": ["a"]})));
        let mut copy = original.deep_clone().unwrap();
        copy.metadata = Metadata::from_value(json!({"tags": ["a", "b"]}));
        assert_eq!(
            original.metadata.to_value().unwrap(),
            json!({"tags": ["a"]})
        );
    }

    #[test]
    fn from_parts_rebuilds_record() {
        let key = ChainMetadataKey::new(42);
        let record = ChainMetadata::from_parts(&key, Metadata::from_value(json!(1)));
        assert_eq!(record.primary_key(), key);
        assert_eq!(key.to_string(), "42");
    }
}
