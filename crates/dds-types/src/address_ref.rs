use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::labels::LabelSet;
use crate::record::{Cloneable, PrimaryKeyHolder, Record, RecordKind};

/// Tag naming the kind of contract deployed at an address (e.g. `Router`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractType(String);

impl ContractType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContractType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ContractType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// A deployed contract address together with the tuple that identifies it.
///
/// The identity is `(chain_selector, contract_type, version, qualifier)`;
/// the address itself is payload and may change under the same key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRef {
    pub address: String,
    pub chain_selector: u64,
    #[serde(rename = "type")]
    pub contract_type: ContractType,
    pub version: Version,
    #[serde(default)]
    pub qualifier: String,
    #[serde(default)]
    pub labels: LabelSet,
}

impl AddressRef {
    pub fn new(
        address: impl Into<String>,
        chain_selector: u64,
        contract_type: impl Into<ContractType>,
        version: Version,
    ) -> Self {
        Self {
            address: address.into(),
            chain_selector,
            contract_type: contract_type.into(),
            version,
            qualifier: String::new(),
            labels: LabelSet::default(),
        }
    }

    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = qualifier.into();
        self
    }

    pub fn with_labels(mut self, labels: LabelSet) -> Self {
        self.labels = labels;
        self
    }
}

/// Parse a semantic version string, mapping failures to [`TypeError`].
pub fn parse_version(value: &str) -> TypeResult<Version> {
    Version::parse(value).map_err(|e| TypeError::InvalidVersion {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Identity of an [`AddressRef`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AddressRefKey {
    pub chain_selector: u64,
    pub contract_type: ContractType,
    pub version: Version,
    pub qualifier: String,
}

impl AddressRefKey {
    pub fn new(
        chain_selector: u64,
        contract_type: impl Into<ContractType>,
        version: Version,
        qualifier: impl Into<String>,
    ) -> Self {
        Self {
            chain_selector,
            contract_type: contract_type.into(),
            version,
            qualifier: qualifier.into(),
        }
    }
}

impl fmt::Display for AddressRefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.chain_selector, self.contract_type, self.version, self.qualifier
        )
    }
}

impl PrimaryKeyHolder<AddressRefKey> for AddressRef {
    fn primary_key(&self) -> AddressRefKey {
        AddressRefKey {
            chain_selector: self.chain_selector,
            contract_type: self.contract_type.clone(),
            version: self.version.clone(),
            qualifier: self.qualifier.clone(),
        }
    }
}

// Every field is owned and carries no opaque metadata, so a structural clone
// already shares nothing with the source.
impl Cloneable for AddressRef {
    fn deep_clone(&self) -> TypeResult<Self> {
        Ok(self.clone())
    }
}

impl Record for AddressRef {
    const KIND: RecordKind = RecordKind::AddressRef;
}
