use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Existence policy of an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditSemantics {
    /// Fails if the record already exists.
    Insert,
    /// Fails if the record is absent or the row version does not match.
    Update,
    /// Insert when absent, otherwise behave as `Update`.
    Upsert,
}

// Key filters: every field is optional, `None` matches anything.

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRefKeyFilter {
    pub domain: Option<String>,
    pub environment: Option<String>,
    pub chain_selector: Option<u64>,
    pub contract_type: Option<String>,
    pub version: Option<String>,
    pub qualifier: Option<String>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetadataKeyFilter {
    pub domain: Option<String>,
    pub environment: Option<String>,
    pub chain_selector: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadataKeyFilter {
    pub domain: Option<String>,
    pub environment: Option<String>,
    pub chain_selector: Option<u64>,
    pub address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvMetadataKeyFilter {
    pub domain: Option<String>,
    pub environment: Option<String>,
}

// Wire records carry the server row version; metadata travels as JSON text.

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRefRecord {
    pub domain: String,
    pub environment: String,
    pub address: String,
    pub chain_selector: u64,
    pub contract_type: String,
    pub version: String,
    pub qualifier: String,
    pub labels: Vec<String>,
    pub row_version: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetadataRecord {
    pub domain: String,
    pub environment: String,
    pub chain_selector: u64,
    pub metadata: String,
    pub row_version: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMetadataRecord {
    pub domain: String,
    pub environment: String,
    pub address: String,
    pub chain_selector: u64,
    pub metadata: String,
    pub row_version: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvMetadataRecord {
    pub domain: String,
    pub environment: String,
    pub metadata: String,
    pub row_version: i64,
}

/// Every request the catalog understands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogRequest {
    BeginTransaction,
    CommitTransaction,
    RollbackTransaction,
    FindAddressRefs {
        filter: AddressRefKeyFilter,
    },
    EditAddressRef {
        record: AddressRefRecord,
        semantics: EditSemantics,
    },
    FindChainMetadata {
        filter: ChainMetadataKeyFilter,
    },
    EditChainMetadata {
        record: ChainMetadataRecord,
        semantics: EditSemantics,
    },
    FindContractMetadata {
        filter: ContractMetadataKeyFilter,
    },
    EditContractMetadata {
        record: ContractMetadataRecord,
        semantics: EditSemantics,
    },
    FindEnvMetadata {
        filter: EnvMetadataKeyFilter,
    },
    EditEnvMetadata {
        record: EnvMetadataRecord,
        semantics: EditSemantics,
    },
}

impl CatalogRequest {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::BeginTransaction => 1,
            Self::CommitTransaction => 2,
            Self::RollbackTransaction => 3,
            Self::FindAddressRefs { .. } => 10,
            Self::EditAddressRef { .. } => 11,
            Self::FindChainMetadata { .. } => 20,
            Self::EditChainMetadata { .. } => 21,
            Self::FindContractMetadata { .. } => 30,
            Self::EditContractMetadata { .. } => 31,
            Self::FindEnvMetadata { .. } => 40,
            Self::EditEnvMetadata { .. } => 41,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::BeginTransaction => "BeginTransaction",
            Self::CommitTransaction => "CommitTransaction",
            Self::RollbackTransaction => "RollbackTransaction",
            Self::FindAddressRefs { .. } => "FindAddressRefs",
            Self::EditAddressRef { .. } => "EditAddressRef",
            Self::FindChainMetadata { .. } => "FindChainMetadata",
            Self::EditChainMetadata { .. } => "EditChainMetadata",
            Self::FindContractMetadata { .. } => "FindContractMetadata",
            Self::EditContractMetadata { .. } => "EditContractMetadata",
            Self::FindEnvMetadata { .. } => "FindEnvMetadata",
            Self::EditEnvMetadata { .. } => "EditEnvMetadata",
        }
    }
}

/// A request plus the transaction it runs in, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub protocol_version: u32,
    pub transaction_id: Option<String>,
    pub request: CatalogRequest,
}

impl RequestEnvelope {
    pub fn new(request: CatalogRequest) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            transaction_id: None,
            request,
        }
    }

    pub fn in_transaction(mut self, transaction_id: Option<String>) -> Self {
        self.transaction_id = transaction_id;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    pub succeeded: bool,
    /// Free-text failure message, set when `succeeded` is false.
    pub error: Option<String>,
}

/// Find responses carry every match; edit responses carry the written
/// record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseBody {
    Empty,
    TransactionBegun { transaction_id: String },
    AddressRefs(Vec<AddressRefRecord>),
    ChainMetadata(Vec<ChainMetadataRecord>),
    ContractMetadata(Vec<ContractMetadataRecord>),
    EnvMetadata(Vec<EnvMetadataRecord>),
}

impl ResponseBody {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::Empty => 128,
            Self::TransactionBegun { .. } => 129,
            Self::AddressRefs(_) => 130,
            Self::ChainMetadata(_) => 131,
            Self::ContractMetadata(_) => 132,
            Self::EnvMetadata(_) => 133,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::TransactionBegun { .. } => "TransactionBegun",
            Self::AddressRefs(_) => "AddressRefs",
            Self::ChainMetadata(_) => "ChainMetadata",
            Self::ContractMetadata(_) => "ContractMetadata",
            Self::EnvMetadata(_) => "EnvMetadata",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub status: ResponseStatus,
    pub body: ResponseBody,
}

impl CatalogResponse {
    pub fn ok(body: ResponseBody) -> Self {
        Self {
            status: ResponseStatus {
                succeeded: true,
                error: None,
            },
            body,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus {
                succeeded: false,
                error: Some(message.into()),
            },
            body: ResponseBody::Empty,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.succeeded
    }

    /// The failure message, or an empty string when the server sent none.
    pub fn error_message(&self) -> &str {
        self.status.error.as_deref().unwrap_or("")
    }
}
