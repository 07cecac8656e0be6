//! Mapping between local records and catalog wire records.
//!
//! Each keyed entity the catalog stores implements [`CatalogEntity`], which
//! tells a [`crate::store::CatalogStore`] how to build find and edit requests
//! for it and how to read records back out of a response.

use dds_protocol::{
    AddressRefKeyFilter, AddressRefRecord, CatalogRequest, ChainMetadataKeyFilter,
    ChainMetadataRecord, ContractMetadataKeyFilter, ContractMetadataRecord, EditSemantics,
    ResponseBody,
};
use dds_store::{StoreError, StoreResult};
use dds_types::{
    parse_version, AddressRef, AddressRefKey, ChainMetadata, ChainMetadataKey, ContractMetadata,
    ContractMetadataKey, LabelSet, Metadata, RecordKind, UniqueRecord,
};

use crate::client::CatalogClient;

/// A record together with the row version the catalog reported for it.
pub type VersionedRecord<R> = (R, i64);

/// A keyed entity stored in the catalog.
pub trait CatalogEntity: Send + Sync + 'static {
    type Key: dds_types::RecordKey;
    type Record: UniqueRecord<Self::Key>;

    const KIND: RecordKind;

    /// Find request for one key, or for every record in scope when `key` is
    /// `None`.
    fn find_request(client: &CatalogClient, key: Option<&Self::Key>) -> CatalogRequest;

    fn edit_request(
        client: &CatalogClient,
        record: &Self::Record,
        row_version: i64,
        semantics: EditSemantics,
    ) -> StoreResult<CatalogRequest>;

    fn decode_rows(body: ResponseBody) -> StoreResult<Vec<VersionedRecord<Self::Record>>>;
}

pub(crate) fn unexpected_body(kind: RecordKind, body: &ResponseBody) -> StoreError {
    StoreError::Remote {
        context: format!("decode {kind}"),
        message: format!("unexpected response body {}", body.type_name()),
    }
}

fn metadata_text(metadata: &Metadata) -> StoreResult<String> {
    Ok(metadata.to_json()?)
}

fn metadata_from_text(text: String) -> StoreResult<Metadata> {
    Ok(Metadata::from_json(text)?)
}

pub struct AddressRefEntity;

impl AddressRefEntity {
    /// Lookup by the `(address, chain_selector)` pair, for callers that do
    /// not know the full key.
    pub fn find_by_address_request(
        client: &CatalogClient,
        address: &str,
        chain_selector: u64,
    ) -> CatalogRequest {
        CatalogRequest::FindAddressRefs {
            filter: AddressRefKeyFilter {
                domain: Some(client.domain().to_string()),
                environment: Some(client.environment().to_string()),
                chain_selector: Some(chain_selector),
                address: Some(address.to_string()),
                ..Default::default()
            },
        }
    }

    fn to_wire(client: &CatalogClient, record: &AddressRef, row_version: i64) -> AddressRefRecord {
        AddressRefRecord {
            domain: client.domain().to_string(),
            environment: client.environment().to_string(),
            address: record.address.clone(),
            chain_selector: record.chain_selector,
            contract_type: record.contract_type.to_string(),
            version: record.version.to_string(),
            qualifier: record.qualifier.clone(),
            labels: record.labels.to_vec(),
            row_version,
        }
    }

    fn from_wire(row: AddressRefRecord) -> StoreResult<VersionedRecord<AddressRef>> {
        let record = AddressRef {
            address: row.address,
            chain_selector: row.chain_selector,
            contract_type: row.contract_type.into(),
            version: parse_version(&row.version)?,
            qualifier: row.qualifier,
            labels: LabelSet::new(row.labels),
        };
        Ok((record, row.row_version))
    }
}

impl CatalogEntity for AddressRefEntity {
    type Key = AddressRefKey;
    type Record = AddressRef;

    const KIND: RecordKind = RecordKind::AddressRef;

    fn find_request(client: &CatalogClient, key: Option<&AddressRefKey>) -> CatalogRequest {
        let mut filter = AddressRefKeyFilter {
            domain: Some(client.domain().to_string()),
            environment: Some(client.environment().to_string()),
            ..Default::default()
        };
        if let Some(key) = key {
            filter.chain_selector = Some(key.chain_selector);
            filter.contract_type = Some(key.contract_type.to_string());
            filter.version = Some(key.version.to_string());
            filter.qualifier = Some(key.qualifier.clone());
        }
        CatalogRequest::FindAddressRefs { filter }
    }

    fn edit_request(
        client: &CatalogClient,
        record: &AddressRef,
        row_version: i64,
        semantics: EditSemantics,
    ) -> StoreResult<CatalogRequest> {
        Ok(CatalogRequest::EditAddressRef {
            record: Self::to_wire(client, record, row_version),
            semantics,
        })
    }

    fn decode_rows(body: ResponseBody) -> StoreResult<Vec<VersionedRecord<AddressRef>>> {
        match body {
            ResponseBody::AddressRefs(rows) => rows.into_iter().map(Self::from_wire).collect(),
            other => Err(unexpected_body(Self::KIND, &other)),
        }
    }
}

pub struct ChainMetadataEntity;

impl CatalogEntity for ChainMetadataEntity {
    type Key = ChainMetadataKey;
    type Record = ChainMetadata;

    const KIND: RecordKind = RecordKind::ChainMetadata;

    fn find_request(client: &CatalogClient, key: Option<&ChainMetadataKey>) -> CatalogRequest {
        CatalogRequest::FindChainMetadata {
            filter: ChainMetadataKeyFilter {
                domain: Some(client.domain().to_string()),
                environment: Some(client.environment().to_string()),
                chain_selector: key.map(|k| k.chain_selector),
            },
        }
    }

    fn edit_request(
        client: &CatalogClient,
        record: &ChainMetadata,
        row_version: i64,
        semantics: EditSemantics,
    ) -> StoreResult<CatalogRequest> {
        Ok(CatalogRequest::EditChainMetadata {
            record: ChainMetadataRecord {
                domain: client.domain().to_string(),
                environment: client.environment().to_string(),
                chain_selector: record.chain_selector,
                metadata: metadata_text(&record.metadata)?,
                row_version,
            },
            semantics,
        })
    }

    fn decode_rows(body: ResponseBody) -> StoreResult<Vec<VersionedRecord<ChainMetadata>>> {
        match body {
            ResponseBody::ChainMetadata(rows) => rows
                .into_iter()
                .map(|row| {
                    let metadata = metadata_from_text(row.metadata)?;
                    Ok((ChainMetadata::new(row.chain_selector, metadata), row.row_version))
                })
                .collect(),
            other => Err(unexpected_body(Self::KIND, &other)),
        }
    }
}

pub struct ContractMetadataEntity;

impl CatalogEntity for ContractMetadataEntity {
    type Key = ContractMetadataKey;
    type Record = ContractMetadata;

    const KIND: RecordKind = RecordKind::ContractMetadata;

    fn find_request(client: &CatalogClient, key: Option<&ContractMetadataKey>) -> CatalogRequest {
        CatalogRequest::FindContractMetadata {
            filter: ContractMetadataKeyFilter {
                domain: Some(client.domain().to_string()),
                environment: Some(client.environment().to_string()),
                chain_selector: key.map(|k| k.chain_selector),
                address: key.map(|k| k.address.clone()),
            },
        }
    }

    fn edit_request(
        client: &CatalogClient,
        record: &ContractMetadata,
        row_version: i64,
        semantics: EditSemantics,
    ) -> StoreResult<CatalogRequest> {
        Ok(CatalogRequest::EditContractMetadata {
            record: ContractMetadataRecord {
                domain: client.domain().to_string(),
                environment: client.environment().to_string(),
                address: record.address.clone(),
                chain_selector: record.chain_selector,
                metadata: metadata_text(&record.metadata)?,
                row_version,
            },
            semantics,
        })
    }

    fn decode_rows(body: ResponseBody) -> StoreResult<Vec<VersionedRecord<ContractMetadata>>> {
        match body {
            ResponseBody::ContractMetadata(rows) => rows
                .into_iter()
                .map(|row| {
                    let metadata = metadata_from_text(row.metadata)?;
                    let record = ContractMetadata::new(row.address, row.chain_selector, metadata);
                    Ok((record, row.row_version))
                })
                .collect(),
            other => Err(unexpected_body(Self::KIND, &other)),
        }
    }
}
