//! In-process catalog for tests.
//!
//! [`InMemoryCatalogService`] keeps catalog tables in memory and answers
//! requests the way the remote catalog does: row versions start at 1 and
//! grow by one per edit, mismatched versions and missing update targets are
//! rejected with the catalog's failure text, and transactions stage their
//! writes until commit. [`LoopbackChannel`] connects a client to it through
//! the real wire codec.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dds_protocol::{
    AddressRefKeyFilter, AddressRefRecord, CallChannel, CatalogCodec, CatalogRequest,
    CatalogResponse, ChainMetadataKeyFilter, ChainMetadataRecord, ContractMetadataKeyFilter,
    ContractMetadataRecord, EditSemantics, EnvMetadataKeyFilter, EnvMetadataRecord, Exchange,
    ProtocolError, ProtocolResult, RequestEnvelope, ResponseBody,
};
use tracing::debug;

use crate::errors::{INCORRECT_ROW_VERSION, NO_RECORDS_FOUND, NO_RECORD_TO_UPDATE};

/// A catalog table row.
trait Row: Clone {
    fn row_key(&self) -> String;
    fn row_version(&self) -> i64;
    fn set_row_version(&mut self, version: i64);
}

macro_rules! impl_row {
    ($ty:ty, |$r:ident| $key:expr) => {
        impl Row for $ty {
            fn row_key(&self) -> String {
                let $r = self;
                $key
            }

            fn row_version(&self) -> i64 {
                self.row_version
            }

            fn set_row_version(&mut self, version: i64) {
                self.row_version = version;
            }
        }
    };
}

impl_row!(AddressRefRecord, |r| format!(
    "{}/{}/{}:{}:{}:{}",
    r.domain, r.environment, r.chain_selector, r.contract_type, r.version, r.qualifier
));
impl_row!(ChainMetadataRecord, |r| format!(
    "{}/{}/{}",
    r.domain, r.environment, r.chain_selector
));
impl_row!(ContractMetadataRecord, |r| format!(
    "{}/{}/{}:{}",
    r.domain, r.environment, r.chain_selector, r.address
));
impl_row!(EnvMetadataRecord, |r| format!("{}/{}", r.domain, r.environment));

#[derive(Clone, Debug, Default)]
struct Tables {
    address_refs: BTreeMap<String, AddressRefRecord>,
    chain_metadata: BTreeMap<String, ChainMetadataRecord>,
    contract_metadata: BTreeMap<String, ContractMetadataRecord>,
    env_metadata: BTreeMap<String, EnvMetadataRecord>,
}

#[derive(Debug, Default)]
struct ServiceState {
    committed: Tables,
    transactions: HashMap<String, Tables>,
    failures: HashMap<String, VecDeque<String>>,
    requests: usize,
}

/// An in-memory stand-in for the remote catalog.
#[derive(Debug, Default)]
pub struct InMemoryCatalogService {
    state: Mutex<ServiceState>,
}

impl InMemoryCatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next request named `request` (see
    /// [`CatalogRequest::type_name`]) fail with `message`.
    pub fn fail_next(&self, request: &str, message: impl Into<String>) {
        self.lock()
            .failures
            .entry(request.to_string())
            .or_default()
            .push_back(message.into());
    }

    /// Number of requests handled so far.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }

    pub fn open_transactions(&self) -> usize {
        self.lock().transactions.len()
    }

    /// Committed address ref rows, for assertions.
    pub fn committed_address_refs(&self) -> Vec<AddressRefRecord> {
        self.lock().committed.address_refs.values().cloned().collect()
    }

    pub fn handle(&self, envelope: RequestEnvelope) -> CatalogResponse {
        let mut state = self.lock();
        state.requests += 1;
        let name = envelope.request.type_name();
        debug!(
            request = name,
            transaction = envelope.transaction_id.as_deref().unwrap_or("-"),
            "catalog service request"
        );
        if let Some(message) = state.failures.get_mut(name).and_then(VecDeque::pop_front) {
            return CatalogResponse::failure(message);
        }
        match state.dispatch(envelope) {
            Ok(body) => CatalogResponse::ok(body),
            Err(message) => CatalogResponse::failure(message),
        }
    }
}

impl ServiceState {
    fn dispatch(&mut self, envelope: RequestEnvelope) -> Result<ResponseBody, String> {
        let RequestEnvelope {
            transaction_id,
            request,
            ..
        } = envelope;
        match request {
            CatalogRequest::BeginTransaction => {
                if let Some(id) = transaction_id {
                    return Err(format!("transaction {id} is already open"));
                }
                let id = uuid::Uuid::now_v7().to_string();
                self.transactions.insert(id.clone(), self.committed.clone());
                Ok(ResponseBody::TransactionBegun { transaction_id: id })
            }
            CatalogRequest::CommitTransaction => {
                let id = transaction_id.ok_or("commit outside a transaction")?;
                let staged = self
                    .transactions
                    .remove(&id)
                    .ok_or_else(|| format!("unknown transaction {id}"))?;
                self.committed = staged;
                Ok(ResponseBody::Empty)
            }
            CatalogRequest::RollbackTransaction => {
                let id = transaction_id.ok_or("rollback outside a transaction")?;
                self.transactions
                    .remove(&id)
                    .ok_or_else(|| format!("unknown transaction {id}"))?;
                Ok(ResponseBody::Empty)
            }
            request => {
                let tables = match transaction_id {
                    Some(id) => self
                        .transactions
                        .get_mut(&id)
                        .ok_or_else(|| format!("unknown transaction {id}"))?,
                    None => &mut self.committed,
                };
                tables.apply(request)
            }
        }
    }
}

impl Tables {
    fn apply(&mut self, request: CatalogRequest) -> Result<ResponseBody, String> {
        match request {
            CatalogRequest::FindAddressRefs { filter } => {
                find(&self.address_refs, |r| address_ref_matches(&filter, r))
                    .map(ResponseBody::AddressRefs)
            }
            CatalogRequest::EditAddressRef { record, semantics } => {
                edit(&mut self.address_refs, record, semantics)
                    .map(|r| ResponseBody::AddressRefs(vec![r]))
            }
            CatalogRequest::FindChainMetadata { filter } => {
                find(&self.chain_metadata, |r| chain_metadata_matches(&filter, r))
                    .map(ResponseBody::ChainMetadata)
            }
            CatalogRequest::EditChainMetadata { record, semantics } => {
                edit(&mut self.chain_metadata, record, semantics)
                    .map(|r| ResponseBody::ChainMetadata(vec![r]))
            }
            CatalogRequest::FindContractMetadata { filter } => {
                find(&self.contract_metadata, |r| contract_metadata_matches(&filter, r))
                    .map(ResponseBody::ContractMetadata)
            }
            CatalogRequest::EditContractMetadata { record, semantics } => {
                edit(&mut self.contract_metadata, record, semantics)
                    .map(|r| ResponseBody::ContractMetadata(vec![r]))
            }
            CatalogRequest::FindEnvMetadata { filter } => {
                find(&self.env_metadata, |r| env_metadata_matches(&filter, r))
                    .map(ResponseBody::EnvMetadata)
            }
            CatalogRequest::EditEnvMetadata { record, semantics } => {
                edit(&mut self.env_metadata, record, semantics)
                    .map(|r| ResponseBody::EnvMetadata(vec![r]))
            }
            other => Err(format!("{} is not a table request", other.type_name())),
        }
    }
}

fn find<R: Row>(
    table: &BTreeMap<String, R>,
    matches: impl Fn(&R) -> bool,
) -> Result<Vec<R>, String> {
    let rows: Vec<R> = table.values().filter(|r| matches(r)).cloned().collect();
    if rows.is_empty() {
        return Err(format!("{NO_RECORDS_FOUND} matching the filter"));
    }
    Ok(rows)
}

fn edit<R: Row>(
    table: &mut BTreeMap<String, R>,
    mut record: R,
    semantics: EditSemantics,
) -> Result<R, String> {
    let key = record.row_key();
    let stored_version = table.get(&key).map(Row::row_version);
    match (stored_version, semantics) {
        (Some(_), EditSemantics::Insert) => Err(format!("record already exists for {key}")),
        (None, EditSemantics::Update) => Err(format!("{NO_RECORD_TO_UPDATE} {key}")),
        (None, _) => {
            record.set_row_version(1);
            table.insert(key, record.clone());
            Ok(record)
        }
        (Some(stored), _) if stored != record.row_version() => Err(format!(
            "{INCORRECT_ROW_VERSION} for {key}: expected {stored}, got {}",
            record.row_version()
        )),
        (Some(stored), _) => {
            record.set_row_version(stored + 1);
            table.insert(key, record.clone());
            Ok(record)
        }
    }
}

fn field<T: PartialEq + ?Sized>(filter: Option<&T>, value: &T) -> bool {
    filter.map_or(true, |wanted| wanted == value)
}

fn address_ref_matches(filter: &AddressRefKeyFilter, r: &AddressRefRecord) -> bool {
    field(filter.domain.as_deref(), r.domain.as_str())
        && field(filter.environment.as_deref(), r.environment.as_str())
        && field(filter.chain_selector.as_ref(), &r.chain_selector)
        && field(filter.contract_type.as_deref(), r.contract_type.as_str())
        && field(filter.version.as_deref(), r.version.as_str())
        && field(filter.qualifier.as_deref(), r.qualifier.as_str())
        && field(filter.address.as_deref(), r.address.as_str())
}

fn chain_metadata_matches(filter: &ChainMetadataKeyFilter, r: &ChainMetadataRecord) -> bool {
    field(filter.domain.as_deref(), r.domain.as_str())
        && field(filter.environment.as_deref(), r.environment.as_str())
        && field(filter.chain_selector.as_ref(), &r.chain_selector)
}

fn contract_metadata_matches(
    filter: &ContractMetadataKeyFilter,
    r: &ContractMetadataRecord,
) -> bool {
    field(filter.domain.as_deref(), r.domain.as_str())
        && field(filter.environment.as_deref(), r.environment.as_str())
        && field(filter.chain_selector.as_ref(), &r.chain_selector)
        && field(filter.address.as_deref(), r.address.as_str())
}

fn env_metadata_matches(filter: &EnvMetadataKeyFilter, r: &EnvMetadataRecord) -> bool {
    field(filter.domain.as_deref(), r.domain.as_str())
        && field(filter.environment.as_deref(), r.environment.as_str())
}

/// A [`CallChannel`] that serves every exchange from an
/// [`InMemoryCatalogService`], encoding and decoding frames on the way.
#[derive(Clone, Debug)]
pub struct LoopbackChannel {
    service: Arc<InMemoryCatalogService>,
}

impl LoopbackChannel {
    pub fn new(service: Arc<InMemoryCatalogService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CallChannel for LoopbackChannel {
    async fn open(&self) -> ProtocolResult<Box<dyn Exchange>> {
        Ok(Box::new(LoopbackExchange {
            service: self.service.clone(),
            pending: None,
        }))
    }
}

struct LoopbackExchange {
    service: Arc<InMemoryCatalogService>,
    pending: Option<Vec<u8>>,
}

#[async_trait]
impl Exchange for LoopbackExchange {
    async fn send(&mut self, frame: Vec<u8>) -> ProtocolResult<()> {
        let (envelope, _) = CatalogCodec::decode_request(&frame)?;
        let response = self.service.handle(envelope);
        self.pending = Some(CatalogCodec::encode_response(&response)?);
        Ok(())
    }

    async fn recv(&mut self) -> ProtocolResult<Vec<u8>> {
        self.pending.take().ok_or(ProtocolError::ChannelClosed)
    }

    async fn close(self: Box<Self>) -> ProtocolResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain_row(selector: u64, row_version: i64) -> ChainMetadataRecord {
        ChainMetadataRecord {
            domain: "ccip".into(),
            environment: "staging".into(),
            chain_selector: selector,
            metadata: "{}".into(),
            row_version,
        }
    }

    fn edit_request(row: ChainMetadataRecord, semantics: EditSemantics) -> RequestEnvelope {
        RequestEnvelope::new(CatalogRequest::EditChainMetadata {
            record: row,
            semantics,
        })
    }

    #[test]
    fn row_versions_start_at_one_and_grow() {
        let service = InMemoryCatalogService::new();
        let response = service.handle(edit_request(chain_row(1, 0), EditSemantics::Insert));
        assert_eq!(response.body, ResponseBody::ChainMetadata(vec![chain_row(1, 1)]));
        let response = service.handle(edit_request(chain_row(1, 1), EditSemantics::Update));
        assert_eq!(response.body, ResponseBody::ChainMetadata(vec![chain_row(1, 2)]));
    }

    #[test]
    fn mismatched_version_rejected() {
        let service = InMemoryCatalogService::new();
        service.handle(edit_request(chain_row(1, 0), EditSemantics::Insert));
        let response = service.handle(edit_request(chain_row(1, 5), EditSemantics::Upsert));
        assert!(!response.is_success());
        assert!(response.error_message().contains(INCORRECT_ROW_VERSION));
    }

    #[test]
    fn empty_find_reports_no_records() {
        let service = InMemoryCatalogService::new();
        let response = service.handle(RequestEnvelope::new(CatalogRequest::FindChainMetadata {
            filter: ChainMetadataKeyFilter::default(),
        }));
        assert!(response.error_message().contains(NO_RECORDS_FOUND));
    }

    #[test]
    fn transaction_stages_until_commit() {
        let service = InMemoryCatalogService::new();
        let begun = service.handle(RequestEnvelope::new(CatalogRequest::BeginTransaction));
        let id = match begun.body {
            ResponseBody::TransactionBegun { transaction_id } => transaction_id,
            other => panic!("unexpected body {}", other.type_name()),
        };
        service.handle(
            edit_request(chain_row(1, 0), EditSemantics::Insert).in_transaction(Some(id.clone())),
        );
        let outside = service.handle(RequestEnvelope::new(CatalogRequest::FindChainMetadata {
            filter: ChainMetadataKeyFilter::default(),
        }));
        assert!(!outside.is_success());

        service.handle(
            RequestEnvelope::new(CatalogRequest::CommitTransaction).in_transaction(Some(id)),
        );
        assert_eq!(service.open_transactions(), 0);
        let after = service.handle(RequestEnvelope::new(CatalogRequest::FindChainMetadata {
            filter: ChainMetadataKeyFilter::default(),
        }));
        assert!(after.is_success());
    }

    #[test]
    fn injected_failure_fires_once() {
        let service = InMemoryCatalogService::new();
        service.fail_next("EditChainMetadata", "boom");
        let first = service.handle(edit_request(chain_row(1, 0), EditSemantics::Insert));
        assert_eq!(first.error_message(), "boom");
        let second = service.handle(edit_request(chain_row(1, 0), EditSemantics::Insert));
        assert!(second.is_success());
        assert_eq!(service.request_count(), 2);
    }
}
