use dds_catalog::CatalogDataStore;
use dds_memory::{DataStoreSnapshot, MemoryDataStore, SealedDataStore};
use dds_store::{
    CallContext, ContextFetcher, ContextMutableRefStore, ContextMutableStore,
    ContextMutableUnaryStore, ContextUnaryStore, DataStore, Fetcher, StoreResult, UnaryStore,
    UpdateOptions,
};
use dds_types::PrimaryKeyHolder;
use tracing::{debug, info};

use crate::error::{loading, pushing, reading, Collection, SyncError, SyncResult};

/// Records written to the catalog by one [`sync`] or [`merge`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub address_refs: usize,
    pub chain_metadata: usize,
    pub contract_metadata: usize,
    pub env_metadata: bool,
}

impl SyncReport {
    fn of(snapshot: &DataStoreSnapshot) -> Self {
        Self {
            address_refs: snapshot.address_refs.len(),
            chain_metadata: snapshot.chain_metadata.len(),
            contract_metadata: snapshot.contract_metadata.len(),
            env_metadata: snapshot.env_metadata.is_some(),
        }
    }

    pub fn total(&self) -> usize {
        self.address_refs
            + self.chain_metadata
            + self.contract_metadata
            + usize::from(self.env_metadata)
    }
}

/// Treat "nothing stored" as an empty collection.
fn or_empty<T>(result: StoreResult<Vec<T>>) -> StoreResult<Vec<T>> {
    match result {
        Err(err) if err.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}

/// Read the whole catalog scope into a sealed local datastore.
///
/// A collection the catalog reports as empty loads as empty; an unset env
/// metadata loads as absent. Any other failure aborts the load and names
/// the collection.
pub async fn load(ctx: &CallContext, catalog: &CatalogDataStore) -> SyncResult<SealedDataStore> {
    let address_refs = or_empty(catalog.addresses().fetch(ctx).await)
        .map_err(loading(Collection::AddressRefs))?;
    let chain_metadata = or_empty(catalog.chain_metadata().fetch(ctx).await)
        .map_err(loading(Collection::ChainMetadata))?;
    let contract_metadata = or_empty(catalog.contract_metadata().fetch(ctx).await)
        .map_err(loading(Collection::ContractMetadata))?;
    let env_metadata = match catalog.env_metadata().get(ctx).await {
        Ok(env) => Some(env.metadata),
        Err(err) if err.is_not_set() => None,
        Err(err) => return Err(loading(Collection::EnvMetadata)(err)),
    };

    let snapshot = DataStoreSnapshot {
        address_refs,
        chain_metadata,
        contract_metadata,
        env_metadata,
    };
    let report = SyncReport::of(&snapshot);
    let store = MemoryDataStore::from_snapshot(snapshot).map_err(SyncError::Inconsistent)?;
    info!(
        scope = %catalog.client().config().scope(),
        address_refs = report.address_refs,
        chain_metadata = report.chain_metadata,
        contract_metadata = report.contract_metadata,
        env_metadata = report.env_metadata,
        "loaded datastore from catalog"
    );
    Ok(store.seal())
}

/// Push every record of `local` to the catalog in one transaction.
///
/// Records are upserted, so running the same sync twice leaves the catalog
/// unchanged. On any failure the transaction is rolled back and the error
/// names the collection being written.
pub async fn sync<D: DataStore>(
    ctx: &CallContext,
    local: &D,
    catalog: &CatalogDataStore,
) -> SyncResult<SyncReport> {
    push(ctx, local, catalog, "sync").await
}

/// Push a changeset's datastore into the catalog. Same mechanics as
/// [`sync`]: upsert everything in one transaction, roll back on failure.
pub async fn merge<D: DataStore>(
    ctx: &CallContext,
    changeset: &D,
    catalog: &CatalogDataStore,
) -> SyncResult<SyncReport> {
    push(ctx, changeset, catalog, "merge").await
}

fn read_local<D: DataStore>(local: &D) -> SyncResult<DataStoreSnapshot> {
    let env_metadata = match local.env_metadata().get() {
        Ok(env) => Some(env.metadata),
        Err(err) if err.is_not_set() => None,
        Err(err) => return Err(reading(Collection::EnvMetadata)(err)),
    };
    Ok(DataStoreSnapshot {
        address_refs: local
            .addresses()
            .fetch()
            .map_err(reading(Collection::AddressRefs))?,
        chain_metadata: local
            .chain_metadata()
            .fetch()
            .map_err(reading(Collection::ChainMetadata))?,
        contract_metadata: local
            .contract_metadata()
            .fetch()
            .map_err(reading(Collection::ContractMetadata))?,
        env_metadata,
    })
}

async fn push<D: DataStore>(
    ctx: &CallContext,
    local: &D,
    catalog: &CatalogDataStore,
    intent: &'static str,
) -> SyncResult<SyncReport> {
    let snapshot = read_local(local)?;
    let report = SyncReport::of(&snapshot);

    catalog
        .with_transaction(ctx, |catalog| async move {
            // Address ref edits do not read first, so learn the current row
            // versions up front.
            let known = or_empty(catalog.addresses().fetch(ctx).await)
                .map_err(pushing(Collection::AddressRefs))?;
            debug!(known = known.len(), "warmed address ref versions");

            for record in snapshot.address_refs {
                catalog
                    .addresses()
                    .upsert(ctx, record)
                    .await
                    .map_err(pushing(Collection::AddressRefs))?;
            }
            for record in snapshot.chain_metadata {
                let key = record.primary_key();
                ContextMutableStore::upsert(
                    catalog.chain_metadata(),
                    ctx,
                    &key,
                    record.metadata,
                    UpdateOptions::new(),
                )
                .await
                .map_err(pushing(Collection::ChainMetadata))?;
            }
            for record in snapshot.contract_metadata {
                let key = record.primary_key();
                ContextMutableStore::upsert(
                    catalog.contract_metadata(),
                    ctx,
                    &key,
                    record.metadata,
                    UpdateOptions::new(),
                )
                .await
                .map_err(pushing(Collection::ContractMetadata))?;
            }
            if let Some(metadata) = snapshot.env_metadata {
                catalog
                    .env_metadata()
                    .set(ctx, metadata, UpdateOptions::new())
                    .await
                    .map_err(pushing(Collection::EnvMetadata))?;
            }
            Ok::<(), SyncError>(())
        })
        .await?;

    info!(
        intent,
        scope = %catalog.client().config().scope(),
        address_refs = report.address_refs,
        chain_metadata = report.chain_metadata,
        contract_metadata = report.contract_metadata,
        env_metadata = report.env_metadata,
        "pushed datastore to catalog"
    );
    Ok(report)
}
