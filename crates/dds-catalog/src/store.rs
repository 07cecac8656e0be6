use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use dds_protocol::{CatalogRequest, EditSemantics};
use dds_store::{
    CallContext, ContextFetcher, ContextFilterable, ContextGetter, ContextMutableRefStore,
    ContextMutableStore, GetOptions, StoreError, StoreResult, UpdateOptions,
};
use dds_types::{AddressRef, AddressRefKey, Metadata, MetadataRecord, PrimaryKeyHolder};
use tracing::debug;

use crate::client::CatalogClient;
use crate::entity::{
    AddressRefEntity, CatalogEntity, ChainMetadataEntity, ContractMetadataEntity,
};
use crate::errors::{classify_remote_error, RemoteOperation};
use crate::version_cache::VersionCache;

/// A keyed catalog collection with optimistic concurrency.
///
/// Every find records the row versions the server reports; every edit sends
/// the cached version for the record's key and, on success, advances the
/// cache by one. Each instance owns its cache.
pub struct CatalogStore<E: CatalogEntity> {
    client: Arc<CatalogClient>,
    versions: VersionCache,
    _entity: PhantomData<fn() -> E>,
}

pub type CatalogAddressRefStore = CatalogStore<AddressRefEntity>;
pub type CatalogChainMetadataStore = CatalogStore<ChainMetadataEntity>;
pub type CatalogContractMetadataStore = CatalogStore<ContractMetadataEntity>;

impl<E: CatalogEntity> CatalogStore<E> {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self {
            client,
            versions: VersionCache::new(),
            _entity: PhantomData,
        }
    }

    /// The row version the next edit of `key` will send.
    pub fn cached_version(&self, key: &E::Key) -> i64 {
        let transaction = self.client.transaction_id();
        self.versions.get(transaction.as_deref(), &key.to_string())
    }

    /// Merge or drop the versions cached inside `transaction_id`.
    pub(crate) fn finish_transaction(&self, transaction_id: &str, committed: bool) {
        self.versions.finish_transaction(transaction_id, committed);
    }

    async fn find(
        &self,
        ctx: &CallContext,
        request: CatalogRequest,
        key_text: &str,
        options: GetOptions,
    ) -> StoreResult<Vec<E::Record>> {
        let response = if options.ignore_transactions {
            self.client.call_outside_transaction(ctx, request).await?
        } else {
            self.client.call(ctx, request).await?
        };
        if !response.is_success() {
            return Err(classify_remote_error(
                E::KIND,
                key_text,
                RemoteOperation::Find,
                response.error_message(),
            ));
        }
        let rows = E::decode_rows(response.body)?;
        let transaction = self.client.transaction_id();
        // Only versions from the view that edits run against are cached.
        let cache_versions = !options.ignore_transactions || transaction.is_none();
        let mut records = Vec::with_capacity(rows.len());
        for (record, row_version) in rows {
            if cache_versions {
                self.versions
                    .set(transaction.as_deref(), record.primary_key().to_string(), row_version);
            }
            records.push(record);
        }
        debug!(kind = %E::KIND, key = key_text, count = records.len(), "catalog find");
        Ok(records)
    }

    async fn find_one(
        &self,
        ctx: &CallContext,
        key: &E::Key,
        options: GetOptions,
    ) -> StoreResult<E::Record> {
        let key_text = key.to_string();
        let request = E::find_request(&self.client, Some(key));
        self.find(ctx, request, &key_text, options)
            .await?
            .into_iter()
            .find(|record| record.primary_key() == *key)
            .ok_or_else(|| StoreError::not_found(E::KIND, &key_text))
    }

    async fn edit(
        &self,
        ctx: &CallContext,
        record: &E::Record,
        semantics: EditSemantics,
    ) -> StoreResult<()> {
        let key = record.primary_key().to_string();
        let transaction = self.client.transaction_id();
        let expected = self.versions.get(transaction.as_deref(), &key);
        let request = E::edit_request(&self.client, record, expected, semantics)?;
        let response = self.client.call(ctx, request).await?;
        if !response.is_success() {
            let err = classify_remote_error(
                E::KIND,
                &key,
                RemoteOperation::Edit,
                response.error_message(),
            );
            debug!(kind = %E::KIND, %key, expected, error = %err, "catalog edit rejected");
            return Err(err);
        }
        let row_version = self.versions.advance(transaction.as_deref(), &key);
        debug!(kind = %E::KIND, %key, ?semantics, row_version, "catalog edit");
        Ok(())
    }
}

impl<E> CatalogStore<E>
where
    E: CatalogEntity,
    E::Record: MetadataRecord<E::Key>,
{
    /// Read the current record (refreshing its cached version), apply the
    /// updater and write the result in one edit.
    async fn write_metadata(
        &self,
        ctx: &CallContext,
        key: &E::Key,
        metadata: Metadata,
        options: UpdateOptions,
        semantics: EditSemantics,
    ) -> StoreResult<()> {
        let current = match self.find_one(ctx, key, GetOptions::default()).await {
            Ok(record) => Some(record),
            Err(err) if err.is_not_found() => None,
            Err(err) => return Err(err),
        };
        if current.is_none() && semantics == EditSemantics::Update {
            return Err(StoreError::not_found(E::KIND, key));
        }
        let merged = options.apply(current.as_ref().map(|r| r.metadata()), metadata)?;
        let record = <E::Record as MetadataRecord<E::Key>>::from_parts(key, merged);
        self.edit(ctx, &record, semantics).await
    }
}

impl CatalogAddressRefStore {
    /// The address ref deployed at `address` on `chain_selector`.
    pub async fn find_by_address(
        &self,
        ctx: &CallContext,
        address: &str,
        chain_selector: u64,
    ) -> StoreResult<AddressRef> {
        let key_text = format!("{address}@{chain_selector}");
        let request =
            AddressRefEntity::find_by_address_request(&self.client, address, chain_selector);
        self.find(ctx, request, &key_text, GetOptions::default())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(AddressRefEntity::KIND, &key_text))
    }
}

impl<E: CatalogEntity> std::fmt::Debug for CatalogStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("kind", &E::KIND)
            .field("cached_versions", &self.versions.len())
            .finish()
    }
}

#[async_trait]
impl<E: CatalogEntity> ContextFetcher<E::Record> for CatalogStore<E> {
    async fn fetch(&self, ctx: &CallContext) -> StoreResult<Vec<E::Record>> {
        let request = E::find_request(&self.client, None);
        self.find(ctx, request, "*", GetOptions::default()).await
    }
}

#[async_trait]
impl<E: CatalogEntity> ContextGetter<E::Key, E::Record> for CatalogStore<E> {
    async fn get_with_options(
        &self,
        ctx: &CallContext,
        key: &E::Key,
        options: GetOptions,
    ) -> StoreResult<E::Record> {
        self.find_one(ctx, key, options).await
    }
}

impl<E: CatalogEntity> ContextFilterable<E::Record> for CatalogStore<E> {}

#[async_trait]
impl ContextMutableRefStore<AddressRefKey, AddressRef> for CatalogAddressRefStore {
    async fn add(&self, ctx: &CallContext, record: AddressRef) -> StoreResult<()> {
        self.edit(ctx, &record, EditSemantics::Insert).await
    }

    async fn upsert(&self, ctx: &CallContext, record: AddressRef) -> StoreResult<()> {
        self.edit(ctx, &record, EditSemantics::Upsert).await
    }

    async fn update(&self, ctx: &CallContext, record: AddressRef) -> StoreResult<()> {
        self.edit(ctx, &record, EditSemantics::Update).await
    }

    async fn delete(&self, _ctx: &CallContext, _key: &AddressRefKey) -> StoreResult<()> {
        Err(StoreError::unsupported(AddressRefEntity::KIND, "delete"))
    }
}

#[async_trait]
impl<E> ContextMutableStore<E::Key, E::Record> for CatalogStore<E>
where
    E: CatalogEntity,
    E::Record: MetadataRecord<E::Key>,
{
    async fn add(&self, ctx: &CallContext, record: E::Record) -> StoreResult<()> {
        self.edit(ctx, &record, EditSemantics::Insert).await
    }

    async fn upsert(
        &self,
        ctx: &CallContext,
        key: &E::Key,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()> {
        self.write_metadata(ctx, key, metadata, options, EditSemantics::Upsert)
            .await
    }

    async fn update(
        &self,
        ctx: &CallContext,
        key: &E::Key,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()> {
        self.write_metadata(ctx, key, metadata, options, EditSemantics::Update)
            .await
    }

    async fn delete(&self, _ctx: &CallContext, _key: &E::Key) -> StoreResult<()> {
        Err(StoreError::unsupported(E::KIND, "delete"))
    }
}
