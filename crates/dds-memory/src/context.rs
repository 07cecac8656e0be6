//! Context-aware twins of the memory store traits.
//!
//! Local operations never block on I/O, so each twin checks the context for
//! cancellation or an expired deadline before touching state and then runs
//! the blocking implementation.

use async_trait::async_trait;
use dds_store::{
    CallContext, ContextFetcher, ContextFilterable, ContextGetter, ContextMutableRefStore,
    ContextMutableStore, ContextMutableUnaryStore, ContextUnaryStore, GetOptions, StoreResult,
    UpdateOptions,
};
use dds_types::{
    AddressRef, AddressRefKey, EnvMetadata, Metadata, MetadataRecord, RecordKey, UniqueRecord,
};

use crate::collection::{MemoryAddressRefStore, MemoryStore};
use crate::env::MemoryEnvMetadataStore;

#[async_trait]
impl<K: RecordKey, R: UniqueRecord<K>> ContextFetcher<R> for MemoryStore<K, R> {
    async fn fetch(&self, ctx: &CallContext) -> StoreResult<Vec<R>> {
        ctx.check()?;
        dds_store::Fetcher::fetch(self)
    }
}

#[async_trait]
impl<K: RecordKey, R: UniqueRecord<K>> ContextGetter<K, R> for MemoryStore<K, R> {
    async fn get_with_options(
        &self,
        ctx: &CallContext,
        key: &K,
        options: GetOptions,
    ) -> StoreResult<R> {
        ctx.check()?;
        dds_store::Getter::get_with_options(self, key, options)
    }
}

impl<K: RecordKey, R: UniqueRecord<K>> ContextFilterable<R> for MemoryStore<K, R> {}

#[async_trait]
impl ContextMutableRefStore<AddressRefKey, AddressRef> for MemoryAddressRefStore {
    async fn add(&self, ctx: &CallContext, record: AddressRef) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableRefStore::add(self, record)
    }

    async fn upsert(&self, ctx: &CallContext, record: AddressRef) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableRefStore::upsert(self, record)
    }

    async fn update(&self, ctx: &CallContext, record: AddressRef) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableRefStore::update(self, record)
    }

    async fn delete(&self, ctx: &CallContext, key: &AddressRefKey) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableRefStore::delete(self, key)
    }
}

#[async_trait]
impl<K, R> ContextMutableStore<K, R> for MemoryStore<K, R>
where
    K: RecordKey,
    R: MetadataRecord<K>,
{
    async fn add(&self, ctx: &CallContext, record: R) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableStore::add(self, record)
    }

    async fn upsert(
        &self,
        ctx: &CallContext,
        key: &K,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableStore::upsert(self, key, metadata, options)
    }

    async fn update(
        &self,
        ctx: &CallContext,
        key: &K,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableStore::update(self, key, metadata, options)
    }

    async fn delete(&self, ctx: &CallContext, key: &K) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableStore::delete(self, key)
    }
}

#[async_trait]
impl ContextUnaryStore<EnvMetadata> for MemoryEnvMetadataStore {
    async fn get_with_options(
        &self,
        ctx: &CallContext,
        options: GetOptions,
    ) -> StoreResult<EnvMetadata> {
        ctx.check()?;
        dds_store::UnaryStore::get_with_options(self, options)
    }
}

#[async_trait]
impl ContextMutableUnaryStore<EnvMetadata> for MemoryEnvMetadataStore {
    async fn set(
        &self,
        ctx: &CallContext,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()> {
        ctx.check()?;
        dds_store::MutableUnaryStore::set(self, metadata, options)
    }
}
