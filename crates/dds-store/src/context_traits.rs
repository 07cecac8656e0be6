//! Context-aware capability traits.
//!
//! Async twins of [`crate::traits`]. Every call takes a [`CallContext`];
//! implementations must stop work and return `Cancelled` or
//! `DeadlineExceeded` once the context says so.

use async_trait::async_trait;
use dds_types::Metadata;

use crate::context::CallContext;
use crate::error::StoreResult;
use crate::options::{GetOptions, UpdateOptions};
use crate::traits::{apply_filters, FilterFn};

#[async_trait]
pub trait ContextFetcher<R: Send + 'static>: Send + Sync {
    async fn fetch(&self, ctx: &CallContext) -> StoreResult<Vec<R>>;
}

#[async_trait]
pub trait ContextGetter<K: Send + Sync + 'static, R: Send + 'static>: Send + Sync {
    /// With `ignore_transactions` set, returns the last committed value even
    /// when the caller has uncommitted writes in an open transaction.
    async fn get_with_options(
        &self,
        ctx: &CallContext,
        key: &K,
        options: GetOptions,
    ) -> StoreResult<R>;

    async fn get(&self, ctx: &CallContext, key: &K) -> StoreResult<R> {
        self.get_with_options(ctx, key, GetOptions::default()).await
    }
}

#[async_trait]
pub trait ContextFilterable<R: Send + 'static>: ContextFetcher<R> {
    async fn filter(&self, ctx: &CallContext, filters: &[FilterFn<R>]) -> StoreResult<Vec<R>> {
        let records = self.fetch(ctx).await?;
        Ok(apply_filters(records, filters))
    }
}

#[async_trait]
pub trait ContextMutableRefStore<K: Send + Sync + 'static, R: Send + 'static>: Send + Sync {
    async fn add(&self, ctx: &CallContext, record: R) -> StoreResult<()>;

    async fn upsert(&self, ctx: &CallContext, record: R) -> StoreResult<()>;

    async fn update(&self, ctx: &CallContext, record: R) -> StoreResult<()>;

    async fn delete(&self, ctx: &CallContext, key: &K) -> StoreResult<()>;
}

#[async_trait]
pub trait ContextMutableStore<K: Send + Sync + 'static, R: Send + 'static>: Send + Sync {
    async fn add(&self, ctx: &CallContext, record: R) -> StoreResult<()>;

    async fn upsert(
        &self,
        ctx: &CallContext,
        key: &K,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()>;

    async fn update(
        &self,
        ctx: &CallContext,
        key: &K,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()>;

    async fn delete(&self, ctx: &CallContext, key: &K) -> StoreResult<()>;
}

#[async_trait]
pub trait ContextUnaryStore<R: Send + 'static>: Send + Sync {
    async fn get_with_options(&self, ctx: &CallContext, options: GetOptions) -> StoreResult<R>;

    async fn get(&self, ctx: &CallContext) -> StoreResult<R> {
        self.get_with_options(ctx, GetOptions::default()).await
    }
}

#[async_trait]
pub trait ContextMutableUnaryStore<R: Send + 'static>: ContextUnaryStore<R> {
    async fn set(
        &self,
        ctx: &CallContext,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()>;
}
