use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dds_protocol::CallChannel;
use dds_store::{CallContext, StoreError, StoreResult};
use futures::FutureExt;
use tracing::warn;

use crate::client::CatalogClient;
use crate::config::CatalogConfig;
use crate::env_store::CatalogEnvMetadataStore;
use crate::store::{
    CatalogAddressRefStore, CatalogChainMetadataStore, CatalogContractMetadataStore,
};

/// The four catalog collections of one domain and environment, sharing a
/// client and its transaction.
#[derive(Debug)]
pub struct CatalogDataStore {
    client: Arc<CatalogClient>,
    addresses: CatalogAddressRefStore,
    chain_metadata: CatalogChainMetadataStore,
    contract_metadata: CatalogContractMetadataStore,
    env_metadata: CatalogEnvMetadataStore,
}

impl CatalogDataStore {
    pub fn new(channel: Arc<dyn CallChannel>, config: CatalogConfig) -> Self {
        let client = Arc::new(CatalogClient::new(channel, config));
        Self {
            addresses: CatalogAddressRefStore::new(client.clone()),
            chain_metadata: CatalogChainMetadataStore::new(client.clone()),
            contract_metadata: CatalogContractMetadataStore::new(client.clone()),
            env_metadata: CatalogEnvMetadataStore::new(client.clone()),
            client,
        }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn addresses(&self) -> &CatalogAddressRefStore {
        &self.addresses
    }

    pub fn chain_metadata(&self) -> &CatalogChainMetadataStore {
        &self.chain_metadata
    }

    pub fn contract_metadata(&self) -> &CatalogContractMetadataStore {
        &self.contract_metadata
    }

    pub fn env_metadata(&self) -> &CatalogEnvMetadataStore {
        &self.env_metadata
    }

    pub async fn begin_transaction(&self, ctx: &CallContext) -> StoreResult<()> {
        self.client.begin_transaction(ctx).await
    }

    /// Commit the open transaction and keep the row versions cached inside
    /// it. A failed commit leaves the transaction open.
    pub async fn commit_transaction(&self, ctx: &CallContext) -> StoreResult<()> {
        let transaction_id = self.client.transaction_id();
        self.client.commit_transaction(ctx).await?;
        if let Some(id) = transaction_id {
            self.finish_transaction(&id, true);
        }
        Ok(())
    }

    /// Roll back the open transaction and drop the row versions cached
    /// inside it, whether or not the catalog confirms the rollback.
    pub async fn rollback_transaction(&self, ctx: &CallContext) -> StoreResult<()> {
        let transaction_id = self.client.transaction_id();
        let result = self.client.rollback_transaction(ctx).await;
        if let Some(id) = transaction_id {
            self.finish_transaction(&id, false);
        }
        result
    }

    fn finish_transaction(&self, transaction_id: &str, committed: bool) {
        self.addresses.finish_transaction(transaction_id, committed);
        self.chain_metadata.finish_transaction(transaction_id, committed);
        self.contract_metadata.finish_transaction(transaction_id, committed);
        self.env_metadata.finish_transaction(transaction_id, committed);
    }

    /// Run `body` inside a remote transaction.
    ///
    /// Commits when `body` returns `Ok`. Rolls back when it returns `Err`,
    /// when it panics (the panic is resumed afterwards) or when the commit
    /// itself fails. The rollback runs under a fresh background context so
    /// a cancelled `ctx` cannot prevent it; a failed rollback is logged and
    /// the original outcome returned.
    pub async fn with_transaction<'s, T, E, F, Fut>(
        &'s self,
        ctx: &CallContext,
        body: F,
    ) -> Result<T, E>
    where
        F: FnOnce(&'s Self) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<StoreError>,
    {
        self.begin_transaction(ctx).await?;
        let outcome = AssertUnwindSafe(async move { body(self).await })
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(value)) => match self.commit_transaction(ctx).await {
                Ok(()) => Ok(value),
                Err(err) => {
                    self.rollback_detached().await;
                    Err(err.into())
                }
            },
            Ok(Err(err)) => {
                self.rollback_detached().await;
                Err(err)
            }
            Err(panic) => {
                self.rollback_detached().await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    async fn rollback_detached(&self) {
        if let Err(err) = self.rollback_transaction(&CallContext::background()).await {
            warn!(
                error = %err,
                scope = %self.client.config().scope(),
                "catalog transaction rollback failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryCatalogService, LoopbackChannel};
    use dds_store::{
        ContextGetter, ContextMutableRefStore, ContextMutableStore, ContextMutableUnaryStore,
        ContextUnaryStore, UpdateOptions,
    };
    use dds_types::{
        AddressRef, ChainMetadata, ChainMetadataKey, Metadata, PrimaryKeyHolder, Version,
    };
    use serde_json::json;

    fn datastore(service: &Arc<InMemoryCatalogService>) -> CatalogDataStore {
        CatalogDataStore::new(
            Arc::new(LoopbackChannel::new(service.clone())),
            CatalogConfig::new("ccip", "staging"),
        )
    }

    #[tokio::test]
    async fn committed_transaction_is_visible() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = datastore(&service);
        let ctx = &CallContext::background();

        let result: StoreResult<()> = store
            .with_transaction(ctx, |tx| async move {
                ContextMutableStore::add(
                    tx.chain_metadata(),
                    ctx,
                    ChainMetadata::new(1, Metadata::from_value(json!({"a": 1}))),
                )
                .await?;
                tx.env_metadata()
                    .set(ctx, Metadata::from_value(json!("env")), UpdateOptions::new())
                    .await
            })
            .await;
        result.unwrap();
        assert!(!store.client().in_transaction());

        let other = datastore(&service);
        assert!(other
            .chain_metadata()
            .get(ctx, &ChainMetadataKey::new(1))
            .await
            .is_ok());
        assert!(other.env_metadata().get(ctx).await.is_ok());
    }

    #[tokio::test]
    async fn failed_body_rolls_back() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = datastore(&service);
        let ctx = &CallContext::background();

        let result: StoreResult<()> = store
            .with_transaction(ctx, |tx| async move {
                ContextMutableStore::add(
                    tx.chain_metadata(),
                    ctx,
                    ChainMetadata::new(1, Metadata::null()),
                )
                .await?;
                Err(StoreError::Internal("boom".into()))
            })
            .await;
        assert!(matches!(result, Err(StoreError::Internal(_))));
        assert!(!store.client().in_transaction());
        let err = store
            .chain_metadata()
            .get(ctx, &ChainMetadataKey::new(1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(service.open_transactions(), 0);
    }

    #[tokio::test]
    async fn panicking_body_rolls_back_and_resumes() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = Arc::new(datastore(&service));

        let task_store = store.clone();
        let joined = tokio::spawn(async move {
            let ctx = &CallContext::background();
            let _: StoreResult<()> = task_store
                .with_transaction(ctx, |tx| async move {
                    ContextMutableStore::add(
                        tx.chain_metadata(),
                        ctx,
                        ChainMetadata::new(7, Metadata::null()),
                    )
                    .await?;
                    panic!("body panicked");
                })
                .await;
        })
        .await;
        assert!(joined.unwrap_err().is_panic());
        assert_eq!(service.open_transactions(), 0);
        assert!(!store.client().in_transaction());
        assert!(store
            .chain_metadata()
            .get(&CallContext::background(), &ChainMetadataKey::new(7))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn cancelled_context_still_rolls_back() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = datastore(&service);
        let ctx = &CallContext::background();

        let result: StoreResult<()> = store
            .with_transaction(ctx, |tx| async move {
                ContextMutableStore::add(
                    tx.chain_metadata(),
                    ctx,
                    ChainMetadata::new(2, Metadata::null()),
                )
                .await?;
                ctx.cancel();
                ContextMutableStore::add(
                    tx.chain_metadata(),
                    ctx,
                    ChainMetadata::new(3, Metadata::null()),
                )
                .await
            })
            .await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
        assert_eq!(service.open_transactions(), 0);
        assert!(!store.client().in_transaction());
    }

    #[tokio::test]
    async fn cancelled_context_at_commit_rolls_back() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = datastore(&service);
        let ctx = &CallContext::background();

        let result: StoreResult<()> = store
            .with_transaction(ctx, |tx| async move {
                ContextMutableStore::add(
                    tx.chain_metadata(),
                    ctx,
                    ChainMetadata::new(4, Metadata::null()),
                )
                .await?;
                ctx.cancel();
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
        assert_eq!(service.open_transactions(), 0);
        assert!(!store.client().in_transaction());
        assert!(store
            .chain_metadata()
            .get(&CallContext::background(), &ChainMetadataKey::new(4))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn rejected_commit_rolls_back() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = datastore(&service);
        let ctx = &CallContext::background();

        service.fail_next("CommitTransaction", "catalog unavailable");
        let result: StoreResult<()> = store
            .with_transaction(ctx, |tx| async move {
                ContextMutableStore::add(
                    tx.chain_metadata(),
                    ctx,
                    ChainMetadata::new(5, Metadata::null()),
                )
                .await
            })
            .await;
        assert!(matches!(result, Err(StoreError::Remote { .. })));
        assert_eq!(service.open_transactions(), 0);
        assert!(!store.client().in_transaction());
        assert!(store
            .chain_metadata()
            .get(ctx, &ChainMetadataKey::new(5))
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn rolled_back_edit_does_not_advance_cached_version() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = datastore(&service);
        let ctx = &CallContext::background();
        let router = AddressRef::new("0xrouter", 1, "Router", Version::new(1, 0, 0));
        let key = router.primary_key();

        ContextMutableRefStore::add(store.addresses(), ctx, router.clone())
            .await
            .unwrap();
        assert_eq!(store.addresses().cached_version(&key), 1);

        let result: StoreResult<()> = store
            .with_transaction(ctx, |tx| {
                let router = router.clone();
                async move {
                    ContextMutableRefStore::update(tx.addresses(), ctx, router).await?;
                    Err(StoreError::Internal("abort".into()))
                }
            })
            .await;
        assert!(matches!(result, Err(StoreError::Internal(_))));
        assert_eq!(store.addresses().cached_version(&key), 1);

        ContextMutableRefStore::update(store.addresses(), ctx, router.clone())
            .await
            .unwrap();
        assert_eq!(store.addresses().cached_version(&key), 2);
    }

    #[tokio::test]
    async fn committed_edit_keeps_cached_version() {
        let service = Arc::new(InMemoryCatalogService::new());
        let store = datastore(&service);
        let ctx = &CallContext::background();
        let router = AddressRef::new("0xrouter", 1, "Router", Version::new(1, 0, 0));
        let key = router.primary_key();

        ContextMutableRefStore::add(store.addresses(), ctx, router.clone())
            .await
            .unwrap();
        let result: StoreResult<()> = store
            .with_transaction(ctx, |tx| {
                let router = router.clone();
                async move { ContextMutableRefStore::update(tx.addresses(), ctx, router).await }
            })
            .await;
        result.unwrap();
        assert_eq!(store.addresses().cached_version(&key), 2);

        ContextMutableRefStore::update(store.addresses(), ctx, router)
            .await
            .unwrap();
        assert_eq!(store.addresses().cached_version(&key), 3);
    }
}
