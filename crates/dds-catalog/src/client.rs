use std::sync::{Arc, PoisonError, RwLock};

use dds_protocol::{
    call_once, CallChannel, CatalogRequest, CatalogResponse, RequestEnvelope, ResponseBody,
};
use dds_store::{CallContext, StoreError, StoreResult};
use tracing::{debug, info};

use crate::config::CatalogConfig;

/// Connection to the remote catalog, scoped to one domain and environment.
///
/// Tracks the id of the open remote transaction; every request sent while
/// one is open carries it.
pub struct CatalogClient {
    channel: Arc<dyn CallChannel>,
    config: CatalogConfig,
    transaction: RwLock<Option<String>>,
}

impl CatalogClient {
    pub fn new(channel: Arc<dyn CallChannel>, config: CatalogConfig) -> Self {
        Self {
            channel,
            config,
            transaction: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn domain(&self) -> &str {
        &self.config.domain
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    pub fn transaction_id(&self) -> Option<String> {
        self.transaction
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction_id().is_some()
    }

    /// Send one request inside the open transaction, if any.
    pub async fn call(
        &self,
        ctx: &CallContext,
        request: CatalogRequest,
    ) -> StoreResult<CatalogResponse> {
        self.exchange(ctx, request, self.transaction_id()).await
    }

    /// Send one request outside any open transaction, observing only
    /// committed state.
    pub async fn call_outside_transaction(
        &self,
        ctx: &CallContext,
        request: CatalogRequest,
    ) -> StoreResult<CatalogResponse> {
        self.exchange(ctx, request, None).await
    }

    async fn exchange(
        &self,
        ctx: &CallContext,
        request: CatalogRequest,
        transaction_id: Option<String>,
    ) -> StoreResult<CatalogResponse> {
        let name = request.type_name();
        let envelope = RequestEnvelope::new(request).in_transaction(transaction_id);
        let ctx = ctx.child().with_timeout(self.config.request_timeout());
        let channel = self.channel.as_ref();
        ctx.run(async {
            call_once(channel, &envelope)
                .await
                .map_err(|e| StoreError::transport(name, e))
        })
        .await
    }

    pub async fn begin_transaction(&self, ctx: &CallContext) -> StoreResult<()> {
        if self.in_transaction() {
            return Err(StoreError::TransactionActive);
        }
        let response = self.call(ctx, CatalogRequest::BeginTransaction).await?;
        if !response.is_success() {
            return Err(remote_failure("begin transaction", &response));
        }
        match response.body {
            ResponseBody::TransactionBegun { transaction_id } => {
                info!(scope = %self.config.scope(), %transaction_id, "catalog transaction started");
                *self.transaction.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(transaction_id);
                Ok(())
            }
            other => Err(StoreError::Remote {
                context: "begin transaction".into(),
                message: format!("unexpected response body {}", other.type_name()),
            }),
        }
    }

    /// Commit the open transaction. The local transaction id is cleared
    /// only when the catalog confirms the commit; after a failure the
    /// transaction is still open and must be rolled back.
    pub async fn commit_transaction(&self, ctx: &CallContext) -> StoreResult<()> {
        let transaction_id = self.transaction_id().ok_or(StoreError::NoActiveTransaction)?;
        let response = self.call(ctx, CatalogRequest::CommitTransaction).await?;
        if !response.is_success() {
            return Err(remote_failure("commit transaction", &response));
        }
        self.clear_transaction();
        info!(scope = %self.config.scope(), %transaction_id, "catalog transaction committed");
        Ok(())
    }

    /// Roll back the open transaction. The local transaction id is cleared
    /// whether or not the rollback succeeds.
    pub async fn rollback_transaction(&self, ctx: &CallContext) -> StoreResult<()> {
        let transaction_id = self.transaction_id().ok_or(StoreError::NoActiveTransaction)?;
        let result = self.call(ctx, CatalogRequest::RollbackTransaction).await;
        self.clear_transaction();
        let response = result?;
        if !response.is_success() {
            return Err(remote_failure("rollback transaction", &response));
        }
        info!(scope = %self.config.scope(), %transaction_id, "catalog transaction rolled back");
        Ok(())
    }

    fn clear_transaction(&self) {
        let previous = self
            .transaction
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!(transaction = ?previous, "cleared catalog transaction id");
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("config", &self.config)
            .field("transaction", &self.transaction_id())
            .finish_non_exhaustive()
    }
}

fn remote_failure(context: &str, response: &CatalogResponse) -> StoreError {
    StoreError::Remote {
        context: context.to_string(),
        message: response.error_message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryCatalogService, LoopbackChannel};
    use std::time::Duration;

    fn client(service: &Arc<InMemoryCatalogService>) -> CatalogClient {
        CatalogClient::new(
            Arc::new(LoopbackChannel::new(service.clone())),
            CatalogConfig::new("ccip", "staging"),
        )
    }

    #[tokio::test]
    async fn transaction_id_attached_and_cleared() {
        let service = Arc::new(InMemoryCatalogService::new());
        let client = client(&service);
        let ctx = CallContext::background();

        client.begin_transaction(&ctx).await.unwrap();
        assert!(client.in_transaction());
        assert!(matches!(
            client.begin_transaction(&ctx).await,
            Err(StoreError::TransactionActive)
        ));
        client.commit_transaction(&ctx).await.unwrap();
        assert!(!client.in_transaction());
        assert!(matches!(
            client.rollback_transaction(&ctx).await,
            Err(StoreError::NoActiveTransaction)
        ));
    }

    #[tokio::test]
    async fn failed_commit_keeps_transaction_for_rollback() {
        let service = Arc::new(InMemoryCatalogService::new());
        let client = client(&service);
        let ctx = CallContext::background();

        client.begin_transaction(&ctx).await.unwrap();
        service.fail_next("CommitTransaction", "catalog unavailable");
        let err = client.commit_transaction(&ctx).await.unwrap_err();
        assert!(matches!(err, StoreError::Remote { .. }));
        assert!(client.in_transaction());
        assert_eq!(service.open_transactions(), 1);

        client.rollback_transaction(&ctx).await.unwrap();
        assert!(!client.in_transaction());
        assert_eq!(service.open_transactions(), 0);
    }

    #[tokio::test]
    async fn commit_under_cancelled_context_is_not_sent() {
        let service = Arc::new(InMemoryCatalogService::new());
        let client = client(&service);
        let ctx = CallContext::background();

        client.begin_transaction(&ctx).await.unwrap();
        let sent = service.request_count();
        let cancelled = ctx.child();
        cancelled.cancel();
        let err = client.commit_transaction(&cancelled).await.unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
        assert_eq!(service.request_count(), sent);
        assert!(client.in_transaction());

        client.rollback_transaction(&ctx).await.unwrap();
        assert_eq!(service.open_transactions(), 0);
    }

    #[tokio::test]
    async fn cancelled_context_aborts_call() {
        let service = Arc::new(InMemoryCatalogService::new());
        let client = client(&service);
        let ctx = CallContext::background();
        ctx.cancel();
        let err = client
            .call(&ctx, CatalogRequest::BeginTransaction)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled));
        assert_eq!(service.request_count(), 0);
    }

    #[tokio::test]
    async fn expired_deadline_aborts_call() {
        let service = Arc::new(InMemoryCatalogService::new());
        let client = client(&service);
        let ctx = CallContext::background().with_timeout(Duration::ZERO);
        let err = client
            .call(&ctx, CatalogRequest::BeginTransaction)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DeadlineExceeded));
    }
}
