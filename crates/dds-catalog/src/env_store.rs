use std::sync::Arc;

use async_trait::async_trait;
use dds_protocol::{
    CatalogRequest, EditSemantics, EnvMetadataKeyFilter, EnvMetadataRecord, ResponseBody,
};
use dds_store::{
    CallContext, ContextMutableUnaryStore, ContextUnaryStore, GetOptions, StoreError, StoreResult,
    UpdateOptions,
};
use dds_types::{EnvMetadata, Metadata, RecordKind};
use tracing::debug;

use crate::client::CatalogClient;
use crate::entity::unexpected_body;
use crate::errors::{classify_remote_error, RemoteOperation};
use crate::version_cache::VersionCache;

/// The env metadata singleton of one domain and environment.
///
/// Row versions are cached under the client's `domain/environment` scope.
pub struct CatalogEnvMetadataStore {
    client: Arc<CatalogClient>,
    versions: VersionCache,
}

impl CatalogEnvMetadataStore {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self {
            client,
            versions: VersionCache::new(),
        }
    }

    pub fn cached_version(&self) -> i64 {
        let transaction = self.client.transaction_id();
        self.versions
            .get(transaction.as_deref(), &self.client.config().scope())
    }

    pub(crate) fn finish_transaction(&self, transaction_id: &str, committed: bool) {
        self.versions.finish_transaction(transaction_id, committed);
    }

    fn filter(&self) -> EnvMetadataKeyFilter {
        EnvMetadataKeyFilter {
            domain: Some(self.client.domain().to_string()),
            environment: Some(self.client.environment().to_string()),
        }
    }
}

impl std::fmt::Debug for CatalogEnvMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogEnvMetadataStore")
            .field("scope", &self.client.config().scope())
            .field("cached_version", &self.cached_version())
            .finish()
    }
}

#[async_trait]
impl ContextUnaryStore<EnvMetadata> for CatalogEnvMetadataStore {
    async fn get_with_options(
        &self,
        ctx: &CallContext,
        options: GetOptions,
    ) -> StoreResult<EnvMetadata> {
        let scope = self.client.config().scope();
        let request = CatalogRequest::FindEnvMetadata {
            filter: self.filter(),
        };
        let response = if options.ignore_transactions {
            self.client.call_outside_transaction(ctx, request).await?
        } else {
            self.client.call(ctx, request).await?
        };
        if !response.is_success() {
            return Err(classify_remote_error(
                RecordKind::EnvMetadata,
                &scope,
                RemoteOperation::Find,
                response.error_message(),
            ));
        }
        let row = match response.body {
            ResponseBody::EnvMetadata(rows) => rows.into_iter().next(),
            other => return Err(unexpected_body(RecordKind::EnvMetadata, &other)),
        };
        let row = row.ok_or(StoreError::EnvMetadataNotSet)?;
        let transaction = self.client.transaction_id();
        if !options.ignore_transactions || transaction.is_none() {
            self.versions
                .set(transaction.as_deref(), scope.as_str(), row.row_version);
        }
        Ok(EnvMetadata::new(Metadata::from_json(row.metadata)?))
    }
}

#[async_trait]
impl ContextMutableUnaryStore<EnvMetadata> for CatalogEnvMetadataStore {
    async fn set(
        &self,
        ctx: &CallContext,
        metadata: Metadata,
        options: UpdateOptions,
    ) -> StoreResult<()> {
        let scope = self.client.config().scope();
        let current = match self.get(ctx).await {
            Ok(env) => Some(env.metadata),
            Err(err) if err.is_not_set() => None,
            Err(err) => return Err(err),
        };
        let merged = options.apply(current.as_ref(), metadata)?;
        let transaction = self.client.transaction_id();
        let expected = self.versions.get(transaction.as_deref(), &scope);
        let request = CatalogRequest::EditEnvMetadata {
            record: EnvMetadataRecord {
                domain: self.client.domain().to_string(),
                environment: self.client.environment().to_string(),
                metadata: merged.to_json()?,
                row_version: expected,
            },
            semantics: EditSemantics::Upsert,
        };
        let response = self.client.call(ctx, request).await?;
        if !response.is_success() {
            return Err(classify_remote_error(
                RecordKind::EnvMetadata,
                &scope,
                RemoteOperation::Edit,
                response.error_message(),
            ));
        }
        let row_version = self.versions.advance(transaction.as_deref(), &scope);
        debug!(%scope, row_version, "catalog env metadata set");
        Ok(())
    }
}
