use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Last observed row version per record key.
///
/// Owned by a single store instance and never shared. Keys that were never
/// observed read as version `0`.
///
/// Versions observed or advanced inside a remote transaction are staged
/// under that transaction's id. They are visible to later calls in the same
/// transaction and are merged into the committed versions by
/// [`finish_transaction`](Self::finish_transaction) on commit, or dropped on
/// rollback.
#[derive(Debug, Default)]
pub struct VersionCache {
    inner: RwLock<Versions>,
}

#[derive(Debug, Default)]
struct Versions {
    committed: HashMap<String, i64>,
    staged: Option<StagedVersions>,
}

#[derive(Debug)]
struct StagedVersions {
    transaction_id: String,
    versions: HashMap<String, i64>,
}

impl Versions {
    fn get(&self, transaction: Option<&str>, key: &str) -> i64 {
        let staged = match (transaction, &self.staged) {
            (Some(id), Some(staged)) if staged.transaction_id == id => staged.versions.get(key),
            _ => None,
        };
        staged
            .or_else(|| self.committed.get(key))
            .copied()
            .unwrap_or(0)
    }

    fn layer(&mut self, transaction: Option<&str>) -> &mut HashMap<String, i64> {
        let Some(id) = transaction else {
            return &mut self.committed;
        };
        // A layer left by a transaction that was never finished is stale.
        if self.staged.as_ref().is_some_and(|s| s.transaction_id != id) {
            self.staged = None;
        }
        &mut self
            .staged
            .get_or_insert_with(|| StagedVersions {
                transaction_id: id.to_string(),
                versions: HashMap::new(),
            })
            .versions
    }
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The version an edit of `key` sends, as seen from `transaction`.
    pub fn get(&self, transaction: Option<&str>, key: &str) -> i64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(transaction, key)
    }

    /// Overwrite the cached version with one reported by the server.
    pub fn set(&self, transaction: Option<&str>, key: impl Into<String>, version: i64) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .layer(transaction)
            .insert(key.into(), version);
    }

    /// Advance the cached version by one after a successful edit and return
    /// the new value. The server's actual new version is not read back.
    pub fn advance(&self, transaction: Option<&str>, key: &str) -> i64 {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = inner.get(transaction, key) + 1;
        inner.layer(transaction).insert(key.to_string(), next);
        next
    }

    /// Settle the versions staged under `transaction_id`: merge them into
    /// the committed versions when `committed`, otherwise drop them.
    pub fn finish_transaction(&self, transaction_id: &str, committed: bool) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.staged.take() {
            Some(staged) if staged.transaction_id == transaction_id => {
                if committed {
                    inner.committed.extend(staged.versions);
                }
            }
            other => inner.staged = other,
        }
    }

    /// Number of distinct keys with a cached version.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let staged_only = inner.staged.as_ref().map_or(0, |staged| {
            staged
                .versions
                .keys()
                .filter(|key| !inner.committed.contains_key(*key))
                .count()
        });
        inner.committed.len() + staged_only
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_key_is_zero() {
        let cache = VersionCache::new();
        assert_eq!(cache.get(None, "1"), 0);
        assert_eq!(cache.get(Some("tx"), "1"), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn advance_increments_by_one() {
        let cache = VersionCache::new();
        assert_eq!(cache.advance(None, "1"), 1);
        assert_eq!(cache.advance(None, "1"), 2);
        cache.set(None, "1", 7);
        assert_eq!(cache.advance(None, "1"), 8);
        assert_eq!(cache.get(None, "1"), 8);
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = VersionCache::new();
        let b = VersionCache::new();
        a.set(None, "k", 5);
        assert_eq!(b.get(None, "k"), 0);
    }

    #[test]
    fn staged_versions_merge_on_commit() {
        let cache = VersionCache::new();
        cache.set(None, "k", 1);
        assert_eq!(cache.advance(Some("tx"), "k"), 2);
        assert_eq!(cache.get(Some("tx"), "k"), 2);
        assert_eq!(cache.get(None, "k"), 1);

        cache.finish_transaction("tx", true);
        assert_eq!(cache.get(None, "k"), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn staged_versions_dropped_on_rollback() {
        let cache = VersionCache::new();
        cache.set(None, "k", 1);
        cache.advance(Some("tx"), "k");
        cache.advance(Some("tx"), "new");
        assert_eq!(cache.len(), 2);

        cache.finish_transaction("tx", false);
        assert_eq!(cache.get(None, "k"), 1);
        assert_eq!(cache.get(None, "new"), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn finishing_another_transaction_keeps_staged_layer() {
        let cache = VersionCache::new();
        cache.advance(Some("tx-2"), "k");
        cache.finish_transaction("tx-1", true);
        assert_eq!(cache.get(Some("tx-2"), "k"), 1);
        assert_eq!(cache.get(None, "k"), 0);
    }

    #[test]
    fn unfinished_layer_replaced_by_next_transaction() {
        let cache = VersionCache::new();
        cache.advance(Some("tx-1"), "k");
        cache.advance(Some("tx-2"), "other");
        assert_eq!(cache.get(Some("tx-2"), "k"), 0);
        cache.finish_transaction("tx-2", true);
        assert_eq!(cache.get(None, "k"), 0);
        assert_eq!(cache.get(None, "other"), 1);
    }
}
