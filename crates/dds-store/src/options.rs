use std::fmt;
use std::sync::Arc;

use dds_types::Metadata;
use serde_json::Value;

use crate::error::StoreResult;

/// Combines `(current, incoming)` metadata into the payload that is written.
pub type MetadataUpdater =
    Arc<dyn Fn(&Metadata, &Metadata) -> StoreResult<Metadata> + Send + Sync>;

/// Options for metadata `update`, `upsert` and `set`.
#[derive(Clone, Default)]
pub struct UpdateOptions {
    updater: Option<MetadataUpdater>,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge stored and incoming metadata with `updater` instead of
    /// replacing the stored payload outright.
    pub fn with_updater<F>(mut self, updater: F) -> Self
    where
        F: Fn(&Metadata, &Metadata) -> StoreResult<Metadata> + Send + Sync + 'static,
    {
        self.updater = Some(Arc::new(updater));
        self
    }

    pub fn has_updater(&self) -> bool {
        self.updater.is_some()
    }

    /// Produce the payload to write.
    ///
    /// Without an updater, or when nothing is stored yet, the incoming
    /// payload is returned unchanged.
    pub fn apply(&self, current: Option<&Metadata>, incoming: Metadata) -> StoreResult<Metadata> {
        match (current, &self.updater) {
            (Some(current), Some(updater)) => updater(current, &incoming),
            _ => Ok(incoming),
        }
    }
}

impl fmt::Debug for UpdateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateOptions")
            .field("updater", &self.updater.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Updater that merges top-level object keys, incoming keys winning.
///
/// If either side is not a JSON object the incoming payload replaces the
/// stored one.
pub fn shallow_merge(current: &Metadata, incoming: &Metadata) -> StoreResult<Metadata> {
    match (current.to_value()?, incoming.to_value()?) {
        (Value::Object(mut base), Value::Object(update)) => {
            for (key, value) in update {
                base.insert(key, value);
            }
            Ok(Metadata::from_value(Value::Object(base)))
        }
        (_, incoming) => Ok(Metadata::from_value(incoming)),
    }
}

/// Options for `get`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Read the last committed value even inside an open transaction.
    pub ignore_transactions: bool,
}

impl GetOptions {
    pub fn outside_transaction() -> Self {
        Self {
            ignore_transactions: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;

    #[test]
    fn default_is_identity_replacement() {
        let options = UpdateOptions::new();
        let current = Metadata::from_value(json!({"a": 1}));
        let out = options
            .apply(Some(&current), Metadata::from_value(json!({"b": 2})))
            .unwrap();
        assert_eq!(out, Metadata::from_value(json!({"b": 2})));
    }

    #[test]
    fn updater_skipped_when_nothing_stored() {
        let options = UpdateOptions::new()
            .with_updater(|_, _| Err(StoreError::Updater("must not run".into())));
        let out = options.apply(None, Metadata::from_value(json!(1))).unwrap();
        assert_eq!(out, Metadata::from_value(json!(1)));
    }

    #[test]
    fn updater_errors_propagate() {
        let options = UpdateOptions::new()
            .with_updater(|_, _| Err(StoreError::Updater("conflict".into())));
        let err = options
            .apply(Some(&Metadata::null()), Metadata::null())
            .unwrap_err();
        assert!(matches!(err, StoreError::Updater(_)));
    }

    #[test]
    fn shallow_merge_prefers_incoming_keys() {
        let current = Metadata::from_json(r#"{"a":1,"b":{"x":1}}"#).unwrap();
        let incoming = Metadata::from_value(json!({"b": {"y": 2}, "c": 3}));
        let merged = shallow_merge(&current, &incoming).unwrap();
        assert_eq!(
            merged.to_value().unwrap(),
            json!({"a": 1, "b": {"y": 2}, "c": 3})
        );
    }

    #[test]
    fn shallow_merge_replaces_non_objects() {
        let merged = shallow_merge(
            &Metadata::from_value(json!([1, 2])),
            &Metadata::from_value(json!({"a": 1})),
        )
        .unwrap();
        assert_eq!(merged.to_value().unwrap(), json!({"a": 1}));
    }

    #[test]
    fn outside_transaction_flag() {
        assert!(GetOptions::outside_transaction().ignore_transactions);
        assert!(!GetOptions::default().ignore_transactions);
    }
}
