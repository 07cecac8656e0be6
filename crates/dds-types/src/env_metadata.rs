use serde::{Deserialize, Serialize};

use crate::clone::deep_clone;
use crate::error::TypeResult;
use crate::metadata::Metadata;
use crate::record::{Cloneable, Record, RecordKind};

/// The singleton metadata record of a (domain, environment) scope. It has no
/// key: a scope holds at most one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvMetadata {
    pub metadata: Metadata,
}

impl EnvMetadata {
    pub fn new(metadata: Metadata) -> Self {
        Self { metadata }
    }
}

impl Cloneable for EnvMetadata {
    fn deep_clone(&self) -> TypeResult<Self> {
        deep_clone(self)
    }
}

impl Record for EnvMetadata {
    const KIND: RecordKind = RecordKind::EnvMetadata;
}
