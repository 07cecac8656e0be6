//! Precision-preserving deep copies.
//!
//! [`deep_clone`] pushes a value through a full JSON serialize/deserialize
//! round trip. The workspace enables serde_json's `arbitrary_precision`
//! feature, so numbers are carried as their literal digits instead of being
//! squeezed through `f64`: chain selectors, token amounts and any other
//! integer wider than 53 bits come back unchanged.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{TypeError, TypeResult};

/// Produce an independent copy of `value` via a serialize/deserialize round
/// trip.
///
/// The result shares no allocation with the source, and every number inside
/// nested opaque metadata keeps its exact textual representation.
pub fn deep_clone<T>(value: &T) -> TypeResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let bytes =
        serde_json::to_vec(value).map_err(|e| TypeError::Serialization(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| TypeError::Decode(e.to_string()))
}
