//! Moves datastore contents between a local store and the remote catalog.
//!
//! - [`load`] reads one catalog scope into a sealed local datastore
//! - [`sync`] pushes a local datastore to the catalog
//! - [`merge`] pushes a changeset's datastore to the catalog
//!
//! Collections are always processed in the same order: address refs, chain
//! metadata, contract metadata, env metadata. Pushes run inside one catalog
//! transaction and stop at the first failure.

pub mod error;
pub mod sync;

pub use error::{Collection, SyncError, SyncResult};
pub use sync::{load, merge, sync, SyncReport};
