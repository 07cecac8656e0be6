//! Wire contract between the deployment datastore and the remote catalog.
//!
//! Defines the request/response messages, their framing, and the call
//! channel over which exactly one request and one response travel per
//! exchange.

pub mod channel;
pub mod codec;
pub mod error;
pub mod message;

pub use channel::{call_once, CallChannel, Exchange};
pub use codec::CatalogCodec;
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    AddressRefKeyFilter, AddressRefRecord, CatalogRequest, CatalogResponse,
    ChainMetadataKeyFilter, ChainMetadataRecord, ContractMetadataKeyFilter,
    ContractMetadataRecord, EditSemantics, EnvMetadataKeyFilter, EnvMetadataRecord,
    RequestEnvelope, ResponseBody, ResponseStatus, MAX_MESSAGE_SIZE, PROTOCOL_VERSION,
};
