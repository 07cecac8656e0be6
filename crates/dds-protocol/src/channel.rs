//! The request/response call channel.
//!
//! The physical transport is supplied by the caller. Each catalog call
//! opens a fresh [`Exchange`], sends one framed request, receives one framed
//! response and closes the exchange. Dropping an exchange without closing it
//! aborts it.

use async_trait::async_trait;
use tracing::debug;

use crate::codec::CatalogCodec;
use crate::error::ProtocolResult;
use crate::message::{CatalogResponse, RequestEnvelope};

/// One open request/response exchange.
#[async_trait]
pub trait Exchange: Send {
    async fn send(&mut self, frame: Vec<u8>) -> ProtocolResult<()>;

    async fn recv(&mut self) -> ProtocolResult<Vec<u8>>;

    async fn close(self: Box<Self>) -> ProtocolResult<()>;
}

/// Opens exchanges against the catalog.
#[async_trait]
pub trait CallChannel: Send + Sync {
    async fn open(&self) -> ProtocolResult<Box<dyn Exchange>>;
}

/// Perform exactly one round trip. The exchange is closed whether or not the
/// round trip succeeded; a round-trip error takes precedence over a close
/// error.
pub async fn call_once(
    channel: &dyn CallChannel,
    envelope: &RequestEnvelope,
) -> ProtocolResult<CatalogResponse> {
    let frame = CatalogCodec::encode_request(envelope)?;
    debug!(
        request = envelope.request.type_name(),
        transaction = envelope.transaction_id.as_deref().unwrap_or("-"),
        bytes = frame.len(),
        "catalog exchange"
    );
    let mut exchange = channel.open().await?;
    let outcome: ProtocolResult<CatalogResponse> = async {
        exchange.send(frame).await?;
        let bytes = exchange.recv().await?;
        let (response, _) = CatalogCodec::decode_response(&bytes)?;
        Ok(response)
    }
    .await;
    let closed = exchange.close().await;
    let response = outcome?;
    closed?;
    Ok(response)
}
