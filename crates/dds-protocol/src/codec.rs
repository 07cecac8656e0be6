use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{CatalogResponse, RequestEnvelope, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};

/// Codec for catalog requests and responses.
///
/// Frame layout: `[4 bytes BE len][1 byte tag][bincode payload]`, where
/// `len` counts the tag and the payload.
pub struct CatalogCodec;

impl CatalogCodec {
    pub fn encode_request(envelope: &RequestEnvelope) -> ProtocolResult<Vec<u8>> {
        frame(envelope.request.type_tag(), envelope)
    }

    /// Decode a framed request. Returns (envelope, bytes_consumed).
    pub fn decode_request(data: &[u8]) -> ProtocolResult<(RequestEnvelope, usize)> {
        let (tag, envelope, consumed): (u8, RequestEnvelope, usize) = unframe(data)?;
        if envelope.request.type_tag() != tag {
            return Err(ProtocolError::InvalidMessageType(tag));
        }
        if envelope.protocol_version != PROTOCOL_VERSION {
            return Err(ProtocolError::VersionMismatch {
                local: PROTOCOL_VERSION,
                remote: envelope.protocol_version,
            });
        }
        Ok((envelope, consumed))
    }

    pub fn encode_response(response: &CatalogResponse) -> ProtocolResult<Vec<u8>> {
        frame(response.body.type_tag(), response)
    }

    /// Decode a framed response. Returns (response, bytes_consumed).
    pub fn decode_response(data: &[u8]) -> ProtocolResult<(CatalogResponse, usize)> {
        let (tag, response, consumed): (u8, CatalogResponse, usize) = unframe(data)?;
        if response.body.type_tag() != tag {
            return Err(ProtocolError::InvalidMessageType(tag));
        }
        Ok((response, consumed))
    }
}

fn frame<T: Serialize>(tag: u8, message: &T) -> ProtocolResult<Vec<u8>> {
    let payload =
        bincode::serialize(message).map_err(|e| ProtocolError::Serialization(e.to_string()))?;
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: payload.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = (payload.len() + 1) as u32;
    let mut buf = Vec::with_capacity(4 + 1 + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.push(tag);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

fn unframe<T: DeserializeOwned>(data: &[u8]) -> ProtocolResult<(u8, T, usize)> {
    if data.len() < 5 {
        return Err(ProtocolError::FramingError("too short".into()));
    }
    let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if len < 1 {
        return Err(ProtocolError::FramingError("zero-length frame".into()));
    }
    if len - 1 > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len - 1,
            max: MAX_MESSAGE_SIZE,
        });
    }
    let total = 4 + len;
    if data.len() < total {
        return Err(ProtocolError::FramingError(format!(
            "incomplete: have {}, need {}",
            data.len(),
            total
        )));
    }
    let tag = data[4];
    let message = bincode::deserialize(&data[5..total])
        .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
    Ok((tag, message, total))
}
