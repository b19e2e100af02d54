//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The push channel speaks JSON text frames today. The trait keeps the
//! connection handler independent of that choice.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task the server spawns.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use bricktopia_protocol::{Codec, JsonCodec, PushFrame};
///
/// let codec = JsonCodec;
/// let frame = PushFrame::History { messages: vec![] };
///
/// let bytes = codec.encode(&frame).unwrap();
/// let decoded: PushFrame = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Serializes a value into a JSON string, for text WebSocket frames.
    pub fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientChatFrame;

    #[test]
    fn test_decode_client_frame_without_color() {
        let frame: ClientChatFrame =
            JsonCodec.decode(br#"{"message": "hi"}"#).unwrap();
        assert_eq!(frame.message, "hi");
        assert!(frame.color.is_none());
    }

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<ClientChatFrame, _> =
            JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_text_produces_valid_json() {
        let text = JsonCodec
            .encode_text(&crate::PushFrame::History { messages: vec![] })
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "history");
    }
}
