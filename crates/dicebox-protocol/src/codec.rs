//! Codec trait and implementations for request and response bodies.
//!
//! Handlers never call `serde_json` directly; they go through a
//! [`Codec`] so the body format is chosen in one place.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to body bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec lives inside shared server
/// state that every connection task can reach.
pub trait Codec: Send + Sync + 'static {
    /// The `Content-Type` this codec produces.
    fn content_type(&self) -> &'static str;

    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. All Dicebox bodies are JSON.
///
/// ```rust
/// use dicebox_protocol::{Codec, JsonCodec, LoginRequest};
///
/// let codec = JsonCodec;
/// let request = LoginRequest { is_new_user: true, server_version: "0".into() };
///
/// let bytes = codec.encode(&request).unwrap();
/// let decoded: LoginRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(request, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{LoginResponse, PlayerId};

    #[test]
    fn test_decode_malformed_json_returns_decode_error() {
        let result: Result<LoginResponse, _> = JsonCodec.decode(b"{not json");

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_field_returns_decode_error() {
        let result: Result<LoginResponse, _> =
            JsonCodec.decode(br#"{"playerID":"abcd1234"}"#);

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_uses_wire_field_names() {
        let response = LoginResponse {
            player_id: PlayerId::new("0a1b2c3d"),
            server_version: "1700000000".into(),
        };

        let bytes = JsonCodec.encode(&response).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            r#"{"playerID":"0a1b2c3d","serverVersion":"1700000000"}"#
        );
    }

    #[test]
    fn test_content_type_is_json() {
        assert_eq!(JsonCodec.content_type(), "application/json");
    }
}
