//! Error types for the protocol layer.
//!
//! Each Dicebox crate defines its own error enum. A `ProtocolError`
//! always means a request or response could not be read or written,
//! never that a session or credential was rejected.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a response body failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// A request body was not valid JSON for the expected type.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The `Authorization` header could not be turned into a username
    /// and password.
    #[error("cannot decode the given credentials: {0}")]
    InvalidCredentials(String),

    /// A header that must be present is missing or not valid UTF-8.
    #[error("missing or malformed header: {0}")]
    InvalidHeader(&'static str),
}
