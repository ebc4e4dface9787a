//! Core protocol types for Dicebox's wire format.
//!
//! These are the identifiers and JSON bodies that travel between the
//! client, the authentication service, and the sibling services.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable, short identifier for a player.
///
/// Derived from the username (see `dicebox_session::derive_player_id`) and
/// used by every service as the player's primary key. Serialized as a bare
/// string, so `PlayerId::new("0a1b2c3d")` is `"0a1b2c3d"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps an already-derived identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An opaque session token, as carried in the `Session-Id` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the token, returning the raw string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for SessionToken {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Login bodies
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
///
/// `server_version` is the incarnation version the client last received.
/// A client that does not know the current incarnation is provisioned as
/// a new user regardless of `is_new_user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub is_new_user: bool,
    pub server_version: String,
}

/// Body of a successful login response. The session token itself travels
/// in the `Session-Id` response header, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "playerID")]
    pub player_id: PlayerId,
    #[serde(rename = "serverVersion")]
    pub server_version: String,
}
