//! Player id derivation.
//!
//! A player id is the first [`PLAYER_ID_BYTES`] bytes of the SHA-256 digest
//! of the username, hex-encoded. The mapping is pure: the same username
//! always yields the same id, and the password plays no part. Eight hex
//! characters can collide; at this system's scale that is accepted, and
//! the id is a lookup key, not a secret.

use dicebox_protocol::PlayerId;
use sha2::{Digest, Sha256};

use crate::SessionError;

/// How many digest bytes make up a player id (two hex chars each).
pub const PLAYER_ID_BYTES: usize = 4;

/// Derives the player id for `username`.
///
/// # Errors
/// Returns [`SessionError::EmptyUsername`] for an empty username.
pub fn derive_player_id(username: &str) -> Result<PlayerId, SessionError> {
    if username.is_empty() {
        return Err(SessionError::EmptyUsername);
    }

    let digest = Sha256::digest(username.as_bytes());
    let hex: String = digest[..PLAYER_ID_BYTES]
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();

    Ok(PlayerId::new(hex))
}
