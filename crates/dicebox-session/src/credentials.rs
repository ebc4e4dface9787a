//! The credential store: username → password.
//!
//! Entries are created by a new-user login and never change or go away.
//! Passwords are kept as given. Hardening that is out of scope for this
//! memory-only backend.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use dicebox_protocol::PlayerId;

use crate::{SessionError, derive_player_id};

/// Registered usernames and their passwords.
#[derive(Debug, Default)]
pub struct CredentialStore {
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new user, or checks a returning user's password.
    ///
    /// The player id is derived before the store is touched, so a username
    /// that cannot produce an id is never stored.
    ///
    /// # Errors
    /// - [`SessionError::EmptyUsername`]: no id can be derived
    /// - [`SessionError::UsernameTaken`]: `is_new_user` and the name exists
    /// - [`SessionError::InvalidCredentials`]: returning user unknown or
    ///   password mismatch
    pub fn register_or_verify(
        &mut self,
        username: &str,
        password: &str,
        is_new_user: bool,
    ) -> Result<PlayerId, SessionError> {
        let player_id = derive_player_id(username)?;

        if is_new_user {
            match self.credentials.entry(username.to_owned()) {
                Entry::Occupied(_) => {
                    return Err(SessionError::UsernameTaken(username.to_owned()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(password.to_owned());
                }
            }
            tracing::info!(%player_id, "new user registered");
        } else {
            match self.credentials.get(username) {
                Some(stored) if stored == password => {}
                _ => return Err(SessionError::InvalidCredentials),
            }
        }

        Ok(player_id)
    }

    /// Returns `true` if `username` is registered.
    pub fn contains(&self, username: &str) -> bool {
        self.credentials.contains_key(username)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}
