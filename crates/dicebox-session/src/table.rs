//! The session table: every live session, indexed both ways.
//!
//! Responsibilities:
//! - Issuing a session when a player logs in, replacing any older one
//! - Refreshing a session's last action on every validation
//! - Deleting a session on logout
//! - Evicting sessions nobody has used for too long
//!
//! # Concurrency note
//!
//! `SessionTable` is a plain pair of `HashMap`s with no locking. The
//! authentication service keeps it behind a single mutex so that both
//! maps always change together. Never hand out the maps themselves.

use std::collections::HashMap;
use std::time::Duration;

use dicebox_protocol::{PlayerId, SessionToken};

use crate::{Session, SessionError, SessionGrant, SweepReport, Timestamp};

/// All live sessions.
///
/// ## Lifecycle
///
/// ```text
/// create_or_replace() ──→ touch() ... touch() ──→ delete()
///         │                                         ↑
///         │ (same player logs in again)             │
///         └───────────── supersedes ────────────────┤
///                                                   │
///                         sweep() (stale) ──────────┘
/// ```
#[derive(Debug, Default)]
pub struct SessionTable {
    /// Sessions keyed by token. The source of truth.
    sessions: HashMap<SessionToken, Session>,

    /// Reverse index: the single live token of each player.
    ///
    /// Kept in sync with `sessions` by every mutating method. This is what
    /// makes "one session per player" a lookup rather than a scan.
    by_player: HashMap<PlayerId, SessionToken>,

    /// Microsecond value of the last token issued. New tokens are always
    /// strictly greater, so two logins in the same microsecond still get
    /// distinct tokens.
    last_issued: i64,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new session for `player_id`, deleting the player's previous
    /// session first if there is one.
    ///
    /// This is the only place a session is created, and so the only place
    /// the one-session-per-player rule has to be enforced.
    pub fn create_or_replace(&mut self, player_id: PlayerId, now: Timestamp) -> SessionGrant {
        let superseded = match self.by_player.get(&player_id).cloned() {
            Some(old) => match self.delete(old.as_str()) {
                Ok(_) => {
                    tracing::info!(%player_id, "existing session superseded by new login");
                    Some(old)
                }
                Err(e) => {
                    // Reverse index pointed at a token that is already gone.
                    tracing::warn!(%player_id, error = %e, "dangling reverse index entry");
                    self.by_player.remove(&player_id);
                    None
                }
            },
            None => None,
        };

        let token = self.issue_token(now);
        let session = Session {
            player_id: player_id.clone(),
            token: token.clone(),
            last_action: now.unix_secs(),
        };

        self.sessions.insert(token.clone(), session);
        self.by_player.insert(player_id.clone(), token.clone());

        tracing::debug!(%player_id, "session created");

        SessionGrant { token, superseded }
    }

    /// Marks the session as used at `now` and returns its player.
    ///
    /// `last_action` never moves backwards, even if `now` is earlier than
    /// the stored value.
    ///
    /// # Errors
    /// - [`SessionError::MissingToken`]: `token` is empty
    /// - [`SessionError::InvalidSession`]: no such session
    pub fn touch(&mut self, token: &str, now: Timestamp) -> Result<PlayerId, SessionError> {
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }

        let session = self
            .sessions
            .get_mut(token)
            .ok_or(SessionError::InvalidSession)?;

        session.last_action = session.last_action.max(now.unix_secs());
        Ok(session.player_id.clone())
    }

    /// Removes a session and its reverse-index entry.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidSession`] if the token is not live.
    pub fn delete(&mut self, token: &str) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .remove(token)
            .ok_or(SessionError::InvalidSession)?;

        // Only drop the index entry if it still points at this token.
        if self
            .by_player
            .get(&session.player_id)
            .is_some_and(|current| current.as_str() == token)
        {
            self.by_player.remove(&session.player_id);
        }

        Ok(session)
    }

    /// Deletes every session whose last action is more than `stale_after`
    /// before `now`.
    ///
    /// Each eviction goes through [`delete`](Self::delete) so the reverse
    /// index stays consistent. A failing entry is logged and counted; the
    /// scan always runs to the end.
    pub fn sweep(&mut self, now: Timestamp, stale_after: Duration) -> SweepReport {
        let stale: Vec<SessionToken> = self
            .sessions
            .values()
            .filter(|session| session.is_stale(now, stale_after))
            .map(|session| session.token.clone())
            .collect();

        let mut report = SweepReport::default();

        for token in stale {
            match self.delete(token.as_str()) {
                Ok(session) => {
                    tracing::debug!(
                        player_id = %session.player_id,
                        last_action = session.last_action,
                        "stale session evicted"
                    );
                    report.removed.push(session);
                }
                Err(e) => {
                    tracing::warn!(%token, error = %e, "failed to evict stale session");
                    report.failures += 1;
                }
            }
        }

        report
    }

    /// Looks up a session by token.
    pub fn get(&self, token: &str) -> Option<&Session> {
        self.sessions.get(token)
    }

    /// Returns the live token of a player, if any.
    pub fn token_for(&self, player_id: &PlayerId) -> Option<&SessionToken> {
        self.by_player.get(player_id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn issue_token(&mut self, now: Timestamp) -> SessionToken {
        let micros = now.unix_micros().max(self.last_issued.saturating_add(1));
        self.last_issued = micros;
        SessionToken::new(micros.to_string())
    }
}

// =========================================================================
// Tests
// =========================================================================
