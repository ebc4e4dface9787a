//! Session types: the records the session table stores and the values it
//! hands back.
//!
//! A session records:
//! - WHO is logged in (`PlayerId`)
//! - WHICH token proves it (`SessionToken`)
//! - WHEN the player was last seen (unix seconds), for staleness checks

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dicebox_protocol::{PlayerId, SessionToken};

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A wall-clock instant with microsecond resolution.
///
/// Sessions are stamped with wall-clock time rather than `Instant` because
/// tokens are derived from it and staleness is measured in unix seconds.
/// Every table operation takes the current time as an argument, which
/// keeps the table itself free of clock reads and easy to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    unix_micros: i64,
}

impl Timestamp {
    /// The current system time. Clocks set before 1970 read as the epoch.
    pub fn now() -> Self {
        let unix_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self { unix_micros }
    }

    pub fn from_unix_secs(secs: i64) -> Self {
        Self {
            unix_micros: secs.saturating_mul(1_000_000),
        }
    }

    pub fn from_unix_micros(unix_micros: i64) -> Self {
        Self { unix_micros }
    }

    pub fn unix_secs(&self) -> i64 {
        self.unix_micros.div_euclid(1_000_000)
    }

    pub fn unix_micros(&self) -> i64 {
        self.unix_micros
    }

    /// `self - d`, clamped instead of overflowing.
    pub fn saturating_sub(self, d: Duration) -> Self {
        let micros = i64::try_from(d.as_micros()).unwrap_or(i64::MAX);
        Self {
            unix_micros: self.unix_micros.saturating_sub(micros),
        }
    }

    /// `self + d`, clamped instead of overflowing.
    pub fn saturating_add(self, d: Duration) -> Self {
        let micros = i64::try_from(d.as_micros()).unwrap_or(i64::MAX);
        Self {
            unix_micros: self.unix_micros.saturating_add(micros),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// How often stale sessions are swept and what counts as stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time between two sweeps. Default: 6 hours.
    pub sweep_interval: Duration,

    /// A session whose last action is older than this is evicted by the
    /// next sweep. Default: 24 hours.
    pub stale_after: Duration,
}

impl SessionConfig {
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);
    pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Self::DEFAULT_SWEEP_INTERVAL,
            stale_after: Self::DEFAULT_STALE_AFTER,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One live login.
///
/// The lifecycle has no intermediate states:
///
/// ```text
///   (none) ──login──→ active ──logout / sweep / re-login──→ (deleted)
///                      ↺ touch (last_action moves forward)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The player this session authenticates.
    pub player_id: PlayerId,

    /// The token the client presents in `Session-Id`.
    pub token: SessionToken,

    /// Unix seconds of the login or the most recent successful validation.
    pub last_action: i64,
}

impl Session {
    /// Returns `true` if more than `stale_after` has passed since the last
    /// action, as seen at `now`.
    pub fn is_stale(&self, now: Timestamp, stale_after: Duration) -> bool {
        let limit = i64::try_from(stale_after.as_secs()).unwrap_or(i64::MAX);
        now.unix_secs().saturating_sub(self.last_action) > limit
    }
}

/// What [`SessionTable::create_or_replace`](crate::SessionTable::create_or_replace)
/// hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// The newly issued token.
    pub token: SessionToken,

    /// The player's previous token, if one was live and has now been
    /// deleted.
    pub superseded: Option<SessionToken>,
}

/// Outcome of one sweep over the session table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Sessions that were evicted.
    pub removed: Vec<Session>,

    /// Stale entries that could not be deleted. Logged and skipped.
    pub failures: usize,
}

impl SweepReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// `true` when the sweep neither removed nor failed on anything.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.failures == 0
    }
}
