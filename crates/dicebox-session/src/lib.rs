//! Player credentials and session bookkeeping for Dicebox.
//!
//! This crate holds all of the authentication service's state:
//!
//! 1. **Credentials**: who may log in ([`CredentialStore`])
//! 2. **Identity**: which player a username maps to ([`derive_player_id`])
//! 3. **Sessions**: who is logged in right now ([`SessionTable`]), with
//!    one live session per player and periodic eviction of stale ones
//!
//! Nothing here is thread-safe on its own. The authentication service
//! owns one of each behind a mutex and holds the lock for the whole of
//! every logical operation.
//!
//! ```text
//! Auth service (above)  ← locks, orchestrates login / logout / validate
//!     ↕
//! Session layer (this crate)  ← credentials, ids, session table
//!     ↕
//! Protocol layer (below)  ← PlayerId, SessionToken
//! ```

mod credentials;
mod error;
mod identity;
mod session;
mod table;

pub use credentials::CredentialStore;
pub use error::SessionError;
pub use identity::{PLAYER_ID_BYTES, derive_player_id};
pub use session::{Session, SessionConfig, SessionGrant, SweepReport, Timestamp};
pub use table::SessionTable;
