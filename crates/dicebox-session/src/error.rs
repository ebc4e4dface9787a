//! Error types for the session layer.

/// Errors from credential checks and session lookups.
///
/// All of these are caused by client input. The service surfaces them to
/// the caller as-is and never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// A new-user login named a username that is already registered.
    #[error("username {0} already exists, cannot create new user")]
    UsernameTaken(String),

    /// A returning-user login named an unknown user or the wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The username is empty, so no player id can be derived from it.
    #[error("could not generate player id: username is empty")]
    EmptyUsername,

    /// The request carried no session token at all.
    #[error("no session id provided")]
    MissingToken,

    /// The token does not name a live session. It may never have existed,
    /// or it was logged out, superseded, or swept.
    #[error("invalid session")]
    InvalidSession,
}
