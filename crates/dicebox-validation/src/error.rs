//! Error types for request validation.

use std::time::Duration;

use hyper::StatusCode;

/// Why a request could not be validated.
///
/// Every variant means "treat the caller as unauthenticated". The variants
/// exist so logs can tell a bad session apart from an unreachable auth
/// service; the client always sees 401.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The request has no `Session-Id` header.
    #[error("no session id header in the request")]
    MissingSessionHeader,

    /// The `Session-Id` header is present but not visible ASCII.
    #[error("session id header is malformed")]
    MalformedSessionHeader,

    /// The auth service answered with something other than 200.
    #[error("validation was not successful (status {0})")]
    Rejected(StatusCode),

    /// An in-process validator refused the session.
    #[error("session rejected: {0}")]
    Denied(String),

    /// The validation request could not be built.
    #[error("request creation error: {0}")]
    Request(String),

    /// The auth service could not be reached.
    #[error("request sending error: {0}")]
    Transport(String),

    /// The auth service did not answer within the deadline.
    #[error("validation request timed out after {0:?}")]
    TimedOut(Duration),
}

impl ValidationError {
    /// The status a calling service returns to its own client. Always 401.
    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    /// `true` when the failure came from the network rather than from the
    /// session itself.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::TimedOut(_))
    }
}
