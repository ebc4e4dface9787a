//! Error types for the authentication service.

use dicebox_protocol::ProtocolError;
use dicebox_session::SessionError;
use dicebox_transport::TransportError;
use dicebox_validation::ValidationError;
use hyper::StatusCode;

/// Top-level error that wraps all crate-specific errors.
///
/// Startup code (config, bind, logging) deals with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum DiceboxError {
    /// A transport-level error (bind, accept, serve).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, credentials).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (credentials, session lookup).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A validation client error.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The configuration file is unreadable or holds invalid values.
    #[error("configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Why an auth endpoint refused a request.
///
/// Each variant maps to exactly one HTTP status via [`AuthError::status`],
/// and its `Display` text is the plain-text response body.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The router was built without a service.
    #[error("auth service is not initialized")]
    NotInitialized,

    #[error("received login request without the required header")]
    MissingCredentials,

    #[error("cannot decode the given credentials")]
    MalformedCredentials(#[source] ProtocolError),

    #[error("cannot decode the request body: {0}")]
    MalformedBody(String),

    #[error("could not create response")]
    Encode(#[source] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl AuthError {
    /// The status code sent for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::MalformedCredentials(_) | Self::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Session(SessionError::UsernameTaken(_) | SessionError::InvalidCredentials) => {
                StatusCode::BAD_REQUEST
            }
            Self::Session(SessionError::MissingToken | SessionError::InvalidSession) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Session(SessionError::EmptyUsername) | Self::NotInitialized | Self::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// True for failures that are the server's fault and worth an error log.
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}
