//! # Dicebox
//!
//! Authentication and session service for the Dicebox dice-game backend.
//!
//! Players log in with HTTP Basic credentials and get a session token in
//! the `Session-Id` header. Every other Dicebox service presents that
//! header back to this one (`POST /auth/validation-internal`) before
//! doing any work. Sessions idle for too long are swept periodically.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dicebox::prelude::*;
//!
//! # async fn start() -> Result<(), DiceboxError> {
//! let server = AuthServer::builder()
//!     .bind("0.0.0.0:40001")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! Collaborator services guard their handlers with a
//! [`RequestValidator`](dicebox_validation::RequestValidator): an
//! [`HttpValidator`](dicebox_validation::HttpValidator) when the auth
//! service runs elsewhere, or the [`AuthService`] itself in-process.

mod error;
mod handler;
mod server;
mod service;
mod sweeper;

pub mod cli;
pub mod config;
pub mod logging;
pub mod signals;

pub use error::{AuthError, DiceboxError};
pub use handler::AuthRouter;
pub use server::{AuthServer, AuthServerBuilder};
pub use service::{AuthService, LoginOutcome};
pub use sweeper::SessionSweeper;

pub mod prelude {
    pub use crate::config::AppConfig;
    pub use crate::{
        AuthError, AuthRouter, AuthServer, AuthServerBuilder, AuthService, DiceboxError,
        LoginOutcome, SessionSweeper,
    };
    pub use dicebox_protocol::{
        BasicCredentials, LoginRequest, LoginResponse, PlayerId, SESSION_ID_HEADER, SessionToken,
    };
    pub use dicebox_session::SessionConfig;
    pub use dicebox_validation::{
        HttpValidator, RequestValidator, ValidationError, unauthorized_response,
    };
}
