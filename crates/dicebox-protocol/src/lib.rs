//! Wire protocol for Dicebox services.
//!
//! Every Dicebox service speaks JSON over HTTP. This crate holds the
//! pieces they all have to agree on:
//!
//! - **Types** ([`PlayerId`], [`SessionToken`], [`LoginRequest`],
//!   [`LoginResponse`]): the bodies and identifiers that cross service
//!   boundaries.
//! - **Credentials** ([`BasicCredentials`]): decoding of the
//!   `Authorization: Basic …` header sent on login.
//! - **Constants** ([`SESSION_ID_HEADER`], route paths, service ports,
//!   [`INTERNAL_REQUEST_DEADLINE`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): body (de)serialization.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! HTTP (bytes) → Protocol (typed bodies) → Session (player context)
//! ```

mod codec;
mod constants;
mod credentials;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use constants::{
    AUTH_SERVICE_PORT, CONFIG_SERVICE_PORT, DATA_SERVICE_PORT,
    GAMEPLAY_SERVICE_PORT, INTERNAL_REQUEST_DEADLINE, LOGIN_PATH,
    LOGOUT_PATH, PROFILE_SERVICE_PORT, SESSION_ID_HEADER,
    STATS_SERVICE_PORT, SUCCESS_BODY, VALIDATION_PATH,
};
pub use credentials::BasicCredentials;
pub use error::ProtocolError;
pub use types::{LoginRequest, LoginResponse, PlayerId, SessionToken};
