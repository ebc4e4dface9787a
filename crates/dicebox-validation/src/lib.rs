//! Session validation for Dicebox services.
//!
//! The authentication service is the only owner of session state. Every
//! other service (config, profile, stats, gameplay) answers the question
//! "is this caller logged in?" through the [`RequestValidator`]
//! capability:
//!
//! - [`HttpValidator`] forwards the request's `Session-Id` header to the
//!   auth service's internal validation endpoint with a bounded timeout.
//! - The auth service itself implements the trait in-process, for
//!   deployments that run everything in one binary.
//! - Tests plug in a fake.
//!
//! Whatever the cause of a failure, the calling service answers its own
//! client with 401 ([`unauthorized_response`]). The cause only shows up
//! in logs.

#![allow(async_fn_in_trait)]

mod error;
mod http;
mod validator;

pub use error::ValidationError;
pub use http::HttpValidator;
pub use validator::{
    RequestValidator, UNAUTHORIZED_CHALLENGE, session_token, unauthorized_response,
};
