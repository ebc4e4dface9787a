//! HTTP transport layer for Dicebox.
//!
//! Every Dicebox service is an HTTP/1.1 server. This crate owns the
//! socket side of that: binding a listener ([`HttpTransport`]), accepting
//! connections ([`HttpConnection`]), and driving hyper on each one until it
//! closes or the server asks it to shut down gracefully.
//!
//! Routing and request semantics live above this crate; here a request
//! handler is just an async function from request to response.

mod error;
mod http;

pub use error::TransportError;
pub use http::{HttpConnection, HttpTransport, ResponseBody, full_body};

use std::fmt;

/// Opaque identifier for an accepted connection, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
