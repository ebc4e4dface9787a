//! `RequestValidator` over HTTP: asks the auth service's internal endpoint.

use std::time::Duration;

use dicebox_protocol::{
    AUTH_SERVICE_PORT, INTERNAL_REQUEST_DEADLINE, SESSION_ID_HEADER, VALIDATION_PATH,
};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Request, StatusCode, Uri};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::{RequestValidator, ValidationError, session_token};

/// Validates requests by forwarding their `Session-Id` to
/// `POST /auth/validation-internal`.
///
/// The call is bounded by a timeout ([`INTERNAL_REQUEST_DEADLINE`] unless
/// overridden). A missing header fails locally without any network call.
#[derive(Clone)]
pub struct HttpValidator {
    endpoint: Uri,
    timeout: Duration,
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpValidator {
    /// Creates a validator for the auth service at `auth_base_url`
    /// (e.g. `http://127.0.0.1:40001`).
    ///
    /// # Errors
    /// Returns [`ValidationError::Request`] if the URL does not parse.
    pub fn new(auth_base_url: &str) -> Result<Self, ValidationError> {
        let endpoint: Uri = format!("{}{}", auth_base_url.trim_end_matches('/'), VALIDATION_PATH)
            .parse()
            .map_err(|e| {
                ValidationError::Request(format!("invalid auth url {auth_base_url}: {e}"))
            })?;

        Ok(Self {
            endpoint,
            timeout: INTERNAL_REQUEST_DEADLINE,
            client: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    /// A validator for an auth service on this host at its default port.
    pub fn local() -> Result<Self, ValidationError> {
        Self::new(&format!("http://127.0.0.1:{AUTH_SERVICE_PORT}"))
    }

    /// Overrides the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The full URL of the validation endpoint.
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl RequestValidator for HttpValidator {
    async fn validate_request(&self, headers: &HeaderMap) -> Result<(), ValidationError> {
        let token = session_token(headers)?;

        let request = Request::post(self.endpoint.clone())
            .header(SESSION_ID_HEADER, token)
            .body(Full::new(Bytes::new()))
            .map_err(|e| ValidationError::Request(e.to_string()))?;

        let pending = self.client.request(request);
        let response = match tokio::time::timeout(self.timeout, pending).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "auth service unreachable");
                return Err(ValidationError::Transport(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "validation request timed out"
                );
                return Err(ValidationError::TimedOut(self.timeout));
            }
        };

        match response.status() {
            StatusCode::OK => Ok(()),
            status => {
                tracing::debug!(%status, "session rejected by auth service");
                Err(ValidationError::Rejected(status))
            }
        }
    }
}
