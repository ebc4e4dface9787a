//! The `RequestValidator` capability and helpers shared by its users.

use std::sync::Arc;

use dicebox_protocol::SESSION_ID_HEADER;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderMap, WWW_AUTHENTICATE};
use hyper::Response;

use crate::ValidationError;

/// Value of the `WWW-Authenticate` header on every 401 a service sends.
pub const UNAUTHORIZED_CHALLENGE: &str = "Basic realm=\"User Visible Realm\"";

/// Decides whether an inbound request belongs to a live session.
///
/// Services hold one of these and call it before doing any work:
///
/// ```rust,ignore
/// if let Err(e) = validator.validate_request(req.headers()).await {
///     tracing::info!(error = %e, "rejecting unauthenticated request");
///     return unauthorized_response(&e);
/// }
/// ```
///
/// `Send + Sync + 'static` because a service shares its validator across
/// all of its connection tasks.
pub trait RequestValidator: Send + Sync + 'static {
    /// Validates the session named by the request's `Session-Id` header.
    ///
    /// # Returns
    /// - `Ok(())`: the session is live
    /// - `Err(_)`: treat the caller as unauthenticated
    fn validate_request(
        &self,
        headers: &HeaderMap,
    ) -> impl std::future::Future<Output = Result<(), ValidationError>> + Send;
}

impl<V: RequestValidator> RequestValidator for Arc<V> {
    fn validate_request(
        &self,
        headers: &HeaderMap,
    ) -> impl std::future::Future<Output = Result<(), ValidationError>> + Send {
        (**self).validate_request(headers)
    }
}

/// Extracts the session token from `Session-Id`.
///
/// # Errors
/// - [`ValidationError::MissingSessionHeader`]: absent or empty
/// - [`ValidationError::MalformedSessionHeader`]: not visible ASCII
pub fn session_token(headers: &HeaderMap) -> Result<&str, ValidationError> {
    let value = headers
        .get(SESSION_ID_HEADER)
        .ok_or(ValidationError::MissingSessionHeader)?;
    let token = value
        .to_str()
        .map_err(|_| ValidationError::MalformedSessionHeader)?;
    if token.is_empty() {
        return Err(ValidationError::MissingSessionHeader);
    }
    Ok(token)
}

/// The 401 a service sends when validation fails.
pub fn unauthorized_response(err: &ValidationError) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(format!("session error: {err}"))));
    *response.status_mut() = err.status();
    let headers = response.headers_mut();
    headers.insert(
        WWW_AUTHENTICATE,
        hyper::header::HeaderValue::from_static(UNAUTHORIZED_CHALLENGE),
    );
    headers.insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use hyper::header::HeaderValue;

    /// Accepts exactly one token.
    struct OneToken(&'static str);

    impl RequestValidator for OneToken {
        async fn validate_request(&self, headers: &HeaderMap) -> Result<(), ValidationError> {
            match session_token(headers)? {
                t if t == self.0 => Ok(()),
                _ => Err(ValidationError::Denied("unknown token".into())),
            }
        }
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn test_session_token_present_returns_value() {
        let headers = headers_with("1700000000123456");

        assert_eq!(session_token(&headers).unwrap(), "1700000000123456");
    }

    #[test]
    fn test_session_token_lookup_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("session-id", HeaderValue::from_static("abc"));

        assert_eq!(session_token(&headers).unwrap(), "abc");
    }

    #[test]
    fn test_session_token_missing_returns_error() {
        let headers = HeaderMap::new();

        let result = session_token(&headers);

        assert!(matches!(result, Err(ValidationError::MissingSessionHeader)));
    }

    #[test]
    fn test_session_token_empty_returns_missing() {
        let headers = headers_with("");

        let result = session_token(&headers);

        assert!(matches!(result, Err(ValidationError::MissingSessionHeader)));
    }

    #[test]
    fn test_session_token_non_ascii_returns_malformed() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_bytes(b"\xfftoken").unwrap());

        let result = session_token(&headers);

        assert!(matches!(result, Err(ValidationError::MalformedSessionHeader)));
    }

    #[tokio::test]
    async fn test_unauthorized_response_has_challenge_and_reason() {
        let response = unauthorized_response(&ValidationError::MissingSessionHeader);

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            UNAUTHORIZED_CHALLENGE
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"session error: no session id header in the request");
    }

    #[tokio::test]
    async fn test_arc_validator_forwards_to_inner() {
        let validator = Arc::new(OneToken("good"));

        assert!(validator.validate_request(&headers_with("good")).await.is_ok());
        assert!(validator.validate_request(&headers_with("bad")).await.is_err());
    }
}
