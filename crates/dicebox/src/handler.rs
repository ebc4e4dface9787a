//! HTTP routing for the auth endpoints.
//!
//! The routes are:
//!   POST   /auth/login                 → login
//!   DELETE /auth/logout                → logout
//!   POST   /auth/validation-internal   → validate
//!
//! Anything else is 404, or 405 for a known path with the wrong method.
//! Errors go out as plain text with the status from [`AuthError::status`].

use std::fmt::Display;
use std::sync::Arc;

use dicebox_protocol::{
    BasicCredentials, Codec, JsonCodec, LOGIN_PATH, LOGOUT_PATH, LoginRequest, LoginResponse,
    ProtocolError, SESSION_ID_HEADER, SUCCESS_BODY, VALIDATION_PATH,
};
use dicebox_transport::{ResponseBody, full_body};
use http_body_util::BodyExt;
use hyper::body::Body;
use hyper::header::{ALLOW, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};

use crate::{AuthError, AuthService};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Login,
    Logout,
    Validate,
}

impl Route {
    fn resolve(path: &str) -> Option<Self> {
        match path {
            LOGIN_PATH => Some(Self::Login),
            LOGOUT_PATH => Some(Self::Logout),
            VALIDATION_PATH => Some(Self::Validate),
            _ => None,
        }
    }

    fn method(self) -> Method {
        match self {
            Self::Login | Self::Validate => Method::POST,
            Self::Logout => Method::DELETE,
        }
    }
}

/// Dispatches auth requests to an [`AuthService`].
///
/// Cloning is cheap; each connection task gets its own clone. A router
/// built with [`AuthRouter::uninitialized`] has no service and answers
/// every auth route with 500.
#[derive(Clone)]
pub struct AuthRouter<C: Codec = JsonCodec> {
    service: Option<Arc<AuthService>>,
    codec: C,
}

impl AuthRouter<JsonCodec> {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self {
            service: Some(service),
            codec: JsonCodec,
        }
    }

    pub fn uninitialized() -> Self {
        Self {
            service: None,
            codec: JsonCodec,
        }
    }
}

impl<C: Codec + Clone> AuthRouter<C> {
    /// Replaces the body codec.
    pub fn with_codec<D: Codec + Clone>(self, codec: D) -> AuthRouter<D> {
        AuthRouter {
            service: self.service,
            codec,
        }
    }

    pub fn service(&self) -> Option<&Arc<AuthService>> {
        self.service.as_ref()
    }

    /// Handles one request. Never fails: every error becomes a response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let Some(route) = Route::resolve(req.uri().path()) else {
            tracing::debug!(path = %req.uri().path(), "no such route");
            return text_response(StatusCode::NOT_FOUND, "404 page not found");
        };

        if req.method() != route.method() {
            let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed");
            if let Ok(allow) = HeaderValue::from_str(route.method().as_str()) {
                response.headers_mut().insert(ALLOW, allow);
            }
            return response;
        }

        let result = match self.service.as_deref() {
            None => Err(AuthError::NotInitialized),
            Some(service) => match route {
                Route::Login => self.login(service, req).await,
                Route::Logout => logout(service, req.headers()).await,
                Route::Validate => validate(service, req.headers()).await,
            },
        };

        result.unwrap_or_else(|err| {
            if err.is_internal() {
                tracing::error!(?route, error = %err, "auth request failed");
            } else {
                tracing::debug!(?route, error = %err, "auth request rejected");
            }
            text_response(err.status(), err.to_string())
        })
    }

    async fn login<B>(
        &self,
        service: &AuthService,
        req: Request<B>,
    ) -> Result<Response<ResponseBody>, AuthError>
    where
        B: Body + Send,
        B::Data: Send,
        B::Error: Display,
    {
        let credentials = basic_credentials(req.headers())?;

        let body = req
            .into_body()
            .collect()
            .await
            .map_err(|e| AuthError::MalformedBody(e.to_string()))?
            .to_bytes();
        let request: LoginRequest = self
            .codec
            .decode(&body)
            .map_err(|e| AuthError::MalformedBody(e.to_string()))?;

        let outcome = service.login(&credentials, &request).await?;

        let payload = self
            .codec
            .encode(&LoginResponse {
                player_id: outcome.player_id,
                server_version: outcome.server_version,
            })
            .map_err(AuthError::Encode)?;
        let token = HeaderValue::from_str(outcome.token.as_str())
            .map_err(|_| AuthError::Encode(ProtocolError::InvalidHeader(SESSION_ID_HEADER)))?;

        let mut response = Response::new(full_body(payload));
        let headers = response.headers_mut();
        headers.insert(SESSION_ID_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(self.codec.content_type()));
        Ok(response)
    }
}

fn basic_credentials(headers: &HeaderMap) -> Result<BasicCredentials, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| {
            AuthError::MalformedCredentials(ProtocolError::InvalidHeader("Authorization"))
        })?;
    BasicCredentials::from_header(value).map_err(AuthError::MalformedCredentials)
}

/// The `Session-Id` value, or `""` if absent or not visible ASCII. The
/// session table turns an empty token into `MissingToken`.
fn session_id(headers: &HeaderMap) -> &str {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn logout(
    service: &AuthService,
    headers: &HeaderMap,
) -> Result<Response<ResponseBody>, AuthError> {
    service.logout(session_id(headers)).await?;
    Ok(text_response(StatusCode::OK, SUCCESS_BODY))
}

async fn validate(
    service: &AuthService,
    headers: &HeaderMap,
) -> Result<Response<ResponseBody>, AuthError> {
    service.validate(session_id(headers)).await?;
    Ok(text_response(StatusCode::OK, SUCCESS_BODY))
}

fn text_response(status: StatusCode, body: impl Into<String>) -> Response<ResponseBody> {
    let mut response = Response::new(full_body(body.into()));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}
