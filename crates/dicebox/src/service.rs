//! The authentication service: login, logout, validate, sweep.
//!
//! `AuthService` owns the credential store and the session table, each
//! behind its own `tokio::sync::Mutex`. Every operation holds a lock for
//! its whole read-modify-write and never does I/O while holding it.

use dicebox_protocol::{BasicCredentials, LoginRequest, PlayerId, SessionToken};
use dicebox_session::{CredentialStore, SessionConfig, SessionTable, SweepReport, Timestamp};
use dicebox_validation::{RequestValidator, ValidationError, session_token};
use hyper::header::HeaderMap;
use tokio::sync::Mutex;

use crate::AuthError;

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub player_id: PlayerId,
    pub token: SessionToken,
    /// The instance's version, echoed back so the client can detect a
    /// restart on its next login.
    pub server_version: String,
}

/// Credentials plus live sessions for one auth-service instance.
///
/// Construct once, wrap in `Arc`, and share it between the HTTP router
/// and the sweeper.
pub struct AuthService {
    credentials: Mutex<CredentialStore>,
    sessions: Mutex<SessionTable>,
    server_version: String,
    config: SessionConfig,
}

impl AuthService {
    /// Creates a service whose version is the current unix time in seconds.
    pub fn new(config: SessionConfig) -> Self {
        Self::with_server_version(config, Timestamp::now().unix_secs().to_string())
    }

    pub fn with_server_version(config: SessionConfig, server_version: impl Into<String>) -> Self {
        Self {
            credentials: Mutex::new(CredentialStore::new()),
            sessions: Mutex::new(SessionTable::new()),
            server_version: server_version.into(),
            config,
        }
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Registers or verifies the user, then issues a fresh session.
    ///
    /// A client that reports a different `server_version` has state from a
    /// previous instance, whose memory is gone. Such a login is treated as
    /// a new-user login regardless of `is_new_user`.
    ///
    /// Any session the player already had is deleted.
    ///
    /// # Errors
    /// Returns [`AuthError::Session`] with `UsernameTaken`,
    /// `InvalidCredentials` or `EmptyUsername`.
    pub async fn login(
        &self,
        credentials: &BasicCredentials,
        request: &LoginRequest,
    ) -> Result<LoginOutcome, AuthError> {
        self.login_at(credentials, request, Timestamp::now()).await
    }

    /// [`login`](Self::login) with an explicit clock reading.
    pub async fn login_at(
        &self,
        credentials: &BasicCredentials,
        request: &LoginRequest,
        now: Timestamp,
    ) -> Result<LoginOutcome, AuthError> {
        let version_mismatch = request.server_version != self.server_version;
        if version_mismatch && !request.is_new_user {
            tracing::info!(
                client_version = %request.server_version,
                server_version = %self.server_version,
                "server version mismatch, treating login as new user"
            );
        }
        let is_new_user = request.is_new_user || version_mismatch;

        let player_id = {
            let mut store = self.credentials.lock().await;
            store.register_or_verify(&credentials.username, &credentials.password, is_new_user)?
        };

        let grant = {
            let mut sessions = self.sessions.lock().await;
            sessions.create_or_replace(player_id.clone(), now)
        };

        tracing::info!(%player_id, new_user = is_new_user, "player logged in");

        Ok(LoginOutcome {
            player_id,
            token: grant.token,
            server_version: self.server_version.clone(),
        })
    }

    /// Ends the session named by `token`.
    ///
    /// The session is touched and deleted under one lock acquisition, so no
    /// other request can observe it in between. Logging out twice fails the
    /// second time.
    ///
    /// # Errors
    /// `MissingToken` for an empty token, `InvalidSession` if not live.
    pub async fn logout(&self, token: &str) -> Result<PlayerId, AuthError> {
        let now = Timestamp::now();
        let mut sessions = self.sessions.lock().await;
        let player_id = sessions.touch(token, now)?;
        sessions.delete(token)?;
        drop(sessions);

        tracing::info!(%player_id, "player logged out");
        Ok(player_id)
    }

    /// Confirms `token` names a live session and records activity on it.
    ///
    /// # Errors
    /// `MissingToken` for an empty token, `InvalidSession` if not live.
    pub async fn validate(&self, token: &str) -> Result<PlayerId, AuthError> {
        let player_id = self.sessions.lock().await.touch(token, Timestamp::now())?;
        tracing::trace!(%player_id, "session validated");
        Ok(player_id)
    }

    /// Evicts every session idle for longer than `stale_after`.
    pub async fn sweep_stale(&self) -> SweepReport {
        self.sweep_at(Timestamp::now()).await
    }

    /// [`sweep_stale`](Self::sweep_stale) with an explicit clock reading.
    pub async fn sweep_at(&self, now: Timestamp) -> SweepReport {
        let report = self.sessions.lock().await.sweep(now, self.config.stale_after);

        if report.failures > 0 {
            tracing::warn!(
                removed = report.removed_count(),
                failures = report.failures,
                "session sweep finished with failures"
            );
        } else {
            tracing::debug!(removed = report.removed_count(), "session sweep finished");
        }
        report
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn user_count(&self) -> usize {
        self.credentials.lock().await.len()
    }

    /// The live token of `player_id`, if any.
    pub async fn token_for(&self, player_id: &PlayerId) -> Option<SessionToken> {
        self.sessions.lock().await.token_for(player_id).cloned()
    }
}

/// In-process validation, for services running in the same binary as the
/// auth service.
impl RequestValidator for AuthService {
    async fn validate_request(&self, headers: &HeaderMap) -> Result<(), ValidationError> {
        let token = session_token(headers)?;
        self.validate(token)
            .await
            .map(|_| ())
            .map_err(|e| ValidationError::Denied(e.to_string()))
    }
}
