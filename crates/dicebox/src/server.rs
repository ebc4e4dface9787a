//! `AuthServer` builder and server loop.
//!
//! Ties the layers together: HTTP transport → router → auth service, plus
//! the session sweeper running beside the accept loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dicebox_protocol::AUTH_SERVICE_PORT;
use dicebox_session::SessionConfig;
use dicebox_transport::HttpTransport;
use hyper::Request;
use hyper::body::Incoming;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::config::AppConfig;
use crate::{AuthRouter, AuthService, DiceboxError, SessionSweeper};

/// Builder for configuring and starting the auth service.
///
/// # Example
///
/// ```rust,ignore
/// let server = AuthServer::builder()
///     .bind("0.0.0.0:40001")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct AuthServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    server_version: Option<String>,
    sweep_jitter: Duration,
}

impl AuthServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: format!("127.0.0.1:{AUTH_SERVICE_PORT}"),
            session_config: SessionConfig::default(),
            server_version: None,
            sweep_jitter: Duration::ZERO,
        }
    }

    /// Takes bind address and session settings from a loaded config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new()
            .bind(&config.server.bind_address)
            .session_config(config.session_config())
            .sweep_jitter(config.sweep_jitter())
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Fixes the server version instead of using the start time.
    pub fn server_version(mut self, version: impl Into<String>) -> Self {
        self.server_version = Some(version.into());
        self
    }

    /// Random delay bound for the first sweep.
    pub fn sweep_jitter(mut self, jitter: Duration) -> Self {
        self.sweep_jitter = jitter;
        self
    }

    /// Binds the listener and creates the service.
    pub async fn build(self) -> Result<AuthServer, DiceboxError> {
        let transport = HttpTransport::bind(&self.bind_addr).await?;

        let service = Arc::new(match self.server_version {
            Some(version) => AuthService::with_server_version(self.session_config, version),
            None => AuthService::new(self.session_config),
        });

        Ok(AuthServer {
            transport,
            router: AuthRouter::new(Arc::clone(&service)),
            service,
            sweep_jitter: self.sweep_jitter,
        })
    }
}

impl Default for AuthServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound auth service, ready to run.
pub struct AuthServer {
    transport: HttpTransport,
    service: Arc<AuthService>,
    router: AuthRouter,
    sweep_jitter: Duration,
}

impl AuthServer {
    /// Creates a new builder.
    pub fn builder() -> AuthServerBuilder {
        AuthServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The service behind the router, for in-process validation.
    pub fn service(&self) -> Arc<AuthService> {
        Arc::clone(&self.service)
    }

    /// Runs until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), DiceboxError> {
        self.run_until(crate::signals::shutdown_signal()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// Each connection is served on its own task. On shutdown the
    /// listener is closed, open connections finish their in-flight
    /// request and close, and the sweeper is stopped.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<(), DiceboxError> {
        let service = Arc::clone(&self.service);
        let sweeper = SessionSweeper::start(
            Arc::clone(&service),
            service.config(),
            self.sweep_jitter,
        );
        let (close_tx, close_rx) = watch::channel(false);
        let mut connections = JoinSet::new();

        tracing::info!(
            addr = ?self.local_addr().ok(),
            server_version = %service.server_version(),
            "auth server running"
        );

        tokio::pin!(shutdown);
        loop {
            while connections.try_join_next().is_some() {}

            let conn = tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => accepted,
            };

            match conn {
                Ok(conn) => {
                    let conn_id = conn.id();
                    let router = self.router.clone();
                    let close_rx = close_rx.clone();
                    connections.spawn(async move {
                        let handler = move |req: Request<Incoming>| {
                            let router = router.clone();
                            async move { router.handle(req).await }
                        };
                        if let Err(e) = conn.serve(handler, close_rx).await {
                            tracing::debug!(%conn_id, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }

        tracing::info!(open = connections.len(), "shutting down auth server");
        drop(self.transport);
        let _ = close_tx.send(true);
        while connections.join_next().await.is_some() {}
        sweeper.stop().await;

        tracing::info!("auth server stopped");
        Ok(())
    }
}
