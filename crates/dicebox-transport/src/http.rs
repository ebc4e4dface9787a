//! HTTP/1.1 transport on top of Tokio's `TcpListener` and hyper.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use crate::{ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Body type of every response a Dicebox service produces.
pub type ResponseBody = Full<Bytes>;

/// Wraps bytes or a string into a complete response body.
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
}

/// A bound HTTP listener.
pub struct HttpTransport {
    listener: TcpListener,
}

impl HttpTransport {
    /// Binds to `addr` (e.g. `"0.0.0.0:40001"`, or port `0` for tests).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        tracing::info!(addr, "HTTP transport listening");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next TCP connection.
    pub async fn accept(&self) -> Result<HttpConnection, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "accepted HTTP connection");

        Ok(HttpConnection { id, peer, stream })
    }
}

/// One accepted connection, not yet being served.
pub struct HttpConnection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
}

impl HttpConnection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Serves HTTP/1.1 requests on this connection with `handler` until the
    /// client closes it or `shutdown` changes.
    ///
    /// On shutdown the connection finishes the request in flight, then
    /// closes instead of waiting for the next keep-alive request.
    pub async fn serve<F, Fut>(
        self,
        handler: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), TransportError>
    where
        F: Fn(Request<Incoming>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response<ResponseBody>> + Send + 'static,
    {
        let io = TokioIo::new(self.stream);
        let service = service_fn(move |req| {
            let response = handler(req);
            async move { Ok::<_, Infallible>(response.await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);

        tokio::select! {
            result = conn.as_mut() => result?,
            _ = shutdown.changed() => {
                tracing::debug!(id = %self.id, "graceful shutdown requested");
                conn.as_mut().graceful_shutdown();
                conn.await?;
            }
        }

        Ok(())
    }
}
