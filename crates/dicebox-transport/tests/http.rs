//! Integration tests for the HTTP transport: real sockets on localhost.

use std::time::Duration;

use dicebox_transport::{HttpTransport, ResponseBody, full_body};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use tokio::sync::watch;

async fn echo_path(req: Request<Incoming>) -> Response<ResponseBody> {
    Response::new(full_body(req.uri().path().to_owned()))
}

/// Binds on a random port and serves `echo_path` until `shutdown` flips.
async fn start_echo_server() -> (String, watch::Sender<bool>) {
    let transport = HttpTransport::bind("127.0.0.1:0").await.expect("bind");
    let addr = transport.local_addr().expect("local addr").to_string();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut stop = shutdown_rx.clone();
        loop {
            tokio::select! {
                _ = stop.changed() => break,
                accepted = transport.accept() => {
                    let conn = accepted.expect("accept");
                    let rx = shutdown_rx.clone();
                    tokio::spawn(async move {
                        let _ = conn.serve(echo_path, rx).await;
                    });
                }
            }
        }
    });

    (addr, shutdown_tx)
}

fn client() -> Client<HttpConnector, Full<Bytes>> {
    Client::builder(TokioExecutor::new()).build_http()
}

async fn get(addr: &str, path: &str) -> (StatusCode, String) {
    let req = Request::get(format!("http://{addr}{path}"))
        .body(Full::new(Bytes::new()))
        .expect("request");
    let resp = client().request(req).await.expect("response");
    let status = resp.status();
    let body = resp.into_body().collect().await.expect("body").to_bytes();
    (status, String::from_utf8(body.to_vec()).expect("utf8"))
}

#[tokio::test]
async fn test_bind_random_port_reports_local_addr() {
    let transport = HttpTransport::bind("127.0.0.1:0").await.unwrap();

    let addr = transport.local_addr().unwrap();

    assert_ne!(addr.port(), 0);
}

#[tokio::test]
async fn test_bind_invalid_address_returns_error() {
    let result = HttpTransport::bind("not-an-address").await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_serve_routes_request_to_handler() {
    let (addr, _shutdown) = start_echo_server().await;

    let (status, body) = get(&addr, "/auth/login").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "/auth/login");
}

#[tokio::test]
async fn test_serve_handles_concurrent_requests() {
    let (addr, _shutdown) = start_echo_server().await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let addr = addr.clone();
        handles.push(tokio::spawn(async move {
            get(&addr, &format!("/n/{i}")).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("/n/{i}"));
    }
}

#[tokio::test]
async fn test_accept_assigns_distinct_connection_ids() {
    let transport = HttpTransport::bind("127.0.0.1:0").await.unwrap();
    let addr = transport.local_addr().unwrap();

    let _c1 = tokio::net::TcpStream::connect(addr).await.unwrap();
    let _c2 = tokio::net::TcpStream::connect(addr).await.unwrap();

    let a = transport.accept().await.unwrap();
    let b = transport.accept().await.unwrap();

    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_shutdown_stops_accepting() {
    let (addr, shutdown) = start_echo_server().await;
    get(&addr, "/before").await;

    shutdown.send(true).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Listener was dropped with the accept loop.
    let result = tokio::time::timeout(
        Duration::from_secs(2),
        client().request(
            Request::get(format!("http://{addr}/after"))
                .body(Full::new(Bytes::new()))
                .unwrap(),
        ),
    )
    .await;
    assert!(matches!(result, Ok(Err(_))), "request after shutdown should fail");
}
