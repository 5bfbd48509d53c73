//! Shared test helpers: in-process mock upstream services.

use bytes::Bytes;
use http::{Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

pub type MockResponse = (StatusCode, &'static str, Vec<u8>);

/// Spawn a mock upstream on an ephemeral port.
///
/// `handler` receives the request's path-and-query and produces the
/// response. Returns the base URL.
pub async fn spawn_upstream<F>(handler: F) -> String
where
    F: Fn(&str) -> MockResponse + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock upstream");
    let addr = listener.local_addr().expect("mock upstream addr");
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let svc = service_fn(move |req: hyper::Request<Incoming>| {
                    let handler = Arc::clone(&handler);
                    async move {
                        let pq = req
                            .uri()
                            .path_and_query()
                            .map(|pq| pq.as_str().to_string())
                            .unwrap_or_else(|| "/".to_string());
                        let (status, content_type, body) = handler(&pq);
                        let resp = Response::builder()
                            .status(status)
                            .header("content-type", content_type)
                            .body(Full::new(Bytes::from(body)))
                            .expect("build mock response");
                        Ok::<_, std::convert::Infallible>(resp)
                    }
                });
                let _ = ConnBuilder::new(TokioExecutor::new())
                    .serve_connection(TokioIo::new(stream), svc)
                    .await;
            });
        }
    });

    format!("http://{addr}")
}

/// Core mock honoring `?n=`: serves `pattern_bytes(n)` as lowercase hex.
pub async fn spawn_core() -> String {
    spawn_upstream(|pq| {
        let n = query_value(pq, "n")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(32);
        (StatusCode::OK, "text/plain", hex::encode(pattern_bytes(n)).into_bytes())
    })
    .await
}

/// Upstream answering every request with a fixed status and body.
pub async fn spawn_fixed(status: StatusCode, content_type: &'static str, body: &str) -> String {
    let body = body.to_string();
    spawn_upstream(move |_| (status, content_type, body.clone().into_bytes())).await
}

/// VRF mock serving scripted samples in order.
///
/// The i-th request gets the i-th entry: `Ok(value)` becomes a 200 JSON
/// sample, `Err(status)` that status. Requests past the end get 500.
/// Returns the base URL and a counter of requests served.
pub async fn spawn_vrf(script: Vec<Result<u32, u16>>) -> (String, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_handler = Arc::clone(&calls);

    let url = spawn_upstream(move |_| {
        let i = calls_in_handler.fetch_add(1, Ordering::SeqCst);
        match script.get(i) {
            Some(Ok(value)) => (
                StatusCode::OK,
                "application/json",
                format!(r#"{{"random": {value}, "signature": "00ff", "sig_scheme": "ecdsa"}}"#)
                    .into_bytes(),
            ),
            Some(Err(status)) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "text/plain",
                b"scripted failure".to_vec(),
            ),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "text/plain", b"script exhausted".to_vec()),
        }
    })
    .await;

    (url, calls)
}

/// A base URL nothing listens on (connection refused).
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway addr");
    drop(listener);
    format!("http://{addr}")
}

/// Deterministic byte pattern for upstream payloads.
pub fn pattern_bytes(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i % 251) as u8).collect()
}

fn query_value(pq: &str, name: &str) -> Option<String> {
    let query = pq.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        (k == name).then(|| v.to_string())
    })
}
