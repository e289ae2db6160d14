//! Shared helpers for end-to-end tests

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{http::StatusCode, Router};
use serde_json::Value;

/// Last request body seen by a mock server, parsed as JSON.
pub type CapturedBody = Arc<Mutex<Option<Value>>>;

/// Start a mock HTTP server on an ephemeral port that answers every
/// request with the given status and body, capturing each request body.
pub async fn spawn_server(status: StatusCode, body: &'static str) -> (SocketAddr, CapturedBody) {
    let captured: CapturedBody = Arc::new(Mutex::new(None));
    let seen = captured.clone();

    let app = Router::new().fallback(move |request_body: String| {
        let seen = seen.clone();
        async move {
            *seen.lock().unwrap() = serde_json::from_str(&request_body).ok();
            (status, body.to_string())
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, captured)
}
