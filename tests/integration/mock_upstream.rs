//! Mock bookmaker upstream for integration testing.
//!
//! A real HTTP server on `127.0.0.1:0` that serves a configurable body
//! and status for `GET /races`, and records the headers of every request
//! it sees. All state is in-memory and controllable from test code.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Default)]
struct Shared {
    status: Mutex<Option<StatusCode>>,
    body: Mutex<String>,
    requests: Mutex<Vec<HeaderMap>>,
}

/// A mock upstream feed serving one payload.
pub struct MockUpstream {
    addr: SocketAddr,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl MockUpstream {
    /// Start serving `payload` with HTTP 200.
    pub async fn start(payload: Value) -> Self {
        let shared = Arc::new(Shared::default());
        *shared.body.lock().unwrap() = payload.to_string();

        let app = Router::new()
            .route("/races", get(serve_races))
            .with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared, server }
    }

    pub fn url(&self) -> String {
        format!("http://{}/races", self.addr)
    }

    /// Replace the served payload.
    pub fn set_payload(&self, payload: Value) {
        *self.shared.body.lock().unwrap() = payload.to_string();
    }

    /// Serve an arbitrary (possibly non-JSON) body.
    pub fn set_raw_body(&self, body: &str) {
        *self.shared.body.lock().unwrap() = body.to_string();
    }

    /// Force every response to this status.
    pub fn set_status(&self, status: StatusCode) {
        *self.shared.status.lock().unwrap() = Some(status);
    }

    pub fn clear_status(&self) {
        *self.shared.status.lock().unwrap() = None;
    }

    /// Headers of every request received so far.
    pub fn requests(&self) -> Vec<HeaderMap> {
        self.shared.requests.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn serve_races(State(shared): State<Arc<Shared>>, headers: HeaderMap) -> Response {
    shared.requests.lock().unwrap().push(headers);
    let status = shared.status.lock().unwrap().unwrap_or(StatusCode::OK);
    let body = shared.body.lock().unwrap().clone();
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
