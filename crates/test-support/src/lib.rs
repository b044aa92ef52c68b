//! Test helpers shared by the `resdb-mcp` unit and integration tests.
//!
//! [`MockResDb`] is a real HTTP server speaking the subset of the ResilientDB key-value API
//! the gateway consumes, backed by an in-memory map.

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// Pick an unused TCP port on localhost.
///
/// Note: this does not reserve the port; it's still possible for another process to bind it
/// before you do.
///
/// # Errors
///
/// Returns an error if binding an ephemeral localhost port fails or if the bound socket's
/// local address cannot be read.
pub fn pick_unused_port() -> anyhow::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("bind ephemeral port")?;
    Ok(listener.local_addr()?.port())
}

#[derive(Default)]
struct MockState {
    values: Mutex<HashMap<String, Value>>,
    requests: AtomicUsize,
    /// 0 = healthy; otherwise every request answers with this status.
    fail_status: AtomicU16,
    /// When set, `get` answers 200 with this body verbatim instead of JSON.
    raw_get_body: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct SetBody {
    id: String,
    value: Value,
}

/// In-memory stand-in for the remote key-value API, served under `/api/v1/`.
///
/// The server stops when the value is dropped.
pub struct MockResDb {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockResDb {
    /// Bind `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(MockState::default());

        let app = Router::new()
            .route("/api/v1/transactions/set", post(set_handler))
            .route("/api/v1/transactions/get/{key}", get(get_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind mock listener")?;
        let addr = listener.local_addr().context("mock local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        })
    }

    /// Base URL to hand to the gateway (ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1/", self.addr)
    }

    /// Number of requests received on any route.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn stored(&self, key: &str) -> Option<Value> {
        self.state.values.lock().get(key).cloned()
    }

    /// Seed a raw JSON value (including `null` or non-strings) without going through HTTP.
    pub fn insert_raw(&self, key: &str, value: Value) {
        self.state.values.lock().insert(key.to_string(), value);
    }

    /// Answer every subsequent request with `status`.
    pub fn fail_with(&self, status: u16) {
        self.state.fail_status.store(status, Ordering::SeqCst);
    }

    /// Answer every subsequent `get` with 200 and `body` as-is (not necessarily JSON).
    pub fn respond_raw(&self, body: &str) {
        *self.state.raw_get_body.lock() = Some(body.to_string());
    }

    pub fn recover(&self) {
        self.state.fail_status.store(0, Ordering::SeqCst);
        *self.state.raw_get_body.lock() = None;
    }
}

impl Drop for MockResDb {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn scripted_failure(state: &MockState) -> Option<Response> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    let code = state.fail_status.load(Ordering::SeqCst);
    if code == 0 {
        return None;
    }
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Some((status, "scripted failure").into_response())
}

async fn set_handler(
    State(state): State<Arc<MockState>>,
    axum::Json(body): axum::Json<SetBody>,
) -> Response {
    if let Some(resp) = scripted_failure(&state) {
        return resp;
    }
    state.values.lock().insert(body.id.clone(), body.value);
    axum::Json(json!({ "id": body.id })).into_response()
}

async fn get_handler(State(state): State<Arc<MockState>>, Path(key): Path<String>) -> Response {
    if let Some(resp) = scripted_failure(&state) {
        return resp;
    }
    if let Some(body) = state.raw_get_body.lock().clone() {
        return (StatusCode::OK, body).into_response();
    }
    let value = state.values.lock().get(&key).cloned().unwrap_or(Value::Null);
    axum::Json(json!({ "id": key, "value": value })).into_response()
}
