//! The two listener surfaces: viewer WebSockets and static assets.
//!
//! Both are plain axum routers driven by [`serve`]. The WebSocket side does
//! nothing but upgrade sockets and announce them to the hub; all session
//! state lives in the hub and its per-viewer tasks.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{header, StatusCode, Uri};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use rand::Rng;
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::hub::{HubEvent, ViewerConn};

/// Router for the viewer WebSocket listener.
pub fn ws_router(event_tx: UnboundedSender<HubEvent>) -> Router {
    Router::new()
        .route("/ws", get(handle_ws))
        .with_state(event_tx)
}

async fn handle_ws(
    ws: WebSocketUpgrade,
    State(event_tx): State<UnboundedSender<HubEvent>>,
) -> Response {
    ws.on_upgrade(move |socket| register_viewer(socket, event_tx))
}

async fn register_viewer(socket: WebSocket, event_tx: UnboundedSender<HubEvent>) {
    let viewer_id = generate_viewer_id();
    let conn = ViewerConn::new(viewer_id.clone(), socket, event_tx.clone());
    if event_tx
        .send(HubEvent::ViewerConnected { viewer_id, conn })
        .is_err()
    {
        log::warn!("[ws] Hub gone, rejecting new viewer");
    }
}

/// Monotonic counter plus random suffix, unique for the process lifetime.
fn generate_viewer_id() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let salt: u16 = rand::rng().random();
    format!("viewer:{seq:x}{salt:04x}")
}

/// Router serving the frontend directory read-only.
pub fn asset_router(frontend_dir: PathBuf) -> Router {
    Router::new().fallback(serve_asset).with_state(frontend_dir)
}

/// Resolve a request path inside the frontend directory.
///
/// Everything gets a permissive CORS header so the frontend can be loaded
/// from a dev server while the hub serves only the API.
async fn serve_asset(State(frontend_dir): State<PathBuf>, uri: Uri) -> Response {
    let trimmed = uri.path().trim_start_matches('/');
    // Refuse any traversal outside the frontend directory.
    if trimmed.split('/').any(|part| part == "..") {
        return asset_response(StatusCode::NOT_FOUND, "text/plain", b"Not Found".to_vec());
    }
    let relative = if trimmed.is_empty() { "index.html" } else { trimmed };
    let path = frontend_dir.join(relative);

    match tokio::fs::read(&path).await {
        Ok(body) => asset_response(StatusCode::OK, content_type(relative), body),
        Err(e) => {
            log::debug!("[http] {relative}: {e}");
            asset_response(StatusCode::NOT_FOUND, "text/plain", b"Not Found".to_vec())
        }
    }
}

fn asset_response(status: StatusCode, content_type: &str, body: Vec<u8>) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(body.into())
        .unwrap_or_default()
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Run a router on an already-bound listener until shutdown.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("listener failed")
}
