//! HTTP read API over the current odds snapshot.
//!
//! Every handler reads the snapshot once, so a response never mixes two
//! update cycles. CORS allows any origin for GET.

pub mod routes;

use anyhow::{Context, Result};
use axum::{
    http::{header, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::types::Bookmaker;

pub use routes::{ApiState, AppState};

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::get_status))
        .route("/odds", get(routes::get_all_odds))
        .route(&bookmaker_path(Bookmaker::Bet365), get(routes::get_bet365))
        .route(&bookmaker_path(Bookmaker::WilliamHill), get(routes::get_william_hill))
        .route("/horse/:name", get(routes::find_horse))
        .route("/compare", get(routes::get_coverage))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}

fn bookmaker_path(bookmaker: Bookmaker) -> String {
    format!("/{}", bookmaker.slug())
}

/// Bind the API listener.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API address {addr}"))
}

/// Serve the API on `listener` until `shutdown` flips to true or its
/// sender is dropped.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let addr = listener.local_addr().context("API listener has no address")?;
    info!(%addr, "API server listening on http://{addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .context("API server error")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
