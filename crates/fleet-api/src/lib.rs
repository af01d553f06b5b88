//! # API Surface (C10)
//!
//! Thin adapter from the REST API (spec §6) to the command synthesizer
//! (C6), template expander (C7), transport manager (C8) and order executor
//! (C9). Every handler is a few lines of extraction plus a call into one of
//! those crates; [`error::ApiError`] is the single boundary layer that maps
//! every inner error type to an HTTP status (spec §7).

pub mod dto;
pub mod error;
mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use state::AppState;

const API_PREFIX: &str = "/api/v1";

/// Builds the full axum router: health check unprefixed (common load
/// balancer convention), everything else under `/api/v1` (spec §6).
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest(API_PREFIX, routes::build())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Runs the server until `shutdown` resolves, then drains in-flight
/// requests. `bin/fleet-bridge` bounds the drain to spec §5's 30s deadline
/// by racing this future against a timeout at the call site.
pub async fn serve(
    bind_addr: &str,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(bind_addr, "fleet-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
