//! # Oil Insight Web Server
//!
//! A read-only JSON API over the price series, the market events and the
//! analytics derived from them.
//!
//! ## Architectural Principles
//!
//! - **Load once, serve many:** All data is loaded, validated and aligned in
//!   `AppState::initialize` before the listener is bound. Handlers share the
//!   state behind an `Arc` and never mutate it.
//! - **One envelope:** Every route except `/api/health` answers with
//!   `{data, status, status_code}` on success and
//!   `{error, error_type, status_code}` on failure.
//!
//! ## Public API
//!
//! - `build_router`: The axum `Router` with every route and middleware.
//! - `run_server`: Initializes the state and serves until shutdown.
//! - `AppState`, `AppError`, `ApiResponse`: The shared state, error and response types.

use axum::{Router, extract::DefaultBodyLimit, routing::get};
use configuration::Config;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;
pub mod params;
pub mod responses;
pub mod state;

pub use error::AppError;
pub use responses::ApiResponse;
pub use state::AppState;

/// Wires every route to its handler.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.body_limit_bytes;
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/price-data", get(handlers::get_price_data))
        .route("/api/events", get(handlers::get_events))
        .route("/api/event-filters", get(handlers::get_event_filters))
        .route("/api/statistics", get(handlers::get_statistics))
        .route("/api/event-correlation", get(handlers::get_event_correlation))
        .route("/api/event-impact", get(handlers::get_event_impact))
        .route("/api/analysis", get(handlers::get_analysis))
        .route("/api/change-points", get(handlers::get_change_points))
        .with_state(state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Loads the data described by `config` and serves the API on the configured
/// address. Tracing must already be initialized by the caller.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr();

    // File loading and alignment are blocking work.
    let state = tokio::task::spawn_blocking(move || AppState::initialize(config)).await?;
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
