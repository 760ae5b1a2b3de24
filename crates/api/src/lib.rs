//! Observability HTTP surface for the saga coordination engine.
//!
//! Exposes the operational boundaries of the system: health, Prometheus
//! metrics, the latest consistency check results and the dead-letter
//! queue. Command traffic enters through services, not through here.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use messaging::DeadLetterQueue;
use metrics_exporter_prometheus::PrometheusHandle;
use monitor::ConsistencyMonitor;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub monitor: Arc<ConsistencyMonitor>,
    pub dead_letters: Arc<dyn DeadLetterQueue>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/checks", get(routes::checks::list))
        .route("/dead-letters", get(routes::dead_letters::list))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
