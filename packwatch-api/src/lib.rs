//! # packwatch-api
//!
//! HTTP surface of the relay: telemetry ingest, history/latest queries,
//! device config relay, sink readback, and Prometheus exposition.
//!
//! Routes mirror the endpoints the device firmware already targets:
//! `POST /update` (and `/api/update`), `GET /data` (and `/api/data`),
//! `GET /api/data/latest`, `GET|POST /api/config`, `GET /api/logs`,
//! `GET /metrics`.

pub mod error;
pub mod handlers;
pub mod relay;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

pub use error::ApiError;
pub use relay::DeviceRelay;
pub use state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/update", post(handlers::update))
        .route("/api/update", post(handlers::update))
        .route("/data", get(handlers::data))
        .route("/api/data", get(handlers::data))
        .route("/api/data/latest", get(handlers::latest))
        .route(
            "/api/config",
            get(handlers::config_get).post(handlers::config_set),
        )
        .route("/api/logs", get(handlers::logs))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
