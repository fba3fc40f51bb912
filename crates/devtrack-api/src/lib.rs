// # DevTrack HTTP API
//
// Thin `axum` layer over [`PackageService`]. Handlers translate requests
// into service calls and map [`devtrack_core::Error`] onto HTTP statuses;
// no business rule lives here.
//
// ## Routes
//
// ```text
// GET  /health                       liveness probe
// GET  /version                      build information
// GET  /api/packages                 list packages
// POST /api/packages                 register a package
// GET  /api/packages/{code}          one package with its history
// POST /api/packages/{code}/updates  append a status update
// ```

mod error;
mod packages;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use devtrack_core::PackageService;

pub use error::ApiError;

/// Shared application state.
pub type AppState = Arc<PackageService>;

/// Base path of the package resource
pub const PACKAGES_PATH: &str = "/api/packages";

/// Build the full application router.
pub fn build_router(service: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .nest(PACKAGES_PATH, packages::routes())
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "devtrackd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
