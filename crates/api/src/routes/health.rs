//! Liveness route for the rule engine service.
//!
//! Reports database reachability and whether the shared method catalog has
//! been loaded. The catalog is never fetched from here; it still loads on the
//! first rule request.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database cannot be reached.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub catalog_loaded: bool,
    /// Number of cached validation methods, `null` until the catalog loads.
    pub catalog_methods: Option<usize>,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = planilla_db::health_check(&state.pool).await.is_ok();
    let catalog_methods = state.catalog.cached().map(|catalog| catalog.len());

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        catalog_loaded: catalog_methods.is_some(),
        catalog_methods,
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
