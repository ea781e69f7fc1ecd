pub mod health;
pub mod validation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /validation                                  catalog and previews
/// /variables                                   variables and their rule chains
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/validation", validation::validation_router())
        .nest("/variables", validation::variables_router())
}
