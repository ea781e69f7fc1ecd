//! Route definitions for the `/validation` and `/variables` resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{validation, variables};
use crate::state::AppState;

/// Routes mounted at `/validation`.
///
/// ```text
/// GET    /methods    -> list_methods
/// POST   /compile    -> compile_chain    (preview)
/// POST   /evaluate   -> evaluate_value   (preview)
/// ```
pub fn validation_router() -> Router<AppState> {
    Router::new()
        .route("/methods", get(validation::list_methods))
        .route("/compile", post(validation::compile_chain))
        .route("/evaluate", post(validation::evaluate_value))
}

/// Routes mounted at `/variables`.
///
/// ```text
/// GET    /                        -> list_variables   (?scope)
/// POST   /                        -> create_variable
/// GET    /{id}                    -> get_variable
/// GET    /{id}/validation         -> get_variable_validation
/// PUT    /{id}/validation         -> put_variable_validation
/// GET    /{id}/validation/compiled -> get_compiled_validation
/// ```
pub fn variables_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(variables::list_variables).post(variables::create_variable),
        )
        .route("/{id}", get(variables::get_variable))
        .route(
            "/{id}/validation",
            get(validation::get_variable_validation).put(validation::put_variable_validation),
        )
        .route(
            "/{id}/validation/compiled",
            get(validation::get_compiled_validation),
        )
}
