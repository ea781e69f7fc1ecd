//! Handlers for the `/variables` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use planilla_core::error::CoreError;
use planilla_core::types::DbId;
use planilla_core::validation::chain::ValidationRecord;
use planilla_core::validation::gateway::ValidationGateway;
use planilla_core::variable::{Variable, VariableDraft, VariableScope};
use planilla_db::models::variable::VariableRow;
use planilla_db::repositories::VariableRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::validation::normalize_record;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for listing variables.
#[derive(Debug, Deserialize)]
pub struct ListVariablesParams {
    pub scope: Option<String>,
}

/// Request body for creating a variable with its rule chain.
#[derive(Debug, Deserialize)]
pub struct CreateVariable {
    #[serde(flatten)]
    pub variable: VariableDraft,
    #[serde(default)]
    pub validation: ValidationRecord,
}

/// A created variable together with the chain stored for it.
#[derive(Debug, Serialize)]
pub struct VariableWithValidation {
    pub variable: Variable,
    pub validation: ValidationRecord,
}

/// GET /api/v1/variables?scope=X
pub async fn list_variables(
    State(state): State<AppState>,
    Query(params): Query<ListVariablesParams>,
) -> AppResult<Json<DataResponse<Vec<VariableRow>>>> {
    let scope = params
        .scope
        .as_deref()
        .map(VariableScope::from_str_db)
        .transpose()?;
    let rows = VariableRepo::list(&state.pool, scope.as_ref().map(VariableScope::as_str)).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// GET /api/v1/variables/{id}
pub async fn get_variable(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VariableRow>>> {
    let row = VariableRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Variable",
            id,
        })?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /api/v1/variables
///
/// Create a variable and its chain in one transaction. Returns HTTP 201.
/// A duplicate `code` yields 409.
pub async fn create_variable(
    State(state): State<AppState>,
    Json(input): Json<CreateVariable>,
) -> AppResult<(StatusCode, Json<DataResponse<VariableWithValidation>>)> {
    input.variable.ensure_valid()?;
    let catalog = state.method_catalog().await?;
    let validation = normalize_record(input.validation, &catalog)?;

    let variable = state
        .gateway
        .create_variable_with_validation(&input.variable, &validation)
        .await?;
    tracing::info!(variable_id = variable.id, code = %variable.code, "Variable created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: VariableWithValidation {
                variable,
                validation,
            },
        }),
    ))
}
