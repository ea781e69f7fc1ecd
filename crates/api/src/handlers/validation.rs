//! Handlers for the `/validation` resource and per-variable rule chains.
//!
//! Covers the method catalog, compile/evaluate previews for unsaved chains,
//! and reading, replacing and compiling a variable's stored chain.

use axum::extract::{Path, State};
use axum::Json;
use planilla_core::error::CoreError;
use planilla_core::types::DbId;
use planilla_core::validation::chain::{RuleChain, ValidationRecord};
use planilla_core::validation::compiler::{compile, CompiledValidation};
use planilla_core::validation::evaluator::{evaluate, Evaluation};
use planilla_core::validation::gateway::ValidationGateway;
use planilla_core::validation::methods::{MethodCatalog, ValidationMethod};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Catalog and previews
// ---------------------------------------------------------------------------

/// GET /api/v1/validation/methods
///
/// List the method catalog in display order.
pub async fn list_methods(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ValidationMethod>>>> {
    let catalog = state.method_catalog().await?;
    Ok(Json(DataResponse {
        data: catalog.list_methods().to_vec(),
    }))
}

/// POST /api/v1/validation/compile
///
/// Compile a chain that has not been saved, for live previews.
pub async fn compile_chain(
    State(state): State<AppState>,
    Json(chain): Json<RuleChain>,
) -> AppResult<Json<DataResponse<CompiledValidation>>> {
    let catalog = state.method_catalog().await?;
    Ok(Json(DataResponse {
        data: compile(&chain, &catalog),
    }))
}

/// Request body for `POST /validation/evaluate`.
///
/// Exactly one of `rule` or `variable_id` must be given.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub value: String,
    pub rule: Option<CompiledValidation>,
    pub variable_id: Option<DbId>,
}

/// POST /api/v1/validation/evaluate
///
/// Check a sample value against a compiled rule, or against the stored rule
/// of a variable.
pub async fn evaluate_value(
    State(state): State<AppState>,
    Json(input): Json<EvaluateRequest>,
) -> AppResult<Json<DataResponse<Evaluation>>> {
    let rule = match (input.rule, input.variable_id) {
        (Some(rule), None) => rule,
        (None, Some(variable_id)) => compiled_for(&state, variable_id).await?,
        _ => {
            return Err(AppError::BadRequest(
                "Provide exactly one of 'rule' or 'variable_id'".to_string(),
            ))
        }
    };
    Ok(Json(DataResponse {
        data: evaluate(&input.value, &rule),
    }))
}

// ---------------------------------------------------------------------------
// Stored chains
// ---------------------------------------------------------------------------

/// GET /api/v1/variables/{id}/validation
///
/// The stored chain, or an empty chain if none has been saved.
pub async fn get_variable_validation(
    State(state): State<AppState>,
    Path(variable_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ValidationRecord>>> {
    let record = state
        .gateway
        .fetch_variable_validation(variable_id)
        .await?
        .unwrap_or_default();
    Ok(Json(DataResponse { data: record }))
}

/// PUT /api/v1/variables/{id}/validation
///
/// Replace the stored chain. Entries are renumbered in order; returns the
/// chain as stored.
pub async fn put_variable_validation(
    State(state): State<AppState>,
    Path(variable_id): Path<DbId>,
    Json(input): Json<ValidationRecord>,
) -> AppResult<Json<DataResponse<ValidationRecord>>> {
    let catalog = state.method_catalog().await?;
    let record = normalize_record(input, &catalog)?;

    state
        .gateway
        .save_variable_validation(variable_id, &record)
        .await?;
    tracing::info!(variable_id, entries = record.entries.len(), "Variable validation saved");

    Ok(Json(DataResponse { data: record }))
}

/// GET /api/v1/variables/{id}/validation/compiled
///
/// The compiled rule consuming forms evaluate against.
pub async fn get_compiled_validation(
    State(state): State<AppState>,
    Path(variable_id): Path<DbId>,
) -> AppResult<Json<DataResponse<CompiledValidation>>> {
    let compiled = compiled_for(&state, variable_id).await?;
    Ok(Json(DataResponse { data: compiled }))
}

async fn compiled_for(state: &AppState, variable_id: DbId) -> AppResult<CompiledValidation> {
    let catalog = state.method_catalog().await?;
    let record = state
        .gateway
        .fetch_variable_validation(variable_id)
        .await?
        .unwrap_or_default();
    Ok(compile(&RuleChain::from_record(record), &catalog))
}

/// Reject references to methods outside the catalog and renumber entries.
///
/// Blank values are stored as `NULL`.
pub(crate) fn normalize_record(
    record: ValidationRecord,
    catalog: &MethodCatalog,
) -> Result<ValidationRecord, CoreError> {
    if let Some(unknown) = record
        .entries
        .iter()
        .find(|e| catalog.get(e.method_id).is_none())
    {
        return Err(CoreError::Validation(format!(
            "Unknown validation method id {}",
            unknown.method_id
        )));
    }
    Ok(RuleChain::from_record(record).to_record())
}
