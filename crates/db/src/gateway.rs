//! PostgreSQL implementation of [`ValidationGateway`].

use planilla_core::types::DbId;
use planilla_core::validation::chain::ValidationRecord;
use planilla_core::validation::gateway::{GatewayError, ValidationGateway};
use planilla_core::validation::methods::ValidationMethod;
use planilla_core::variable::{Variable, VariableDraft};

use crate::repositories::{ValidationMethodRepo, VariableRepo, VariableValidationRepo};
use crate::DbPool;

/// Message returned to users when a query fails for reasons they cannot fix.
const BACKEND_UNAVAILABLE: &str = "The validation backend is unavailable";

/// Gateway backed by the planilla database.
#[derive(Debug, Clone)]
pub struct PgValidationGateway {
    pool: DbPool,
}

impl PgValidationGateway {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl ValidationGateway for PgValidationGateway {
    async fn fetch_method_catalog(&self) -> Result<Vec<ValidationMethod>, GatewayError> {
        let rows = ValidationMethodRepo::list(&self.pool)
            .await
            .map_err(backend_error)?;
        Ok(rows.into_iter().map(ValidationMethod::from).collect())
    }

    async fn fetch_variable_validation(
        &self,
        variable_id: DbId,
    ) -> Result<Option<ValidationRecord>, GatewayError> {
        if !VariableRepo::exists(&self.pool, variable_id)
            .await
            .map_err(backend_error)?
        {
            return Err(variable_not_found(variable_id));
        }
        VariableValidationRepo::find_record(&self.pool, variable_id)
            .await
            .map_err(backend_error)
    }

    async fn save_variable_validation(
        &self,
        variable_id: DbId,
        record: &ValidationRecord,
    ) -> Result<(), GatewayError> {
        VariableValidationRepo::replace(&self.pool, variable_id, record)
            .await
            .map_err(backend_error)?
            .map(|_| ())
            .ok_or_else(|| variable_not_found(variable_id))
    }

    async fn create_variable_with_validation(
        &self,
        draft: &VariableDraft,
        record: &ValidationRecord,
    ) -> Result<Variable, GatewayError> {
        draft
            .ensure_valid()
            .map_err(|e| GatewayError::Backend(e.to_string()))?;

        let row = VariableValidationRepo::create_variable_with_validation(&self.pool, draft, record)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    GatewayError::Conflict(format!(
                        "A variable with code '{}' already exists",
                        draft.code
                    ))
                } else {
                    backend_error(err)
                }
            })?;

        Variable::try_from(row).map_err(|e| {
            tracing::error!(error = %e, "Stored variable has an invalid scope");
            GatewayError::Backend(BACKEND_UNAVAILABLE.to_string())
        })
    }
}

fn variable_not_found(id: DbId) -> GatewayError {
    GatewayError::NotFound {
        entity: "Variable",
        id,
    }
}

/// Log the driver error and hide it behind a generic message.
fn backend_error(err: sqlx::Error) -> GatewayError {
    tracing::error!(error = %err, "Validation gateway query failed");
    GatewayError::Backend(BACKEND_UNAVAILABLE.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}
