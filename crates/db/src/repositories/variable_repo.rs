//! Repository for the `variables` table.

use planilla_core::types::DbId;
use sqlx::PgPool;

use crate::models::variable::VariableRow;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str =
    "id, code, name, default_value, is_required, scope, created_at, updated_at";

/// Provides lookups for variables.
///
/// Variables are created together with their rule chain, see
/// [`VariableValidationRepo::create_variable_with_validation`](super::VariableValidationRepo::create_variable_with_validation).
pub struct VariableRepo;

impl VariableRepo {
    /// Find a variable by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VariableRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM variables WHERE id = $1");
        sqlx::query_as::<_, VariableRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List variables ordered by code, optionally restricted to one scope.
    pub async fn list(pool: &PgPool, scope: Option<&str>) -> Result<Vec<VariableRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM variables \
             WHERE ($1::TEXT IS NULL OR scope = $1) \
             ORDER BY code"
        );
        sqlx::query_as::<_, VariableRow>(&query)
            .bind(scope)
            .fetch_all(pool)
            .await
    }

    /// Whether a variable with the given id exists.
    pub async fn exists(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM variables WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }
}
