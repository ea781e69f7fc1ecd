//! Repository for stored rule chains.
//!
//! A chain is a `variable_validations` header plus its ordered
//! `variable_validation_entries`. Writes always replace the whole entry set
//! inside one transaction, so readers never observe a half-saved chain.

use planilla_core::types::DbId;
use planilla_core::validation::chain::ValidationRecord;
use planilla_core::variable::VariableDraft;
use sqlx::{PgConnection, PgPool};

use crate::models::variable::VariableRow;
use crate::models::variable_validation::{VariableValidation, VariableValidationEntry};
use crate::repositories::variable_repo;

const COLUMNS: &str = "id, variable_id, error_message, created_at, updated_at";

const ENTRY_COLUMNS: &str = "id, validation_id, method_id, value, execution_order, created_at";

/// Provides read and replace operations for rule chains.
pub struct VariableValidationRepo;

impl VariableValidationRepo {
    /// Find the chain header for a variable.
    pub async fn find_by_variable(
        pool: &PgPool,
        variable_id: DbId,
    ) -> Result<Option<VariableValidation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM variable_validations WHERE variable_id = $1");
        sqlx::query_as::<_, VariableValidation>(&query)
            .bind(variable_id)
            .fetch_optional(pool)
            .await
    }

    /// List the entries of a chain in execution order.
    pub async fn list_entries(
        pool: &PgPool,
        validation_id: DbId,
    ) -> Result<Vec<VariableValidationEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM variable_validation_entries \
             WHERE validation_id = $1 \
             ORDER BY execution_order, id"
        );
        sqlx::query_as::<_, VariableValidationEntry>(&query)
            .bind(validation_id)
            .fetch_all(pool)
            .await
    }

    /// Load a variable's chain as a [`ValidationRecord`], or `None` if it has
    /// never been stored.
    pub async fn find_record(
        pool: &PgPool,
        variable_id: DbId,
    ) -> Result<Option<ValidationRecord>, sqlx::Error> {
        let Some(header) = Self::find_by_variable(pool, variable_id).await? else {
            return Ok(None);
        };
        let entries = Self::list_entries(pool, header.id).await?;
        Ok(Some(header.into_record(entries)))
    }

    /// Replace a variable's chain with `record`.
    ///
    /// Returns `None` if the variable does not exist.
    pub async fn replace(
        pool: &PgPool,
        variable_id: DbId,
        record: &ValidationRecord,
    ) -> Result<Option<VariableValidation>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        // Lock the variable so concurrent saves of the same chain serialize.
        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM variables WHERE id = $1 FOR UPDATE")
                .bind(variable_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(None);
        }

        let header = write_chain(&mut *tx, variable_id, record).await?;
        tx.commit().await?;

        tracing::debug!(variable_id, entries = record.entries.len(), "Rule chain replaced");
        Ok(Some(header))
    }

    /// Insert a variable and its chain in one transaction.
    pub async fn create_variable_with_validation(
        pool: &PgPool,
        draft: &VariableDraft,
        record: &ValidationRecord,
    ) -> Result<VariableRow, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO variables (code, name, default_value, is_required, scope) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            variable_repo::COLUMNS
        );
        let variable = sqlx::query_as::<_, VariableRow>(&query)
            .bind(&draft.code)
            .bind(&draft.name)
            .bind(&draft.default_value)
            .bind(draft.is_required)
            .bind(draft.scope.as_str())
            .fetch_one(&mut *tx)
            .await?;

        write_chain(&mut *tx, variable.id, record).await?;
        tx.commit().await?;

        tracing::debug!(
            variable_id = variable.id,
            code = %variable.code,
            entries = record.entries.len(),
            "Variable created with rule chain"
        );
        Ok(variable)
    }
}

/// Upsert the header and rewrite every entry of a chain.
async fn write_chain(
    conn: &mut PgConnection,
    variable_id: DbId,
    record: &ValidationRecord,
) -> Result<VariableValidation, sqlx::Error> {
    let query = format!(
        "INSERT INTO variable_validations (variable_id, error_message) \
         VALUES ($1, $2) \
         ON CONFLICT (variable_id) \
         DO UPDATE SET error_message = EXCLUDED.error_message, updated_at = NOW() \
         RETURNING {COLUMNS}"
    );
    let header = sqlx::query_as::<_, VariableValidation>(&query)
        .bind(variable_id)
        .bind(&record.error_message)
        .fetch_one(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM variable_validation_entries WHERE validation_id = $1")
        .bind(header.id)
        .execute(&mut *conn)
        .await?;

    for entry in &record.entries {
        sqlx::query(
            "INSERT INTO variable_validation_entries \
                (validation_id, method_id, value, execution_order) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(header.id)
        .bind(entry.method_id)
        .bind(&entry.value)
        .bind(entry.execution_order)
        .execute(&mut *conn)
        .await?;
    }

    Ok(header)
}
