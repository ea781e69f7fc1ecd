//! Model for the `variables` table.

use planilla_core::error::CoreError;
use planilla_core::types::{DbId, Timestamp};
use planilla_core::variable::{Variable, VariableScope};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `variables` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VariableRow {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub default_value: Option<String>,
    pub is_required: bool,
    pub scope: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<VariableRow> for Variable {
    type Error = CoreError;

    fn try_from(row: VariableRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            scope: VariableScope::from_str_db(&row.scope)?,
            code: row.code,
            name: row.name,
            default_value: row.default_value,
            is_required: row.is_required,
        })
    }
}
