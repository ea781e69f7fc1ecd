//! Model for the `validation_methods` catalog table.

use planilla_core::types::{DbId, Timestamp};
use planilla_core::validation::methods::{MethodType, ValidationMethod};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `validation_methods` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ValidationMethodRow {
    pub id: DbId,
    pub code: String,
    pub method_type: String,
    pub requires_value: bool,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<ValidationMethodRow> for ValidationMethod {
    fn from(row: ValidationMethodRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            method_type: MethodType::from_str_db(&row.method_type),
            requires_value: row.requires_value,
            description: row.description,
        }
    }
}
