//! Models for stored rule chains (`variable_validations` and
//! `variable_validation_entries`).

use planilla_core::types::{DbId, Timestamp};
use planilla_core::validation::chain::{ChainEntryRecord, ValidationRecord};
use serde::Serialize;
use sqlx::FromRow;

/// Chain header row: one per variable.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VariableValidation {
    pub id: DbId,
    pub variable_id: DbId,
    pub error_message: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `variable_validation_entries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VariableValidationEntry {
    pub id: DbId,
    pub validation_id: DbId,
    pub method_id: DbId,
    pub value: Option<String>,
    pub execution_order: i32,
    pub created_at: Timestamp,
}

impl VariableValidation {
    /// Combine the header with its entries into the exchange shape.
    ///
    /// `entries` are expected in `execution_order`.
    pub fn into_record(self, entries: Vec<VariableValidationEntry>) -> ValidationRecord {
        ValidationRecord {
            error_message: self.error_message,
            entries: entries
                .into_iter()
                .map(|e| ChainEntryRecord {
                    method_id: e.method_id,
                    value: e.value,
                    execution_order: e.execution_order,
                })
                .collect(),
        }
    }
}
