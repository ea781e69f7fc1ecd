//! Variables: named placeholders used in document templates or as
//! standalone validated fields.
//!
//! Variables are created and edited by the template screens. The validation
//! engine only needs their id and the rule chain attached to them.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum length of a variable code.
pub const MAX_CODE_LEN: u64 = 64;

/// Maximum length of a variable display name.
pub const MAX_NAME_LEN: u64 = 200;

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// Which screen family owns a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableScope {
    ContractTemplate,
    AddendumTemplate,
    Dynamic,
}

impl VariableScope {
    /// Parse a scope string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "contract_template" => Ok(Self::ContractTemplate),
            "addendum_template" => Ok(Self::AddendumTemplate),
            "dynamic" => Ok(Self::Dynamic),
            _ => Err(CoreError::Validation(format!(
                "Invalid variable scope '{s}'. Must be one of: contract_template, addendum_template, dynamic"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContractTemplate => "contract_template",
            Self::AddendumTemplate => "addendum_template",
            Self::Dynamic => "dynamic",
        }
    }
}

// ---------------------------------------------------------------------------
// Variable
// ---------------------------------------------------------------------------

/// A stored variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: DbId,
    pub code: String,
    pub name: String,
    pub default_value: Option<String>,
    /// Presence is enforced by the consuming form, not by the rule chain.
    pub is_required: bool,
    pub scope: VariableScope,
}

/// Input for creating a variable together with its rule chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct VariableDraft {
    #[validate(
        length(min = 1, max = MAX_CODE_LEN),
        custom(function = "validate_variable_code")
    )]
    pub code: String,
    #[validate(length(min = 1, max = MAX_NAME_LEN))]
    pub name: String,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    pub scope: VariableScope,
}

impl VariableDraft {
    /// Run field validation, mapping failures to [`CoreError::Validation`].
    pub fn ensure_valid(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(format!("Invalid variable: {e}")))
    }
}

/// Codes are written into templates as placeholders, so they are restricted
/// to `UPPER_SNAKE_CASE` starting with a letter.
fn validate_variable_code(code: &str) -> Result<(), ValidationError> {
    let mut chars = code.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_uppercase());
    let rest_ok = chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if starts_with_letter && rest_ok {
        Ok(())
    } else {
        Err(ValidationError::new("variable_code")
            .with_message("must be UPPER_SNAKE_CASE and start with a letter".into()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn draft(code: &str, name: &str) -> VariableDraft {
        VariableDraft {
            code: code.to_string(),
            name: name.to_string(),
            default_value: None,
            is_required: true,
            scope: VariableScope::ContractTemplate,
        }
    }

    #[test]
    fn scope_round_trip() {
        for scope in [
            VariableScope::ContractTemplate,
            VariableScope::AddendumTemplate,
            VariableScope::Dynamic,
        ] {
            assert_eq!(VariableScope::from_str_db(scope.as_str()).unwrap(), scope);
        }
    }

    #[test]
    fn unknown_scope_rejected() {
        assert_matches!(
            VariableScope::from_str_db("payroll"),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft("EMPLOYEE_DNI", "DNI del trabajador").ensure_valid().is_ok());
        assert!(draft("RUC11", "RUC").ensure_valid().is_ok());
    }

    #[test]
    fn bad_codes_rejected() {
        for code in ["", "employee_dni", "1DNI", "DNI-EMPLEADO", "DNI EMPLEADO"] {
            assert_matches!(
                draft(code, "DNI").ensure_valid(),
                Err(CoreError::Validation(_)),
                "code {code:?} should be rejected"
            );
        }
    }

    #[test]
    fn overlong_code_rejected() {
        let code = "A".repeat(MAX_CODE_LEN as usize + 1);
        assert!(draft(&code, "Long").ensure_valid().is_err());
    }

    #[test]
    fn lengths_at_the_limit_accepted() {
        let code = "A".repeat(MAX_CODE_LEN as usize);
        let name = "n".repeat(MAX_NAME_LEN as usize);
        assert!(draft(&code, &name).ensure_valid().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        assert!(draft("DNI", "").ensure_valid().is_err());
    }

    #[test]
    fn overlong_name_rejected() {
        let name = "n".repeat(MAX_NAME_LEN as usize + 1);
        assert!(draft("DNI", &name).ensure_valid().is_err());
    }
}
