//! Database row structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! table row and the conversion into the `planilla-core` domain type.

pub mod validation_method;
pub mod variable;
pub mod variable_validation;
