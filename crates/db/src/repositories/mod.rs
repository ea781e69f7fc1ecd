//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod validation_method_repo;
pub mod variable_repo;
pub mod variable_validation_repo;

pub use validation_method_repo::ValidationMethodRepo;
pub use variable_repo::VariableRepo;
pub use variable_validation_repo::VariableValidationRepo;
