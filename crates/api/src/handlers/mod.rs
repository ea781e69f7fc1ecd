pub mod validation;
pub mod variables;
