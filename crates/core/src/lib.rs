//! Planilla core library.
//!
//! Domain types and the variable validation engine. Nothing in this crate
//! talks to the database directly; persistence goes through the
//! [`validation::gateway::ValidationGateway`] trait.

pub mod error;
pub mod types;
pub mod validation;
pub mod variable;
