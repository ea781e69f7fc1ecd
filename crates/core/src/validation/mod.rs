//! Variable validation engine.
//!
//! A variable carries an ordered chain of validation methods picked from a
//! fixed catalog. The chain compiles into one anchored regular expression
//! plus a chain-wide error message, which consuming forms evaluate at input
//! time. Compilation and evaluation are pure; the editor session is the only
//! stateful piece and it reaches the backend through [`gateway`].

pub mod chain;
pub mod compiler;
pub mod evaluator;
pub mod gateway;
pub mod methods;
pub mod observer;
pub mod session;
