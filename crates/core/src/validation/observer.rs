//! Diagnostics hooks for the compiler and evaluator.
//!
//! Neither the compiler nor the evaluator ever fails. Entries they skip and
//! patterns they cannot build are reported here instead.

use std::fmt;

use crate::types::DbId;

/// Why the compiler left an entry out of the compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No method has been picked for the entry yet.
    NoMethod,
    /// The entry points at a method id the catalog does not contain.
    UnknownMethod(DbId),
    /// The method needs a parameter and the entry has none.
    MissingValue,
    /// The parameter could not be parsed into the shape the method expects.
    MalformedValue(String),
    /// The method type is not understood by this build.
    UnsupportedType(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMethod => write!(f, "no method selected"),
            Self::UnknownMethod(id) => write!(f, "method {id} is not in the catalog"),
            Self::MissingValue => write!(f, "required parameter is empty"),
            Self::MalformedValue(value) => write!(f, "malformed parameter '{value}'"),
            Self::UnsupportedType(code) => write!(f, "unsupported method type '{code}'"),
        }
    }
}

/// Receives diagnostics from [`compile_with`](super::compiler::compile_with)
/// and [`evaluate_with`](super::evaluator::evaluate_with).
///
/// All methods default to doing nothing.
pub trait ValidationObserver: Send + Sync {
    /// An entry did not contribute a fragment.
    fn entry_skipped(&self, _execution_order: u32, _reason: &SkipReason) {}

    /// A compiled pattern could not be built, so the value was let through.
    fn pattern_rejected(&self, _pattern: &str, _error: &str) {}
}

/// Observer that forwards diagnostics to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ValidationObserver for TracingObserver {
    fn entry_skipped(&self, execution_order: u32, reason: &SkipReason) {
        tracing::debug!(execution_order, reason = %reason, "Rule chain entry skipped");
    }

    fn pattern_rejected(&self, pattern: &str, error: &str) {
        tracing::warn!(pattern, error, "Compiled pattern failed to build, allowing value");
    }
}
