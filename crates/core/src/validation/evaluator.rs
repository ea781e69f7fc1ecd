//! Value evaluator. Pure logic, no database access.
//!
//! Evaluation fails open. Empty values pass, and so does any value checked
//! against an empty pattern or one that cannot be built. Whether a value must be present
//! at all is decided elsewhere (see `Variable::is_required`).

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::compiler::CompiledValidation;
use super::observer::{TracingObserver, ValidationObserver};

/// Message used when a chain rejects a value but has no message of its own.
pub const DEFAULT_ERROR_MESSAGE: &str = "The value does not match the required format";

/// Result of checking one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Evaluation {
    fn pass() -> Self {
        Self {
            valid: true,
            message: None,
        }
    }

    fn fail(compiled: &CompiledValidation) -> Self {
        let message = if compiled.error_message.trim().is_empty() {
            DEFAULT_ERROR_MESSAGE.to_string()
        } else {
            compiled.error_message.clone()
        };
        Self {
            valid: false,
            message: Some(message),
        }
    }
}

/// Evaluate `value`, reporting unbuildable patterns through `tracing`.
pub fn evaluate(value: &str, compiled: &CompiledValidation) -> Evaluation {
    evaluate_with(value, compiled, &TracingObserver)
}

/// Evaluate `value`, reporting unbuildable patterns to `observer`.
pub fn evaluate_with(
    value: &str,
    compiled: &CompiledValidation,
    observer: &dyn ValidationObserver,
) -> Evaluation {
    if value.is_empty() || compiled.is_unrestricted() {
        return Evaluation::pass();
    }
    match Regex::new(&compiled.final_regex) {
        Ok(re) => check(&re, value, compiled),
        Err(err) => {
            observer.pattern_rejected(&compiled.final_regex, &err.to_string());
            Evaluation::pass()
        }
    }
}

fn check(re: &Regex, value: &str, compiled: &CompiledValidation) -> Evaluation {
    if re.is_match(value) {
        Evaluation::pass()
    } else {
        Evaluation::fail(compiled)
    }
}

/// A compiled validation with its regex built once.
///
/// For forms that check the same rule on every keystroke. Behaves exactly
/// like [`evaluate`].
#[derive(Debug, Clone)]
pub struct PreparedValidation {
    compiled: CompiledValidation,
    regex: Option<Regex>,
}

impl PreparedValidation {
    pub fn new(compiled: CompiledValidation) -> Self {
        Self::with_observer(compiled, &TracingObserver)
    }

    pub fn with_observer(compiled: CompiledValidation, observer: &dyn ValidationObserver) -> Self {
        let regex = if compiled.is_unrestricted() {
            None
        } else {
            match Regex::new(&compiled.final_regex) {
                Ok(re) => Some(re),
                Err(err) => {
                    observer.pattern_rejected(&compiled.final_regex, &err.to_string());
                    None
                }
            }
        };
        Self { compiled, regex }
    }

    pub fn compiled(&self) -> &CompiledValidation {
        &self.compiled
    }

    pub fn evaluate(&self, value: &str) -> Evaluation {
        match &self.regex {
            Some(re) if !value.is_empty() => check(re, value, &self.compiled),
            _ => Evaluation::pass(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
