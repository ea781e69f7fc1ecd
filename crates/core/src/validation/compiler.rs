//! Rule chain compiler. Pure logic, no database access.
//!
//! Turns a [`RuleChain`] into one anchored regular expression:
//!
//! - character class methods are unioned into a single bracket expression,
//!   emitted in a fixed order so reordering them never changes the result;
//! - length methods become a repetition on that expression, and the last
//!   one in execution order wins;
//! - with no length method the class repeats `+`; with no class method the
//!   length applies to any character.
//!
//! An empty result means "no restriction". Entries that cannot be used are
//! skipped and reported to the [`ValidationObserver`], never raised.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::chain::{RuleChain, RuleChainEntry};
use super::methods::{MethodCatalog, MethodType};
use super::observer::{SkipReason, TracingObserver, ValidationObserver};

/// Largest repetition count accepted from a length parameter.
pub const MAX_REPETITION: u32 = 1000;

/// The derived regex and message for a rule chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledValidation {
    pub final_regex: String,
    pub error_message: String,
}

impl CompiledValidation {
    /// Whether this rule accepts every value.
    pub fn is_unrestricted(&self) -> bool {
        self.final_regex.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Rule primitives
// ---------------------------------------------------------------------------

/// Character sets a class method contributes. Declaration order is the
/// order they appear inside the bracket expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CharClass {
    Digits,
    Letters,
    Uppercase,
    Lowercase,
    Space,
}

impl CharClass {
    /// Bracket-expression body for this class.
    pub fn set(self) -> &'static str {
        match self {
            Self::Digits => "0-9",
            Self::Letters => "a-zA-ZáéíóúÁÉÍÓÚñÑüÜ",
            Self::Uppercase => "A-ZÁÉÍÓÚÑÜ",
            Self::Lowercase => "a-záéíóúñü",
            Self::Space => " ",
        }
    }
}

/// Repetition constraint a length method contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Exact(u32),
    Range { min: u32, max: u32 },
    AtLeast(u32),
    AtMost(u32),
}

impl Quantifier {
    pub fn render(self) -> String {
        match self {
            Self::Exact(n) => format!("{{{n}}}"),
            Self::Range { min, max } => format!("{{{min},{max}}}"),
            Self::AtLeast(n) => format!("{{{n},}}"),
            Self::AtMost(n) => format!("{{1,{n}}}"),
        }
    }
}

/// What a single usable entry contributes to the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePrimitive {
    CharClass(CharClass),
    Quantifier(Quantifier),
    /// A method type this build does not know; contributes nothing.
    Inert,
}

impl RulePrimitive {
    /// Resolve a method type and its raw parameter into a primitive.
    pub fn resolve(method_type: &MethodType, value: &str) -> Result<Self, SkipReason> {
        let primitive = match method_type {
            MethodType::NumbersOnly => Self::CharClass(CharClass::Digits),
            MethodType::LettersOnly => Self::CharClass(CharClass::Letters),
            MethodType::UppercaseOnly => Self::CharClass(CharClass::Uppercase),
            MethodType::LowercaseOnly => Self::CharClass(CharClass::Lowercase),
            MethodType::AllowSpaces => Self::CharClass(CharClass::Space),
            MethodType::ExactLength => Self::Quantifier(Quantifier::Exact(parse_count(value)?)),
            MethodType::LengthRange => {
                let (min, max) = parse_range(value)?;
                Self::Quantifier(Quantifier::Range { min, max })
            }
            MethodType::MinLength => Self::Quantifier(Quantifier::AtLeast(parse_count(value)?)),
            MethodType::MaxLength => Self::Quantifier(Quantifier::AtMost(parse_count(value)?)),
            MethodType::Unsupported(_) => Self::Inert,
        };
        Ok(primitive)
    }
}

fn parse_count(value: &str) -> Result<u32, SkipReason> {
    match value.trim().parse::<u32>() {
        Ok(n) if (1..=MAX_REPETITION).contains(&n) => Ok(n),
        _ => Err(SkipReason::MalformedValue(value.to_string())),
    }
}

/// Parse a `"min,max"` parameter.
fn parse_range(value: &str) -> Result<(u32, u32), SkipReason> {
    let malformed = || SkipReason::MalformedValue(value.to_string());
    let (min, max) = value.split_once(',').ok_or_else(malformed)?;
    let min = parse_count(min).map_err(|_| malformed())?;
    let max = parse_count(max).map_err(|_| malformed())?;
    if min > max {
        return Err(malformed());
    }
    Ok((min, max))
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile a chain, reporting skipped entries through `tracing`.
pub fn compile(chain: &RuleChain, catalog: &MethodCatalog) -> CompiledValidation {
    compile_with(chain, catalog, &TracingObserver)
}

/// Compile a chain, reporting skipped entries to `observer`.
pub fn compile_with(
    chain: &RuleChain,
    catalog: &MethodCatalog,
    observer: &dyn ValidationObserver,
) -> CompiledValidation {
    let mut ordered: Vec<&RuleChainEntry> = chain.entries.iter().collect();
    ordered.sort_by_key(|e| e.execution_order);

    let mut classes = BTreeSet::new();
    let mut quantifier = None;

    for entry in ordered {
        match usable_primitive(entry, catalog) {
            Ok(RulePrimitive::CharClass(class)) => {
                classes.insert(class);
            }
            Ok(RulePrimitive::Quantifier(q)) => quantifier = Some(q),
            Ok(RulePrimitive::Inert) => {
                let code = entry
                    .method_id
                    .and_then(|id| catalog.get(id))
                    .map(|m| m.method_type.as_str().to_string())
                    .unwrap_or_default();
                observer.entry_skipped(entry.execution_order, &SkipReason::UnsupportedType(code));
            }
            Err(reason) => observer.entry_skipped(entry.execution_order, &reason),
        }
    }

    CompiledValidation {
        final_regex: assemble(&classes, quantifier),
        error_message: chain.error_message.clone(),
    }
}

/// Apply the exclusion rules to one entry and resolve what is left.
fn usable_primitive(
    entry: &RuleChainEntry,
    catalog: &MethodCatalog,
) -> Result<RulePrimitive, SkipReason> {
    let method_id = entry.method_id.ok_or(SkipReason::NoMethod)?;
    let method = catalog
        .get(method_id)
        .ok_or(SkipReason::UnknownMethod(method_id))?;
    if method.requires_value && entry.value.trim().is_empty() {
        return Err(SkipReason::MissingValue);
    }
    RulePrimitive::resolve(&method.method_type, &entry.value)
}

fn assemble(classes: &BTreeSet<CharClass>, quantifier: Option<Quantifier>) -> String {
    if classes.is_empty() && quantifier.is_none() {
        return String::new();
    }

    let body = if classes.is_empty() {
        ".".to_string()
    } else {
        let set: String = classes.iter().map(|c| c.set()).collect();
        format!("[{set}]")
    };
    let repeat = quantifier.map_or_else(|| "+".to_string(), Quantifier::render);

    format!("^{body}{repeat}$")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
