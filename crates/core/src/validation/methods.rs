//! Validation method catalog.
//!
//! The catalog is seeded lookup data on the backend. Each method has a
//! stable `code` and a `method_type` that selects how the compiler turns an
//! entry into a regex fragment.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::types::DbId;

use super::gateway::GatewayError;

// ---------------------------------------------------------------------------
// Method types
// ---------------------------------------------------------------------------

/// The kind of rule primitive a catalog method stands for.
///
/// Codes unknown to this build are kept as [`MethodType::Unsupported`] so a
/// newer catalog never breaks an older client; the compiler treats them as
/// inert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MethodType {
    NumbersOnly,
    LettersOnly,
    UppercaseOnly,
    LowercaseOnly,
    AllowSpaces,
    ExactLength,
    LengthRange,
    MinLength,
    MaxLength,
    Unsupported(String),
}

impl MethodType {
    /// Parse a method type code from the database.
    pub fn from_str_db(s: &str) -> Self {
        match s {
            "NUMBERS_ONLY" => Self::NumbersOnly,
            "LETTERS_ONLY" => Self::LettersOnly,
            "UPPERCASE_ONLY" => Self::UppercaseOnly,
            "LOWERCASE_ONLY" => Self::LowercaseOnly,
            "ALLOW_SPACES" => Self::AllowSpaces,
            "EXACT_LENGTH" => Self::ExactLength,
            "LENGTH_RANGE" => Self::LengthRange,
            "MIN_LENGTH" => Self::MinLength,
            "MAX_LENGTH" => Self::MaxLength,
            other => Self::Unsupported(other.to_string()),
        }
    }

    /// Convert to the database code.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NumbersOnly => "NUMBERS_ONLY",
            Self::LettersOnly => "LETTERS_ONLY",
            Self::UppercaseOnly => "UPPERCASE_ONLY",
            Self::LowercaseOnly => "LOWERCASE_ONLY",
            Self::AllowSpaces => "ALLOW_SPACES",
            Self::ExactLength => "EXACT_LENGTH",
            Self::LengthRange => "LENGTH_RANGE",
            Self::MinLength => "MIN_LENGTH",
            Self::MaxLength => "MAX_LENGTH",
            Self::Unsupported(code) => code,
        }
    }
}

impl From<String> for MethodType {
    fn from(s: String) -> Self {
        Self::from_str_db(&s)
    }
}

impl From<MethodType> for String {
    fn from(t: MethodType) -> Self {
        t.as_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Methods and catalog
// ---------------------------------------------------------------------------

/// A single entry of the method catalog. Never mutated by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMethod {
    pub id: DbId,
    pub code: String,
    pub method_type: MethodType,
    /// Whether an entry using this method needs a parameter value.
    pub requires_value: bool,
    pub description: Option<String>,
}

/// Read-only, ordered registry of validation methods.
#[derive(Debug, Clone, Default)]
pub struct MethodCatalog {
    methods: Vec<ValidationMethod>,
    by_id: HashMap<DbId, usize>,
}

impl MethodCatalog {
    /// Build a catalog, preserving the order the backend returned.
    pub fn new(methods: Vec<ValidationMethod>) -> Self {
        let by_id = methods
            .iter()
            .enumerate()
            .map(|(idx, m)| (m.id, idx))
            .collect();
        Self { methods, by_id }
    }

    /// All methods in catalog order.
    pub fn list_methods(&self) -> &[ValidationMethod] {
        &self.methods
    }

    pub fn get(&self, id: DbId) -> Option<&ValidationMethod> {
        self.by_id.get(&id).map(|&idx| &self.methods[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }
}

/// Process-wide cache holding the catalog after its first successful fetch.
///
/// Shared between editor sessions and HTTP handlers through an `Arc`. A
/// failed fetch leaves the cache empty so the next caller retries.
#[derive(Debug, Default)]
pub struct CatalogCache {
    cell: OnceCell<Arc<MethodCatalog>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached catalog, running `fetch` only if nothing is cached yet.
    pub async fn get_or_fetch<F, Fut>(&self, fetch: F) -> Result<Arc<MethodCatalog>, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ValidationMethod>, GatewayError>>,
    {
        self.cell
            .get_or_try_init(|| async move {
                let methods = fetch().await?;
                tracing::debug!(count = methods.len(), "Validation method catalog cached");
                Ok::<_, GatewayError>(Arc::new(MethodCatalog::new(methods)))
            })
            .await
            .cloned()
    }

    /// The cached catalog, if one has been fetched.
    pub fn cached(&self) -> Option<Arc<MethodCatalog>> {
        self.cell.get().cloned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
