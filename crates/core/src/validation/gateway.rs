//! Persistence gateway interface.
//!
//! Defines [`ValidationGateway`], the trait the backend integration layer
//! implements so editor sessions can load and store rule chains without
//! knowing how they are persisted.

use std::future::Future;

use crate::types::DbId;
use crate::variable::{Variable, VariableDraft};

use super::chain::ValidationRecord;
use super::methods::ValidationMethod;

/// Errors reported by a gateway implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The referenced entity does not exist on the backend.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// The backend rejected or failed the request. The message is shown to
    /// the user as-is.
    #[error("{0}")]
    Backend(String),

    /// The write collides with stored data, such as a duplicate variable code.
    #[error("{0}")]
    Conflict(String),
}

/// Backend operations the validation engine depends on.
pub trait ValidationGateway: Send + Sync {
    /// Fetch the full method catalog, in display order.
    fn fetch_method_catalog(
        &self,
    ) -> impl Future<Output = Result<Vec<ValidationMethod>, GatewayError>> + Send;

    /// Fetch the stored chain for a variable, or `None` if it has none.
    fn fetch_variable_validation(
        &self,
        variable_id: DbId,
    ) -> impl Future<Output = Result<Option<ValidationRecord>, GatewayError>> + Send;

    /// Replace the stored chain of an existing variable.
    fn save_variable_validation(
        &self,
        variable_id: DbId,
        record: &ValidationRecord,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;

    /// Create a variable and its chain in one step.
    fn create_variable_with_validation(
        &self,
        draft: &VariableDraft,
        record: &ValidationRecord,
    ) -> impl Future<Output = Result<Variable, GatewayError>> + Send;
}
