//! Repository for the `validation_methods` catalog.

use sqlx::PgPool;

use crate::models::validation_method::ValidationMethodRow;

const COLUMNS: &str = "id, code, method_type, requires_value, description, created_at, updated_at";

/// Read access to the method catalog. The catalog is seeded by migrations
/// and never written at runtime.
pub struct ValidationMethodRepo;

impl ValidationMethodRepo {
    /// List every method, ordered by id.
    pub async fn list(pool: &PgPool) -> Result<Vec<ValidationMethodRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM validation_methods ORDER BY id");
        sqlx::query_as::<_, ValidationMethodRow>(&query)
            .fetch_all(pool)
            .await
    }
}
