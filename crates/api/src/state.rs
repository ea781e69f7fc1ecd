use std::sync::Arc;

use planilla_core::validation::gateway::{GatewayError, ValidationGateway};
use planilla_core::validation::methods::{CatalogCache, MethodCatalog};
use planilla_db::gateway::PgValidationGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything inside is behind `Arc` or is a pool handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: planilla_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Rule chain persistence.
    pub gateway: PgValidationGateway,
    /// Method catalog, fetched once and shared by every request.
    pub catalog: Arc<CatalogCache>,
}

impl AppState {
    pub fn new(pool: planilla_db::DbPool, config: ServerConfig) -> Self {
        Self {
            gateway: PgValidationGateway::new(pool.clone()),
            pool,
            config: Arc::new(config),
            catalog: Arc::new(CatalogCache::new()),
        }
    }

    /// The method catalog, loading it on first use.
    pub async fn method_catalog(&self) -> Result<Arc<MethodCatalog>, GatewayError> {
        self.catalog
            .get_or_fetch(|| self.gateway.fetch_method_catalog())
            .await
    }
}
