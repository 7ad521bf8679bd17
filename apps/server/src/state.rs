//! Shared application state

use crate::config::Config;
use crate::facet::store::{FacetStore, RedisFacetStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

/// State shared across request handlers
///
/// Cheap to clone: the pool and the facet store are both handles.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: PgPool,
    pub facets: Arc<dyn FacetStore>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await?;

        tracing::info!(
            max_connections = config.database.max_connections,
            "Connected to PostgreSQL"
        );

        let facets = RedisFacetStore::connect(&config.index.redis_url).await?;
        tracing::info!("Connected to Redis facet index store");

        Ok(Self {
            config: Arc::new(config),
            db,
            facets: Arc::new(facets),
        })
    }
}
