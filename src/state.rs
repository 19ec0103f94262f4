use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::TokenService;
use crate::cdn::{CloudinaryClient, ImageHost};
use crate::config::AppConfig;
use crate::database::{
    CategoryStore, DatabaseError, DatabaseManager, MaterialStore, PgCategoryStore, PgMaterialStore,
    PgProductStore, PgUserStore, ProductStore, UserStore,
};

/// Everything a handler may touch, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub materials: Arc<dyn MaterialStore>,
    pub users: Arc<dyn UserStore>,
    pub images: Arc<dyn ImageHost>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AppConfig>,
    /// Present when backed by PostgreSQL; used by the health check.
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn postgres(pool: PgPool, config: AppConfig) -> Self {
        Self {
            products: Arc::new(PgProductStore::new(pool.clone(), config.catalog.search_language.clone())),
            categories: Arc::new(PgCategoryStore::new(pool.clone())),
            materials: Arc::new(PgMaterialStore::new(pool.clone())),
            users: Arc::new(PgUserStore::new(pool.clone())),
            images: Arc::new(CloudinaryClient::new(&config.cdn)),
            tokens: Arc::new(TokenService::new(&config.security)),
            config: Arc::new(config),
            pool: Some(pool),
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match self.pool {
            Some(ref pool) => DatabaseManager::health_check(pool).await,
            None => Ok(()),
        }
    }
}
