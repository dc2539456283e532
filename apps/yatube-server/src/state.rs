//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::DbErr;
use yatube_core::ports::{Cache, MediaStorage, PasswordService, TokenService};
use yatube_infra::{
    Argon2PasswordService, DbPool, InMemoryCache, JwtTokenService, LocalMediaStorage, PageCache,
    Repositories,
};

use crate::config::AppConfig;

/// How often expired entries are swept from the in-memory page cache.
const CACHE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database connection failed: {0}")]
    Database(#[source] DbErr),

    #[error("Migration failed: {0}")]
    Migration(#[source] DbErr),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub repos: Repositories,
    pub page_cache: PageCache,
    pub media: Arc<dyn MediaStorage>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub per_page: u64,
}

impl AppState {
    /// Connect to the database and wire up every service.
    pub async fn build(config: &AppConfig) -> Result<Self, StartupError> {
        let db = DbPool::connect(&config.database)
            .await
            .map_err(StartupError::Database)?;

        if config.auto_migrate {
            tracing::info!("Applying pending migrations");
            Migrator::up(&db.conn, None)
                .await
                .map_err(StartupError::Migration)?;
        }

        let cache = page_cache_backend(config).await;
        let media = Arc::new(LocalMediaStorage::new(
            config.media_root.clone(),
            config.media_url.clone(),
        ));

        let state = Self {
            repos: Repositories::new(&db.conn),
            db,
            page_cache: PageCache::new(cache, config.page_cache_ttl),
            media,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            per_page: config.posts_per_page,
        };

        tracing::info!(
            per_page = state.per_page,
            cache_ttl_secs = state.page_cache.ttl().as_secs(),
            "Application state initialized"
        );
        Ok(state)
    }
}

/// Redis when configured and reachable, otherwise a process-local cache.
async fn page_cache_backend(config: &AppConfig) -> Arc<dyn Cache> {
    #[cfg(feature = "redis")]
    if let Some(url) = &config.redis_url {
        match yatube_infra::RedisCache::connect(yatube_infra::RedisConfig::new(url.clone())).await
        {
            Ok(cache) => {
                tracing::info!("Using Redis page cache");
                return Arc::new(cache);
            }
            Err(e) => {
                tracing::error!(error = %e, "Redis unavailable. Falling back to in-memory page cache.");
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL is set but the redis feature is disabled");
    }

    let cache = Arc::new(InMemoryCache::new());
    let sweeper = Arc::clone(&cache);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweeper.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Purged expired page cache entries");
            }
        }
    });
    cache
}
