use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr};

/// Configuration for the primary database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Log every statement through `tracing` (noisy; off by default).
    pub sqlx_logging: bool,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            sqlx_logging: false,
        }
    }
}

/// Pooled connection to the primary database.
#[derive(Clone)]
pub struct DbPool {
    pub conn: DbConn,
}

impl DbPool {
    /// Open the pool described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection pool...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(config.sqlx_logging)
            .to_owned();

        let conn = Database::connect(opts).await?;
        tracing::info!(
            backend = ?conn.get_database_backend(),
            pool = config.max_connections,
            "Database connected"
        );

        Ok(Self { conn })
    }

    pub fn from_conn(conn: DbConn) -> Self {
        Self { conn }
    }

    /// Cheap liveness probe used by the health endpoint.
    pub async fn ping(&self) -> bool {
        match self.conn.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database ping failed");
                false
            }
        }
    }
}
