//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use yatube_core::pagination::DEFAULT_PER_PAGE;
use yatube_infra::{DatabaseConfig, JwtConfig};

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    /// Apply pending migrations on startup.
    pub auto_migrate: bool,
    pub media_root: PathBuf,
    /// URL prefix uploaded media is served under.
    pub media_url: String,
    pub posts_per_page: u64,
    pub page_cache_ttl: Duration,
    pub redis_url: Option<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let database = DatabaseConfig {
            max_connections: parsed(&get, "DB_MAX_CONNECTIONS", 20)?,
            min_connections: parsed(&get, "DB_MIN_CONNECTIONS", 2)?,
            sqlx_logging: flag(&get, "DB_LOG_STATEMENTS", false)?,
            ..DatabaseConfig::new(database_url)
        };

        let jwt = JwtConfig {
            secret: get("JWT_SECRET").unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            expiration_hours: parsed(&get, "JWT_EXPIRATION_HOURS", 24 * 14)?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "yatube".to_string()),
        };
        if jwt.secret == DEFAULT_JWT_SECRET {
            let is_production = get("RUST_ENV").is_some_and(|v| v == "production" || v == "prod");
            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        let posts_per_page = parsed(&get, "POSTS_PER_PAGE", DEFAULT_PER_PAGE)?;
        if posts_per_page == 0 {
            return Err(ConfigError::Invalid {
                key: "POSTS_PER_PAGE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parsed(&get, "PORT", 8080)?,
            database,
            auto_migrate: flag(&get, "AUTO_MIGRATE", true)?,
            media_root: get("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("media")),
            media_url: get("MEDIA_URL").unwrap_or_else(|| "/media".to_string()),
            posts_per_page,
            page_cache_ttl: Duration::from_secs(parsed(&get, "PAGE_CACHE_TTL_SECS", 20)?),
            redis_url: get("REDIS_URL").filter(|v| !v.is_empty()),
            jwt,
        })
    }
}

fn parsed<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn flag(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(key).as_deref().map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            value: other.to_string(),
        }),
    }
}
