//! Key/value cache port used for rendered pages.

use async_trait::async_trait;
use std::time::Duration;

/// Cache backend (Redis or in-memory). Values are opaque strings.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Get a live (non-expired) value. Backend failures read as a miss.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store a value, expiring after `ttl` when given.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Delete a key; deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}
