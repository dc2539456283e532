//! # Yatube Infrastructure
//!
//! Concrete implementations of the ports defined in `yatube-core`:
//! SeaORM repositories, caches, session/password services and media storage.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory page cache only
//! - `redis` - Redis-backed page cache

pub mod auth;
pub mod cache;
pub mod database;
pub mod media;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
pub use cache::{InMemoryCache, PageCache};
pub use database::{DatabaseConfig, DbPool, Repositories};
pub use media::{InMemoryMediaStorage, LocalMediaStorage};

#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
