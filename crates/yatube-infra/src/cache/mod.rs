//! Cache backends and the page cache built on top of them.

mod memory;
mod page;
#[cfg(feature = "redis")]
mod redis;

pub use memory::InMemoryCache;
pub use page::{PageCache, PageLookup};

#[cfg(feature = "redis")]
pub use self::redis::{RedisCache, RedisConfig};
