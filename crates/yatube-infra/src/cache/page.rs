//! Rendered-page cache with explicit TTL and write-driven invalidation.
//!
//! Entries are keyed by request URI under a generation number that lives in
//! the cache itself. Invalidating bumps the generation, so every page cached
//! before the write becomes unreachable at once and ages out through its TTL.
//! This works the same on the in-memory and Redis backends, with no key scans.

use std::sync::Arc;
use std::time::Duration;

use yatube_core::ports::{Cache, CacheError};

const GENERATION_KEY: &str = "page:generation";

/// Outcome of [`PageCache::get`]: the cached body, if any, and the
/// generation it was looked up in.
#[derive(Debug, Default)]
pub struct PageLookup {
    generation: u64,
    pub body: Option<String>,
}

/// Response cache for public pages.
#[derive(Clone)]
pub struct PageCache {
    backend: Arc<dyn Cache>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(backend: Arc<dyn Cache>, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn generation(&self) -> u64 {
        self.backend
            .get(GENERATION_KEY)
            .await
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    fn entry_key(generation: u64, uri: &str) -> String {
        format!("page:{generation}:{uri}")
    }

    /// Look up `uri` in the current generation.
    pub async fn get(&self, uri: &str) -> PageLookup {
        if self.ttl.is_zero() {
            return PageLookup::default();
        }
        let generation = self.generation().await;
        let body = self.backend.get(&Self::entry_key(generation, uri)).await;
        PageLookup { generation, body }
    }

    /// Cache a body rendered after `lookup` missed. It is stored under the
    /// generation the lookup saw, so a page rendered from data that a write
    /// has since replaced is never reachable. Failures are logged, never
    /// surfaced: a page that could not be cached is still a valid response.
    pub async fn put(&self, lookup: &PageLookup, uri: &str, body: &str) {
        if self.ttl.is_zero() {
            return;
        }
        let key = Self::entry_key(lookup.generation, uri);
        if let Err(e) = self.backend.set(&key, body, Some(self.ttl)).await {
            tracing::warn!(%uri, error = %e, "Failed to cache page");
        }
    }

    /// Make every page cached so far unreachable. Called after each write
    /// that can change a cached page.
    pub async fn invalidate(&self) -> Result<(), CacheError> {
        let next = self.generation().await.wrapping_add(1);
        self.backend
            .set(GENERATION_KEY, &next.to_string(), None)
            .await?;
        tracing::debug!(generation = next, "Page cache invalidated");
        Ok(())
    }

    /// Explicit clear hook (same mechanism as [`PageCache::invalidate`]).
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.invalidate().await
    }
}
