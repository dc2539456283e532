//! In-memory media storage for tests and ephemeral deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use yatube_core::ports::{MediaError, MediaStorage};

use super::{checked_relative, join_url};

#[derive(Default)]
pub struct InMemoryMediaStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }
}

#[async_trait]
impl MediaStorage for InMemoryMediaStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), MediaError> {
        checked_relative(path)?;
        self.files
            .write()
            .await
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), MediaError> {
        self.files.write().await.remove(path);
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        join_url("/media", path)
    }
}
