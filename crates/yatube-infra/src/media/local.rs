//! Filesystem media storage under a configured root directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use yatube_core::ports::{MediaError, MediaStorage};

use super::{checked_relative, join_url};

pub struct LocalMediaStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), MediaError> {
        let target = self.root.join(checked_relative(path)?);

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MediaError::Io(e.to_string()))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        tracing::debug!(path = %target.display(), size = bytes.len(), "Stored media file");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), MediaError> {
        let target = self.root.join(checked_relative(path)?);

        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}
