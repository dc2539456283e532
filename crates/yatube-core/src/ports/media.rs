//! Media storage port - where uploaded post images live.

use async_trait::async_trait;

/// Directory (relative to the media root) that post images are stored under.
pub const POST_IMAGE_DIR: &str = "posts";

/// Storage for uploaded files, addressed by a relative path such as
/// `posts/<uuid>.gif`.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Persist `bytes` at `path`, replacing any existing file.
    async fn save(&self, path: &str, bytes: &[u8]) -> Result<(), MediaError>;

    /// Remove a stored file. Missing files are not an error.
    async fn delete(&self, path: &str) -> Result<(), MediaError>;

    /// Public URL a stored file is served from.
    fn url(&self, path: &str) -> String;
}

/// Build the storage path for a new post image.
pub fn post_image_path(extension: &str) -> String {
    format!("{}/{}.{}", POST_IMAGE_DIR, uuid::Uuid::new_v4(), extension)
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),
}
