//! Media storage backends for uploaded images.

mod local;
mod memory;

pub use local::LocalMediaStorage;
pub use memory::InMemoryMediaStorage;

use std::path::{Component, Path};

use yatube_core::ports::MediaError;

/// Reject anything that could escape the media root.
pub(crate) fn checked_relative(path: &str) -> Result<&Path, MediaError> {
    let candidate = Path::new(path);
    let is_plain = !path.is_empty()
        && candidate
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if is_plain {
        Ok(candidate)
    } else {
        Err(MediaError::InvalidPath(path.to_string()))
    }
}

/// `<base_url>/<path>` with exactly one slash in between.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}
