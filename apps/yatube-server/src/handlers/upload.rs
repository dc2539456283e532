//! Multipart post form parsing.

use actix_multipart::{Multipart, MultipartError};
use actix_web::web;
use futures::TryStreamExt;

use yatube_core::domain::Group;
use yatube_core::forms::{CleanedPost, FormErrors, ImageUpload, PostForm};

use crate::middleware::error::AppError;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
const MAX_FIELD_BYTES: usize = 64 * 1024;

fn malformed(err: MultipartError) -> AppError {
    AppError::BadRequest(format!("Malformed multipart body: {}", err))
}

/// Read the `text`, `group` and `image` parts of a post form.
/// Unknown parts are drained and ignored.
pub async fn read_post_form(mut payload: Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let limit = if name == "image" {
            MAX_IMAGE_BYTES
        } else {
            MAX_FIELD_BYTES
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(malformed)? {
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::BadRequest(format!(
                    "Field {:?} exceeds {} bytes",
                    name, limit
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "text" => form.text = String::from_utf8_lossy(&bytes).into_owned(),
            "group" => form.group = String::from_utf8_lossy(&bytes).into_owned(),
            "image" => form.image = Some(ImageUpload { filename, bytes }),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Validate a post form on the blocking pool, since cleaning decodes the
/// uploaded image. The group choices are handed back for re-rendering.
pub async fn clean_post_form(
    form: PostForm,
    groups: Vec<Group>,
) -> Result<(Vec<Group>, Result<CleanedPost, FormErrors>), AppError> {
    web::block(move || {
        let cleaned = form.clean(&groups);
        (groups, cleaned)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Post form validation failed: {}", e)))
}
