//! Submission forms and their validation rules.
//!
//! Forms are plain data filled from a request. `clean` either returns the
//! validated values or a [`FormErrors`] map keyed by field name, ready to be
//! rendered next to the submitted values.

use std::collections::BTreeMap;

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Group;
use crate::domain::User;

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only \
     letters, numbers, and @/./+/-/_ characters.";
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const PASSWORD_TOO_SHORT: &str =
    "This password is too short. It must contain at least 8 characters.";
pub const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";
pub const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Key used for errors that belong to the whole form.
pub const NON_FIELD_ERRORS: &str = "__all__";

const PASSWORD_MIN_LEN: usize = 8;

const ACCEPTED_IMAGE_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Gif,
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::WebP,
    ImageFormat::Bmp,
];

/// Field-level validation errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn with(mut self, field: &str, message: &str) -> Self {
        self.add(field, message);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

/// Trimmed, non-blank text or a "required" error.
fn required_text(errors: &mut FormErrors, field: &str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value.to_string()
}

/// An uploaded file as received from a multipart body.
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// An upload that decoded successfully as one of the accepted formats.
#[derive(Debug, Clone)]
pub struct CleanImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl CleanImage {
    /// Sniff and fully decode the upload; the extension follows the content,
    /// not the client-supplied filename.
    pub fn from_upload(upload: ImageUpload) -> Option<Self> {
        let format = image::guess_format(&upload.bytes).ok()?;
        if !ACCEPTED_IMAGE_FORMATS.contains(&format) {
            return None;
        }
        image::load_from_memory_with_format(&upload.bytes, format).ok()?;

        let extension = format.extensions_str().first().copied()?;
        Some(Self {
            extension,
            bytes: upload.bytes,
        })
    }
}

/// Post create/edit form.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    /// Group id as submitted; empty means "no group".
    pub group: String,
    pub image: Option<ImageUpload>,
}

/// Validated post form.
#[derive(Debug, Clone)]
pub struct CleanedPost {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<CleanImage>,
}

impl PostForm {
    /// Validate against the groups that currently exist.
    pub fn clean(self, groups: &[Group]) -> Result<CleanedPost, FormErrors> {
        let mut errors = FormErrors::new();

        let text = required_text(&mut errors, "text", &self.text);

        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            let known = Uuid::parse_str(group)
                .ok()
                .filter(|id| groups.iter().any(|g| g.id == *id));
            if known.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
            known
        };

        let image = match self.image.filter(|upload| !upload.bytes.is_empty()) {
            None => None,
            Some(upload) => {
                let clean = CleanImage::from_upload(upload);
                if clean.is_none() {
                    errors.add("image", INVALID_IMAGE);
                }
                clean
            }
        };

        if errors.is_empty() {
            Ok(CleanedPost {
                text,
                group_id,
                image,
            })
        } else {
            Err(errors)
        }
    }

    /// Submitted values for re-rendering (the image is never echoed back).
    pub fn values(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("text".to_string(), self.text.clone()),
            ("group".to_string(), self.group.clone()),
        ])
    }
}

/// Comment form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn clean(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = required_text(&mut errors, "text", &self.text);
        if errors.is_empty() { Ok(text) } else { Err(errors) }
    }

    pub fn values(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("text".to_string(), self.text.clone())])
    }
}

/// Account signup form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Validated signup data; the password is still plain text.
#[derive(Debug, Clone)]
pub struct CleanedSignup {
    pub username: String,
    pub password: String,
}

impl SignupForm {
    /// Syntactic checks only; username uniqueness needs the user store.
    pub fn clean(&self) -> Result<CleanedSignup, FormErrors> {
        let mut errors = FormErrors::new();

        let username = required_text(&mut errors, "username", &self.username);
        if !username.is_empty() && !User::is_valid_username(&username) {
            errors.add("username", INVALID_USERNAME);
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add("password1", PASSWORD_TOO_SHORT);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", PASSWORD_MISMATCH);
        }

        if errors.is_empty() {
            Ok(CleanedSignup {
                username,
                password: self.password1.clone(),
            })
        } else {
            Err(errors)
        }
    }

    pub fn values(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("username".to_string(), self.username.clone())])
    }
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn clean(&self) -> Result<(String, String), FormErrors> {
        let mut errors = FormErrors::new();
        let username = required_text(&mut errors, "username", &self.username);
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        if errors.is_empty() {
            Ok((username, self.password.clone()))
        } else {
            Err(errors)
        }
    }

    pub fn values(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("username".to_string(), self.username.clone())])
    }
}
