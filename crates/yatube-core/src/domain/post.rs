use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of characters a post shows when displayed as a label.
const LABEL_LEN: usize = 15;

/// Post entity - a blog entry written by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<Uuid>,
    /// Media path relative to the media root, e.g. `posts/<uuid>.gif`.
    pub image: Option<String>,
}

impl Post {
    /// Create a new post published now.
    pub fn new(author_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            pub_date: Utc::now(),
            author_id,
            group_id: None,
            image: None,
        }
    }

    pub fn with_group(mut self, group_id: Option<Uuid>) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Apply an edit from the author. `pub_date` and `author_id` never change;
    /// the image is only replaced when a new one was uploaded.
    pub fn apply_edit(&mut self, text: String, group_id: Option<Uuid>, image: Option<String>) {
        self.text = text;
        self.group_id = group_id;
        if image.is_some() {
            self.image = image;
        }
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label: String = self.text.chars().take(LABEL_LEN).collect();
        f.write_str(&label)
    }
}
