//! Paths of the pages handlers redirect to.

use uuid::Uuid;

pub fn index() -> String {
    "/".to_string()
}

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", username)
}

pub fn post_detail(post_id: Uuid) -> String {
    format!("/posts/{}/", post_id)
}

/// Login page that sends the user back to `next` afterwards.
pub fn login(next: &str) -> String {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => format!("/auth/login/?{}", query),
        Err(_) => "/auth/login/".to_string(),
    }
}

/// `next` if it is a local path, otherwise the index.
pub fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => index(),
    }
}
