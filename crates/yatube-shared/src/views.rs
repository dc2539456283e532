//! Page view documents.
//!
//! Every page is a [`Rendered`] document: the template that presents it plus
//! the context it is rendered with.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod templates {
    pub const INDEX: &str = "posts/index.html";
    pub const GROUP_LIST: &str = "posts/group_list.html";
    pub const PROFILE: &str = "posts/profile.html";
    pub const POST_DETAIL: &str = "posts/post_detail.html";
    pub const CREATE_POST: &str = "posts/create_post.html";
    pub const FOLLOW: &str = "posts/follow.html";
    pub const SIGNUP: &str = "users/signup.html";
    pub const LOGIN: &str = "users/login.html";
    pub const LOGGED_OUT: &str = "users/logged_out.html";
}

/// A template name with its context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rendered<C> {
    pub template: String,
    pub context: C,
}

impl<C> Rendered<C> {
    pub fn new(template: &str, context: C) -> Self {
        Self {
            template: template.to_string(),
            context,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post as shown in listings and on its detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCard {
    pub id: Uuid,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: AuthorRef,
    pub group: Option<GroupRef>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub author: AuthorRef,
    pub created: DateTime<Utc>,
}

/// One page of a listing plus its navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageObj<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Submitted values and per-field errors of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormView {
    pub data: BTreeMap<String, String>,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FormView {
    pub fn is_bound(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexContext {
    pub title: String,
    pub page_obj: PageObj<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupContext {
    pub group: GroupView,
    pub page_obj: PageObj<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileContext {
    pub author: AuthorRef,
    pub posts_count: u64,
    /// Whether the viewer follows this author (false for anonymous viewers).
    pub following: bool,
    pub page_obj: PageObj<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailContext {
    pub post: PostCard,
    pub author_posts_count: u64,
    pub comments: Vec<CommentView>,
    pub comment_form: FormView,
    pub is_author: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormContext {
    pub form: FormView,
    /// Choices for the group field.
    pub groups: Vec<GroupRef>,
    pub is_edit: bool,
    pub post_id: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowContext {
    pub title: String,
    pub page_obj: PageObj<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFormContext {
    pub form: FormView,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggedOutContext {
    pub title: String,
}
