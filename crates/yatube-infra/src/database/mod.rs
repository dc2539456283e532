//! Database connection management and SeaORM repositories.

mod base;
mod connections;
pub mod entity;
mod repositories;

use std::sync::Arc;

use sea_orm::DbConn;
use yatube_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

pub use base::SqlRepository;
pub use connections::{DatabaseConfig, DbPool};
pub use repositories::{
    SqlCommentRepository, SqlFollowRepository, SqlGroupRepository, SqlPostRepository,
    SqlUserRepository,
};

/// Every repository the application needs, sharing one connection pool.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    pub fn new(db: &DbConn) -> Self {
        Self {
            users: Arc::new(SqlUserRepository::new(db.clone())),
            groups: Arc::new(SqlGroupRepository::new(db.clone())),
            posts: Arc::new(SqlPostRepository::new(db.clone())),
            comments: Arc::new(SqlCommentRepository::new(db.clone())),
            follows: Arc::new(SqlFollowRepository::new(db.clone())),
        }
    }
}
