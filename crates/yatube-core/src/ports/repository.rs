use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Comment, Follow, Group, Post, User};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite every column of an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Dependent rows follow the schema's
    /// referential rules.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError>;
}

#[async_trait]
pub trait GroupRepository: BaseRepository<Group, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups ordered by title, used as form choices.
    async fn list_all(&self) -> Result<Vec<Group>, RepoError>;

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError>;
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(Uuid),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}

#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of posts, newest first. Fails with [`RepoError::InvalidPage`]
    /// when the page lies past the end of the listing.
    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError>;

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments under a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
}

#[async_trait]
pub trait FollowRepository: BaseRepository<Follow, Uuid> {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Remove the edge if present; returns whether anything was deleted.
    async fn remove(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;
}
