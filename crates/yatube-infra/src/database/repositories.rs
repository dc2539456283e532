//! SeaORM repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::Query;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use yatube_core::domain::{Comment, Group, Post, User};
use yatube_core::error::RepoError;
use yatube_core::pagination::{Page, PageRequest};
use yatube_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostFilter, PostRepository,
    UserRepository,
};

use super::base::{SqlRepository, repo_err};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};

pub type SqlUserRepository = SqlRepository<UserEntity>;
pub type SqlGroupRepository = SqlRepository<GroupEntity>;
pub type SqlPostRepository = SqlRepository<PostEntity>;
pub type SqlCommentRepository = SqlRepository<CommentEntity>;
pub type SqlFollowRepository = SqlRepository<FollowEntity>;

#[async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl GroupRepository for SqlGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Group>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = GroupEntity::find()
            .filter(group::Column::Id.is_in(ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// Base query for a listing, newest first. The id tie-break keeps page
/// boundaries stable when several posts share a timestamp.
fn post_listing(filter: PostFilter) -> Select<PostEntity> {
    let select = PostEntity::find()
        .order_by_desc(post::Column::PubDate)
        .order_by_desc(post::Column::Id);

    match filter {
        PostFilter::All => select,
        PostFilter::Group(group_id) => select.filter(post::Column::GroupId.eq(group_id)),
        PostFilter::Author(author_id) => select.filter(post::Column::AuthorId.eq(author_id)),
        PostFilter::FollowedBy(user_id) => select.filter(
            post::Column::AuthorId.in_subquery(
                Query::select()
                    .column(follow::Column::AuthorId)
                    .from(FollowEntity)
                    .and_where(follow::Column::UserId.eq(user_id))
                    .to_owned(),
            ),
        ),
    }
}

#[async_trait]
impl PostRepository for SqlPostRepository {
    async fn list(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let paginator = post_listing(filter).paginate(&self.db, page.per_page);
        let total = paginator.num_items().await.map_err(repo_err)?;

        if !page.is_within(total) {
            tracing::debug!(?filter, page = page.number, total, "Page out of range");
            return Err(RepoError::InvalidPage(page.number));
        }

        let models = paginator.fetch_page(page.index()).await.map_err(repo_err)?;
        let items = models.into_iter().map(Into::into).collect();

        Ok(Page::new(items, page, total))
    }

    async fn count_by_author(&self, author_id: Uuid) -> Result<u64, RepoError> {
        PostEntity::find()
            .filter(post::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(repo_err)
    }
}

#[async_trait]
impl CommentRepository for SqlCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::Created)
            .all(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl FollowRepository for SqlFollowRepository {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let found = FollowEntity::find()
            .select_only()
            .column(follow::Column::Id)
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .into_tuple::<Uuid>()
            .one(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(found.is_some())
    }

    async fn remove(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let result = FollowEntity::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(repo_err)?;

        Ok(result.rows_affected > 0)
    }
}
