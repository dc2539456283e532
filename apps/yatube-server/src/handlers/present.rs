//! Builds view documents from domain entities.

use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use yatube_core::Page;
use yatube_core::domain::{Comment, Group, Post, User};
use yatube_core::forms::FormErrors;
use yatube_shared::views::{AuthorRef, CommentView, FormView, GroupRef, GroupView, PageObj, PostCard};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

pub fn author_ref(user: &User) -> AuthorRef {
    AuthorRef {
        id: user.id,
        username: user.username.clone(),
    }
}

pub fn group_ref(group: &Group) -> GroupRef {
    GroupRef {
        id: group.id,
        title: group.title.clone(),
        slug: group.slug.clone(),
    }
}

pub fn group_view(group: &Group) -> GroupView {
    GroupView {
        id: group.id,
        title: group.title.clone(),
        slug: group.slug.clone(),
        description: group.description.clone(),
    }
}

pub fn form_view(data: BTreeMap<String, String>, errors: FormErrors) -> FormView {
    FormView {
        data,
        errors: errors.into_map(),
    }
}

fn unique(ids: impl Iterator<Item = Uuid>) -> Vec<Uuid> {
    ids.collect::<HashSet<_>>().into_iter().collect()
}

async fn authors_by_id(state: &AppState, ids: Vec<Uuid>) -> AppResult<HashMap<Uuid, User>> {
    let users = state.repos.users.find_by_ids(&ids).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

fn card(
    state: &AppState,
    post: Post,
    authors: &HashMap<Uuid, User>,
    groups: &HashMap<Uuid, Group>,
) -> AppResult<PostCard> {
    let author = authors
        .get(&post.author_id)
        .ok_or_else(|| AppError::Internal(format!("Post {} has no author", post.id)))?;

    Ok(PostCard {
        id: post.id,
        text: post.text,
        pub_date: post.pub_date,
        author: author_ref(author),
        group: post
            .group_id
            .and_then(|id| groups.get(&id))
            .map(group_ref),
        image_url: post.image.as_deref().map(|path| state.media.url(path)),
    })
}

/// Cards for a batch of posts, loading authors and groups in two queries.
pub async fn post_cards(state: &AppState, posts: Vec<Post>) -> AppResult<Vec<PostCard>> {
    let authors = authors_by_id(state, unique(posts.iter().map(|p| p.author_id))).await?;
    let group_ids = unique(posts.iter().filter_map(|p| p.group_id));
    let groups: HashMap<Uuid, Group> = state
        .repos
        .groups
        .find_by_ids(&group_ids)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();

    posts
        .into_iter()
        .map(|post| card(state, post, &authors, &groups))
        .collect()
}

pub async fn post_card(state: &AppState, post: Post) -> AppResult<PostCard> {
    let mut cards = post_cards(state, vec![post]).await?;
    cards
        .pop()
        .ok_or_else(|| AppError::Internal("Empty post card batch".to_string()))
}

pub async fn page_obj(state: &AppState, page: Page<Post>) -> AppResult<PageObj<PostCard>> {
    let number = page.number;
    let num_pages = page.num_pages();
    let count = page.total;
    let has_next = page.has_next();
    let has_previous = page.has_previous();

    Ok(PageObj {
        items: post_cards(state, page.items).await?,
        number,
        num_pages,
        count,
        has_next,
        has_previous,
    })
}

pub async fn comment_views(state: &AppState, comments: Vec<Comment>) -> AppResult<Vec<CommentView>> {
    let authors = authors_by_id(state, unique(comments.iter().map(|c| c.author_id))).await?;

    comments
        .into_iter()
        .map(|comment| {
            let author = authors.get(&comment.author_id).ok_or_else(|| {
                AppError::Internal(format!("Comment {} has no author", comment.id))
            })?;
            Ok(CommentView {
                id: comment.id,
                text: comment.text,
                author: author_ref(author),
                created: comment.created,
            })
        })
        .collect()
}
