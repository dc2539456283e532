//! Feeds, post pages and follow handlers.

use std::collections::BTreeMap;

use actix_multipart::Multipart;
use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use yatube_core::domain::{Comment, Follow, Group, Post, User};
use yatube_core::error::{DomainError, RepoError};
use yatube_core::forms::{CleanImage, CommentForm, FormErrors};
use yatube_core::pagination::PageRequest;
use yatube_core::ports::{BaseRepository, PostFilter, post_image_path};
use yatube_shared::views::{
    FollowContext, FormView, GroupContext, IndexContext, PostDetailContext, PostFormContext,
    ProfileContext, templates,
};
use yatube_shared::Rendered;

use super::present::{
    author_ref, comment_views, form_view, group_ref, group_view, page_obj, post_card,
};
use super::{redirect, render, upload};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::urls;

const INDEX_TITLE: &str = "Latest updates on the site";
const FOLLOW_TITLE: &str = "Posts by authors you follow";

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn request(&self, state: &AppState) -> AppResult<PageRequest> {
        Ok(PageRequest::parse(self.page.as_deref(), state.per_page)?)
    }
}

async fn find_post(state: &AppState, post_id: Uuid) -> AppResult<Post> {
    Ok(state
        .repos
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?)
}

async fn find_author(state: &AppState, username: &str) -> AppResult<User> {
    Ok(state
        .repos
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", username))?)
}

/// Drop every cached page after a write. The write already happened, so a
/// cache failure is logged rather than turned into an error response.
async fn invalidate_pages(state: &AppState) {
    if let Err(e) = state.page_cache.invalidate().await {
        tracing::error!(error = %e, "Failed to invalidate page cache");
    }
}

/// GET /
pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let key = req.uri().to_string();
    let lookup = state.page_cache.get(&key).await;
    if let Some(body) = &lookup.body {
        tracing::debug!(uri = %key, "Serving cached page");
        return Ok(HttpResponse::Ok()
            .content_type(ContentType::json())
            .insert_header(("X-Cache", "HIT"))
            .body(body.clone()));
    }

    let page = state
        .repos
        .posts
        .list(PostFilter::All, query.request(&state)?)
        .await?;
    let context = IndexContext {
        title: INDEX_TITLE.to_string(),
        page_obj: page_obj(&state, page).await?,
    };

    let body = serde_json::to_string(&Rendered::new(templates::INDEX, context))?;
    state.page_cache.put(&lookup, &key, &body).await;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .insert_header(("X-Cache", "MISS"))
        .body(body))
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let group = state
        .repos
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Group", &slug))?;

    let page = state
        .repos
        .posts
        .list(PostFilter::Group(group.id), query.request(&state)?)
        .await?;

    render(
        templates::GROUP_LIST,
        GroupContext {
            group: group_view(&group),
            page_obj: page_obj(&state, page).await?,
        },
    )
}

/// GET /profile/{username}/
pub async fn profile(
    identity: OptionalIdentity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &path).await?;

    let page = state
        .repos
        .posts
        .list(PostFilter::Author(author.id), query.request(&state)?)
        .await?;

    let following = match identity.user_id() {
        Some(viewer) => state.repos.follows.exists(viewer, author.id).await?,
        None => false,
    };

    render(
        templates::PROFILE,
        ProfileContext {
            author: author_ref(&author),
            posts_count: page.total,
            following,
            page_obj: page_obj(&state, page).await?,
        },
    )
}

async fn detail_page(
    state: &AppState,
    post: Post,
    viewer: Option<Uuid>,
    comment_form: FormView,
) -> AppResult<HttpResponse> {
    let comments = state.repos.comments.list_for_post(post.id).await?;
    let author_posts_count = state.repos.posts.count_by_author(post.author_id).await?;
    let is_author = viewer.is_some_and(|id| post.is_authored_by(id));

    render(
        templates::POST_DETAIL,
        PostDetailContext {
            post: post_card(state, post).await?,
            author_posts_count,
            comments: comment_views(state, comments).await?,
            comment_form,
            is_author,
        },
    )
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    identity: OptionalIdentity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    detail_page(&state, post, identity.user_id(), FormView::default()).await
}

fn post_form_page(
    state: &AppState,
    groups: &[Group],
    form: FormView,
    post: Option<&Post>,
) -> AppResult<HttpResponse> {
    render(
        templates::CREATE_POST,
        PostFormContext {
            form,
            groups: groups.iter().map(group_ref).collect(),
            is_edit: post.is_some(),
            post_id: post.map(|p| p.id),
            image_url: post
                .and_then(|p| p.image.as_deref())
                .map(|path| state.media.url(path)),
        },
    )
}

async fn store_image(state: &AppState, image: Option<CleanImage>) -> AppResult<Option<String>> {
    let Some(image) = image else {
        return Ok(None);
    };
    let path = post_image_path(image.extension);
    state.media.save(&path, &image.bytes).await?;
    Ok(Some(path))
}

async fn discard_image(state: &AppState, path: Option<&str>) {
    if let Some(path) = path {
        if let Err(e) = state.media.delete(path).await {
            tracing::warn!(%path, error = %e, "Failed to delete post image");
        }
    }
}

/// GET /create/
pub async fn post_create_form(
    _identity: Identity,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    let groups = state.repos.groups.list_all().await?;
    post_form_page(&state, &groups, FormView::default(), None)
}

/// POST /create/
pub async fn post_create(
    identity: Identity,
    state: web::Data<AppState>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = upload::read_post_form(payload).await?;
    let groups = state.repos.groups.list_all().await?;
    let values = form.values();

    let cleaned = match upload::clean_post_form(form, groups).await? {
        (_, Ok(cleaned)) => cleaned,
        (groups, Err(errors)) => {
            return post_form_page(&state, &groups, form_view(values, errors), None);
        }
    };

    let image = store_image(&state, cleaned.image).await?;
    let post = Post::new(identity.user_id, cleaned.text)
        .with_group(cleaned.group_id)
        .with_image(image.clone());
    let post_id = post.id;

    if let Err(e) = state.repos.posts.create(post).await {
        discard_image(&state, image.as_deref()).await;
        return Err(e.into());
    }
    invalidate_pages(&state).await;

    tracing::info!(%post_id, author = %identity.username, "Post created");
    Ok(redirect(urls::profile(&identity.username)))
}

/// GET /posts/{post_id}/edit/
pub async fn post_edit_form(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if !post.is_authored_by(identity.user_id) {
        return Ok(redirect(urls::post_detail(post.id)));
    }

    let groups = state.repos.groups.list_all().await?;
    let data = BTreeMap::from([
        ("text".to_string(), post.text.clone()),
        (
            "group".to_string(),
            post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        ),
    ]);
    post_form_page(&state, &groups, form_view(data, FormErrors::new()), Some(&post))
}

/// POST /posts/{post_id}/edit/
pub async fn post_edit(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut post = find_post(&state, path.into_inner()).await?;
    let post_id = post.id;
    if !post.is_authored_by(identity.user_id) {
        tracing::debug!(%post_id, user = %identity.username, "Edit refused for non-author");
        return Ok(redirect(urls::post_detail(post_id)));
    }

    let form = upload::read_post_form(payload).await?;
    let groups = state.repos.groups.list_all().await?;
    let values = form.values();

    let cleaned = match upload::clean_post_form(form, groups).await? {
        (_, Ok(cleaned)) => cleaned,
        (groups, Err(errors)) => {
            return post_form_page(&state, &groups, form_view(values, errors), Some(&post));
        }
    };

    let new_image = store_image(&state, cleaned.image).await?;
    let replaced = new_image.as_ref().and(post.image.clone());
    post.apply_edit(cleaned.text, cleaned.group_id, new_image.clone());

    if let Err(e) = state.repos.posts.update(post).await {
        discard_image(&state, new_image.as_deref()).await;
        return Err(e.into());
    }
    discard_image(&state, replaced.as_deref()).await;
    invalidate_pages(&state).await;

    tracing::info!(%post_id, "Post edited");
    Ok(redirect(urls::post_detail(post_id)))
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;

    match form.clean() {
        Ok(text) => {
            let comment = Comment::new(post.id, identity.user_id, text);
            state.repos.comments.create(comment).await?;
            invalidate_pages(&state).await;
            Ok(redirect(urls::post_detail(post.id)))
        }
        Err(errors) => {
            let comment_form = form_view(form.values(), errors);
            detail_page(&state, post, Some(identity.user_id), comment_form).await
        }
    }
}

/// GET /posts/{post_id}/comment/
pub async fn comment_redirect(
    _identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    Ok(redirect(urls::post_detail(post.id)))
}

/// GET /follow/
pub async fn follow_index(
    identity: Identity,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state
        .repos
        .posts
        .list(PostFilter::FollowedBy(identity.user_id), query.request(&state)?)
        .await?;

    render(
        templates::FOLLOW,
        FollowContext {
            title: FOLLOW_TITLE.to_string(),
            page_obj: page_obj(&state, page).await?,
        },
    )
}

/// GET /profile/{username}/follow/
pub async fn profile_follow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &path).await?;

    let Some(edge) = Follow::between(identity.user_id, author.id) else {
        tracing::debug!(user = %identity.username, "Ignoring self-follow");
        return Ok(redirect(urls::profile(&author.username)));
    };

    if !state.repos.follows.exists(edge.user_id, edge.author_id).await? {
        match state.repos.follows.create(edge).await {
            Ok(_) => {
                tracing::info!(user = %identity.username, author = %author.username, "Followed");
            }
            // Lost a race with a concurrent follow of the same author.
            Err(RepoError::Constraint(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(redirect(urls::profile(&author.username)))
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    identity: Identity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &path).await?;

    if state.repos.follows.remove(identity.user_id, author.id).await? {
        tracing::info!(user = %identity.username, author = %author.username, "Unfollowed");
    }

    Ok(redirect(urls::profile(&author.username)))
}
