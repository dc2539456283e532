use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use uuid::Uuid;

use yatube_core::domain::{Comment, Group, Post, User};
use yatube_core::forms::{BAD_CREDENTIALS, NON_FIELD_ERRORS, REQUIRED};
use yatube_core::pagination::PageRequest;
use yatube_core::ports::{BaseRepository, MediaStorage, PostFilter};
use yatube_infra::{
    Argon2PasswordService, DbPool, InMemoryCache, InMemoryMediaStorage, JwtConfig,
    JwtTokenService, PageCache, Repositories,
};
use yatube_shared::Rendered;
use yatube_shared::views::{
    AuthFormContext, FollowContext, GroupContext, IndexContext, PostDetailContext,
    PostFormContext, ProfileContext,
};

use super::configure_routes;
use crate::middleware::auth::SESSION_COOKIE;
use crate::state::AppState;

const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

const BOUNDARY: &str = "yatube-test-boundary";

struct Fixture {
    state: AppState,
    media: Arc<InMemoryMediaStorage>,
    author: User,
    reader: User,
    group: Group,
    post: Post,
}

async fn fixture() -> Fixture {
    let opts = ConnectOptions::new("sqlite::memory:")
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false)
        .to_owned();
    let conn = Database::connect(opts).await.unwrap();
    Migrator::up(&conn, None).await.unwrap();

    let media = Arc::new(InMemoryMediaStorage::new());
    let state = AppState {
        repos: Repositories::new(&conn),
        db: DbPool::from_conn(conn),
        page_cache: PageCache::new(Arc::new(InMemoryCache::new()), Duration::from_secs(20)),
        media: media.clone(),
        tokens: Arc::new(JwtTokenService::new(JwtConfig::default())),
        passwords: Arc::new(Argon2PasswordService::new()),
        per_page: 10,
    };

    let author = state
        .repos
        .users
        .create(User::new("auth", "not-a-real-hash"))
        .await
        .unwrap();
    let reader = state
        .repos
        .users
        .create(User::new("reader", "not-a-real-hash"))
        .await
        .unwrap();
    let group = state
        .repos
        .groups
        .create(Group::new("Test title", "test_slug", "Test description"))
        .await
        .unwrap();
    let post = state
        .repos
        .posts
        .create(Post::new(author.id, "Test text").with_group(Some(group.id)))
        .await
        .unwrap();

    Fixture {
        state,
        media,
        author,
        reader,
        group,
        post,
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn session(state: &AppState, user: &User) -> Cookie<'static> {
    let token = state.tokens.generate_token(user.id, &user.username).unwrap();
    Cookie::new(SESSION_COOKIE, token)
}

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn multipart(fields: &[(&str, &str)], image: Option<&[u8]>) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                 filename=\"small.gif\"\r\nContent-Type: image/gif\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

fn multipart_post(uri: &str, fields: &[(&str, &str)], image: Option<&[u8]>) -> test::TestRequest {
    let (content_type, body) = multipart(fields, image);
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(body)
}

async fn post_count(state: &AppState) -> u64 {
    state
        .repos
        .posts
        .list(PostFilter::All, PageRequest::first(1000))
        .await
        .unwrap()
        .total
}

async fn seed_posts(state: &AppState, author: &User, group: Option<&Group>, count: usize) {
    for i in 0..count {
        let post = Post::new(author.id, format!("Post number {i}")).with_group(group.map(|g| g.id));
        state.repos.posts.create(post).await.unwrap();
    }
}

async fn template_of(resp: actix_web::dev::ServiceResponse) -> String {
    let doc: Rendered<serde_json::Value> = test::read_body_json(resp).await;
    doc.template
}

#[actix_web::test]
async fn test_public_pages_render_for_guests() {
    let f = fixture().await;
    let app = app!(f.state);

    let pages = [
        ("/".to_string(), "posts/index.html"),
        ("/group/test_slug/".to_string(), "posts/group_list.html"),
        ("/profile/auth/".to_string(), "posts/profile.html"),
        (format!("/posts/{}/", f.post.id), "posts/post_detail.html"),
        ("/auth/signup/".to_string(), "users/signup.html"),
        ("/auth/login/".to_string(), "users/login.html"),
    ];

    for (uri, template) in pages {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert_eq!(template_of(resp).await, template, "{uri}");
    }
}

#[actix_web::test]
async fn test_private_pages_render_for_author() {
    let f = fixture().await;
    let app = app!(f.state);
    let cookie = session(&f.state, &f.author);

    let pages = [
        ("/create/".to_string(), "posts/create_post.html"),
        (format!("/posts/{}/edit/", f.post.id), "posts/create_post.html"),
        ("/follow/".to_string(), "posts/follow.html"),
    ];

    for (uri, template) in pages {
        let req = test::TestRequest::get()
            .uri(&uri)
            .cookie(cookie.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        assert_eq!(template_of(resp).await, template, "{uri}");
    }
}

#[actix_web::test]
async fn test_bearer_header_is_accepted() {
    let f = fixture().await;
    let app = app!(f.state);
    let token = f
        .state
        .tokens
        .generate_token(f.author.id, &f.author.username)
        .unwrap();

    let req = test::TestRequest::get()
        .uri("/follow/")
        .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_private_pages_redirect_guests_to_login() {
    let f = fixture().await;
    let app = app!(f.state);

    let cases = [
        ("/create/".to_string(), "/auth/login/?next=%2Fcreate%2F".to_string()),
        ("/follow/".to_string(), "/auth/login/?next=%2Ffollow%2F".to_string()),
        (
            format!("/posts/{}/edit/", f.post.id),
            format!("/auth/login/?next=%2Fposts%2F{}%2Fedit%2F", f.post.id),
        ),
        (
            "/profile/auth/follow/".to_string(),
            "/auth/login/?next=%2Fprofile%2Fauth%2Ffollow%2F".to_string(),
        ),
    ];

    for (uri, expected) in cases {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{uri}");
        assert_eq!(location(&resp), expected);
    }

    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(Cookie::new(SESSION_COOKIE, "garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
}

#[actix_web::test]
async fn test_missing_objects_and_unknown_paths_are_not_found() {
    let f = fixture().await;
    let app = app!(f.state);

    let uris = [
        "/unexisting_page/".to_string(),
        "/group/no_such_group/".to_string(),
        "/profile/nobody/".to_string(),
        format!("/posts/{}/", Uuid::new_v4()),
        "/posts/not-a-uuid/".to_string(),
    ];

    for uri in uris {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let req = test::TestRequest::get().uri("/unexisting_page/").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["instance"], "/unexisting_page/");
}

#[actix_web::test]
async fn test_listing_contexts() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::get().uri("/").to_request();
    let doc: Rendered<IndexContext> = test::call_and_read_body_json(&app, req).await;
    let card = &doc.context.page_obj.items[0];
    assert_eq!(card.id, f.post.id);
    assert_eq!(card.text, "Test text");
    assert_eq!(card.author.username, "auth");
    assert_eq!(card.group.as_ref().unwrap().slug, "test_slug");

    let req = test::TestRequest::get().uri("/group/test_slug/").to_request();
    let doc: Rendered<GroupContext> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(doc.context.group.title, "Test title");
    assert_eq!(doc.context.group.description, "Test description");
    assert_eq!(doc.context.page_obj.items[0].id, f.post.id);

    let req = test::TestRequest::get().uri("/profile/auth/").to_request();
    let doc: Rendered<ProfileContext> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(doc.context.author.id, f.author.id);
    assert_eq!(doc.context.posts_count, 1);
    assert!(!doc.context.following);
}

#[actix_web::test]
async fn test_post_detail_context() {
    let f = fixture().await;
    f.state
        .repos
        .comments
        .create(Comment::new(f.post.id, f.reader.id, "Nice post"))
        .await
        .unwrap();
    let app = app!(f.state);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/", f.post.id))
        .cookie(session(&f.state, &f.author))
        .to_request();
    let doc: Rendered<PostDetailContext> = test::call_and_read_body_json(&app, req).await;

    assert_eq!(doc.context.post.id, f.post.id);
    assert_eq!(doc.context.author_posts_count, 1);
    assert_eq!(doc.context.comments.len(), 1);
    assert_eq!(doc.context.comments[0].author.username, "reader");
    assert!(!doc.context.comment_form.is_bound());
    assert!(doc.context.is_author);
}

#[actix_web::test]
async fn test_feeds_paginate_by_ten() {
    let f = fixture().await;
    // Ten more by the same author in the same group: eleven in every feed.
    seed_posts(&f.state, &f.author, Some(&f.group), 10).await;
    let app = app!(f.state);

    for base in ["/", "/group/test_slug/", "/profile/auth/"] {
        let req = test::TestRequest::get().uri(base).to_request();
        let page: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let page_obj = &page["context"]["page_obj"];
        assert_eq!(page_obj["items"].as_array().unwrap().len(), 10, "{base}");
        assert_eq!(page_obj["num_pages"], 2);
        assert_eq!(page_obj["has_next"], true);

        let req = test::TestRequest::get()
            .uri(&format!("{base}?page=2"))
            .to_request();
        let page: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            page["context"]["page_obj"]["items"].as_array().unwrap().len(),
            1,
            "{base}"
        );

        for bad in ["3", "0", "abc"] {
            let req = test::TestRequest::get()
                .uri(&format!("{base}?page={bad}"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{base}?page={bad}");
        }
    }
}

#[actix_web::test]
async fn test_create_post_with_image() {
    let f = fixture().await;
    let app = app!(f.state);
    let before = post_count(&f.state).await;
    let group_id = f.group.id.to_string();

    let req = multipart_post(
        "/create/",
        &[("text", "Text with picture"), ("group", &group_id)],
        Some(SMALL_GIF),
    )
    .cookie(session(&f.state, &f.author))
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");
    assert_eq!(post_count(&f.state).await, before + 1);

    let page = f
        .state
        .repos
        .posts
        .list(PostFilter::All, PageRequest::first(10))
        .await
        .unwrap();
    let created = &page.items[0];
    assert_eq!(created.text, "Text with picture");
    assert_eq!(created.author_id, f.author.id);
    assert_eq!(created.group_id, Some(f.group.id));

    let image = created.image.as_deref().unwrap();
    assert!(image.starts_with("posts/") && image.ends_with(".gif"), "{image}");
    assert_eq!(f.media.get(image).await.as_deref(), Some(SMALL_GIF));
}

#[actix_web::test]
async fn test_invalid_post_form_is_rendered_again() {
    let f = fixture().await;
    let app = app!(f.state);
    let before = post_count(&f.state).await;

    let req = multipart_post("/create/", &[("text", "   "), ("group", "")], None)
        .cookie(session(&f.state, &f.author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let doc: Rendered<PostFormContext> = test::read_body_json(resp).await;
    assert_eq!(doc.template, "posts/create_post.html");
    assert_eq!(doc.context.form.errors["text"], [REQUIRED.to_string()]);
    assert!(!doc.context.is_edit);
    assert_eq!(post_count(&f.state).await, before);
    assert_eq!(f.media.len().await, 0);
}

#[actix_web::test]
async fn test_author_edits_post_in_place() {
    let f = fixture().await;
    let app = app!(f.state);
    let before = post_count(&f.state).await;

    let req = multipart_post(
        &format!("/posts/{}/edit/", f.post.id),
        &[("text", "Edited text"), ("group", "")],
        Some(SMALL_GIF),
    )
    .cookie(session(&f.state, &f.author))
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", f.post.id));
    assert_eq!(post_count(&f.state).await, before);

    let edited = f
        .state
        .repos
        .posts
        .find_by_id(f.post.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.text, "Edited text");
    assert_eq!(edited.group_id, None);
    assert_eq!(edited.author_id, f.author.id);
    assert!(edited.image.is_some());

    // A second edit without an upload keeps the stored image.
    let req = multipart_post(
        &format!("/posts/{}/edit/", f.post.id),
        &[("text", "Edited again"), ("group", "")],
        None,
    )
    .cookie(session(&f.state, &f.author))
    .to_request();
    test::call_service(&app, req).await;

    let again = f
        .state
        .repos
        .posts
        .find_by_id(f.post.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(again.text, "Edited again");
    assert_eq!(again.image, edited.image);
}

#[actix_web::test]
async fn test_edit_replaces_stored_image() {
    let f = fixture().await;
    let app = app!(f.state);

    f.media.save("posts/old.gif", SMALL_GIF).await.unwrap();
    let post = f
        .state
        .repos
        .posts
        .create(Post::new(f.author.id, "With old picture").with_image(Some("posts/old.gif".into())))
        .await
        .unwrap();

    let req = multipart_post(
        &format!("/posts/{}/edit/", post.id),
        &[("text", "With new picture"), ("group", "")],
        Some(SMALL_GIF),
    )
    .cookie(session(&f.state, &f.author))
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let edited = f
        .state
        .repos
        .posts
        .find_by_id(post.id)
        .await
        .unwrap()
        .unwrap();
    let image = edited.image.as_deref().unwrap();
    assert_ne!(image, "posts/old.gif");
    assert_eq!(f.media.get(image).await.as_deref(), Some(SMALL_GIF));
    assert_eq!(f.media.get("posts/old.gif").await, None);
    assert_eq!(f.media.len().await, 1);
}

#[actix_web::test]
async fn test_failed_create_discards_uploaded_image() {
    let f = fixture().await;
    let app = app!(f.state);
    let before = post_count(&f.state).await;

    // A valid session for an account that was never stored.
    let ghost = User::new("ghost", "not-a-real-hash");
    let req = multipart_post("/create/", &[("text", "Orphan"), ("group", "")], Some(SMALL_GIF))
        .cookie(session(&f.state, &ghost))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(post_count(&f.state).await, before);
    assert_eq!(f.media.len().await, 0);
}

#[actix_web::test]
async fn test_non_author_cannot_edit() {
    let f = fixture().await;
    let app = app!(f.state);
    let detail = format!("/posts/{}/", f.post.id);
    let edit = format!("/posts/{}/edit/", f.post.id);

    let req = test::TestRequest::get()
        .uri(&edit)
        .cookie(session(&f.state, &f.reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let req = multipart_post(&edit, &[("text", "Hijacked"), ("group", "")], None)
        .cookie(session(&f.state, &f.reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), detail);

    let unchanged = f
        .state
        .repos
        .posts
        .find_by_id(f.post.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.text, "Test text");
}

#[actix_web::test]
async fn test_add_comment() {
    let f = fixture().await;
    let app = app!(f.state);
    let uri = format!("/posts/{}/comment/", f.post.id);

    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(session(&f.state, &f.reader))
        .set_form([("text", "Test comment")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", f.post.id));

    let comments = f.state.repos.comments.list_for_post(f.post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Test comment");
    assert_eq!(comments[0].author_id, f.reader.id);
    assert_eq!(comments[0].post_id, f.post.id);
}

#[actix_web::test]
async fn test_comment_edge_cases() {
    let f = fixture().await;
    let app = app!(f.state);
    let uri = format!("/posts/{}/comment/", f.post.id);

    // Guests are sent to login and nothing is stored.
    let req = test::TestRequest::post()
        .uri(&uri)
        .set_form([("text", "Anonymous")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login/?next="));

    // GET only redirects to the post.
    let req = test::TestRequest::get()
        .uri(&uri)
        .cookie(session(&f.state, &f.reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}/", f.post.id));

    // Blank text re-renders the detail page with the error.
    let req = test::TestRequest::post()
        .uri(&uri)
        .cookie(session(&f.state, &f.reader))
        .set_form([("text", " ")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Rendered<PostDetailContext> = test::read_body_json(resp).await;
    assert_eq!(doc.template, "posts/post_detail.html");
    assert_eq!(doc.context.comment_form.errors["text"], [REQUIRED.to_string()]);

    assert!(f.state.repos.comments.list_for_post(f.post.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_follow_and_unfollow() {
    let f = fixture().await;
    let app = app!(f.state);
    let cookie = session(&f.state, &f.reader);

    let feed = |cookie: Cookie<'static>| {
        test::TestRequest::get()
            .uri("/follow/")
            .cookie(cookie)
            .to_request()
    };

    let doc: Rendered<FollowContext> = test::call_and_read_body_json(&app, feed(cookie.clone())).await;
    assert!(doc.context.page_obj.items.is_empty());

    let req = test::TestRequest::get()
        .uri("/profile/auth/follow/")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");

    let doc: Rendered<FollowContext> = test::call_and_read_body_json(&app, feed(cookie.clone())).await;
    assert_eq!(doc.context.page_obj.items.len(), 1);
    assert_eq!(doc.context.page_obj.items[0].id, f.post.id);

    let req = test::TestRequest::get()
        .uri("/profile/auth/")
        .cookie(cookie.clone())
        .to_request();
    let doc: Rendered<ProfileContext> = test::call_and_read_body_json(&app, req).await;
    assert!(doc.context.following);

    let req = test::TestRequest::get()
        .uri("/profile/auth/unfollow/")
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), "/profile/auth/");

    let doc: Rendered<FollowContext> = test::call_and_read_body_json(&app, feed(cookie)).await;
    assert!(doc.context.page_obj.items.is_empty());
}

#[actix_web::test]
async fn test_follow_is_unique_and_never_self() {
    let f = fixture().await;
    let app = app!(f.state);

    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri("/profile/auth/follow/")
            .cookie(session(&f.state, &f.reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
    assert!(f.state.repos.follows.exists(f.reader.id, f.author.id).await.unwrap());
    assert!(f.state.repos.follows.remove(f.reader.id, f.author.id).await.unwrap());
    assert!(!f.state.repos.follows.exists(f.reader.id, f.author.id).await.unwrap());

    let req = test::TestRequest::get()
        .uri("/profile/auth/follow/")
        .cookie(session(&f.state, &f.author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/auth/");
    assert!(!f.state.repos.follows.exists(f.author.id, f.author.id).await.unwrap());

    let req = test::TestRequest::get()
        .uri("/profile/nobody/follow/")
        .cookie(session(&f.state, &f.reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_index_page_cache() {
    let f = fixture().await;
    let app = app!(f.state);
    let index = || test::TestRequest::get().uri("/").to_request();

    let resp = test::call_service(&app, index()).await;
    assert_eq!(resp.headers().get("X-Cache").unwrap(), "MISS");
    let resp = test::call_service(&app, index()).await;
    assert_eq!(resp.headers().get("X-Cache").unwrap(), "HIT");

    // A write that bypasses the handlers stays hidden until the cache is cleared.
    f.state
        .repos
        .posts
        .create(Post::new(f.author.id, "Written directly"))
        .await
        .unwrap();
    let doc: Rendered<IndexContext> = test::call_and_read_body_json(&app, index()).await;
    assert_eq!(doc.context.page_obj.count, 1);

    f.state.page_cache.clear().await.unwrap();
    let doc: Rendered<IndexContext> = test::call_and_read_body_json(&app, index()).await;
    assert_eq!(doc.context.page_obj.count, 2);

    // Creating a post through the form invalidates the cached page.
    let req = multipart_post("/create/", &[("text", "Through the form"), ("group", "")], None)
        .cookie(session(&f.state, &f.author))
        .to_request();
    test::call_service(&app, req).await;

    let resp = test::call_service(&app, index()).await;
    assert_eq!(resp.headers().get("X-Cache").unwrap(), "MISS");
    let doc: Rendered<IndexContext> = test::read_body_json(resp).await;
    assert_eq!(doc.context.page_obj.count, 3);
    assert_eq!(doc.context.page_obj.items[0].text, "Through the form");
}

#[actix_web::test]
async fn test_signup_login_logout() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "new_user"),
            ("password1", "s3cret-pass"),
            ("password2", "s3cret-pass"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    assert!(resp.response().cookies().any(|c| c.name() == SESSION_COOKIE));
    assert!(f.state.repos.users.find_by_username("new_user").await.unwrap().is_some());

    // Same username again is rejected on the form.
    let req = test::TestRequest::post()
        .uri("/auth/signup/")
        .set_form([
            ("username", "new_user"),
            ("password1", "s3cret-pass"),
            ("password2", "s3cret-pass"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Rendered<AuthFormContext> = test::read_body_json(resp).await;
    assert!(!doc.context.form.errors["username"].is_empty());

    let req = test::TestRequest::post()
        .uri("/auth/login/?next=/follow/")
        .set_form([("username", "new_user"), ("password", "wrong-pass")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: Rendered<AuthFormContext> = test::read_body_json(resp).await;
    assert_eq!(doc.context.form.errors[NON_FIELD_ERRORS], [BAD_CREDENTIALS.to_string()]);
    assert_eq!(doc.context.next.as_deref(), Some("/follow/"));

    let req = test::TestRequest::post()
        .uri("/auth/login/?next=/follow/")
        .set_form([("username", "new_user"), ("password", "s3cret-pass")])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/follow/");
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap()
        .into_owned();

    let req = test::TestRequest::get()
        .uri("/follow/")
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/auth/logout/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cleared = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cleared.value(), "");
    assert_eq!(template_of(resp).await, "users/logged_out.html");
}

#[actix_web::test]
async fn test_health_reports_database() {
    let f = fixture().await;
    let app = app!(f.state);

    let req = test::TestRequest::get().uri("/health/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}
