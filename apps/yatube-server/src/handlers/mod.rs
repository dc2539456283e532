//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod present;
mod upload;

#[cfg(test)]
mod tests;

use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Serialize;

use yatube_shared::{ErrorResponse, Rendered};

use crate::middleware::error::AppResult;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/profile/{username}/", web::get().to(posts::profile))
        .route(
            "/profile/{username}/follow/",
            web::get().to(posts::profile_follow),
        )
        .route(
            "/profile/{username}/unfollow/",
            web::get().to(posts::profile_unfollow),
        )
        .service(
            web::resource("/create/")
                .route(web::get().to(posts::post_create_form))
                .route(web::post().to(posts::post_create)),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/")
                .route(web::get().to(posts::comment_redirect))
                .route(web::post().to(posts::add_comment)),
        )
        .route("/follow/", web::get().to(posts::follow_index))
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                )
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::get().to(auth::logout))
                        .route(web::post().to(auth::logout)),
                ),
        )
        .route("/health/", web::get().to(health::health_check))
        .default_service(web::to(not_found));
}

/// Respond with a rendered page document.
pub(crate) fn render<C: Serialize>(template: &str, context: C) -> AppResult<HttpResponse> {
    let body = serde_json::to_string(&Rendered::new(template, context))?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found("No page matches the requested path").with_instance(req.path()),
    )
}
