//! Account handlers: signup, login and logout.

use actix_web::http::header::{self, ContentType};
use actix_web::{HttpResponse, web};
use serde::Deserialize;

use yatube_core::domain::User;
use yatube_core::error::RepoError;
use yatube_core::forms::{
    BAD_CREDENTIALS, FormErrors, LoginForm, NON_FIELD_ERRORS, SignupForm, USERNAME_TAKEN,
};
use yatube_core::ports::BaseRepository;
use yatube_shared::Rendered;
use yatube_shared::views::{AuthFormContext, FormView, LoggedOutContext, templates};

use super::present::form_view;
use super::render;
use crate::middleware::auth::{cleared_session_cookie, session_cookie};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::urls;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

fn auth_page(template: &str, form: FormView, next: Option<String>) -> AppResult<HttpResponse> {
    render(template, AuthFormContext { form, next })
}

/// Redirect to `location` with a new session for `user`.
fn start_session(state: &AppState, user: &User, location: String) -> AppResult<HttpResponse> {
    let token = state.tokens.generate_token(user.id, &user.username)?;
    let cookie = session_cookie(token, state.tokens.expiration_seconds());

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish())
}

/// GET /auth/signup/
pub async fn signup_form() -> AppResult<HttpResponse> {
    auth_page(templates::SIGNUP, FormView::default(), None)
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    let cleaned = match form.clean() {
        Ok(cleaned) => cleaned,
        Err(errors) => return auth_page(templates::SIGNUP, form_view(form.values(), errors), None),
    };

    let taken = || {
        auth_page(
            templates::SIGNUP,
            form_view(
                form.values(),
                FormErrors::new().with("username", USERNAME_TAKEN),
            ),
            None,
        )
    };

    if state
        .repos
        .users
        .find_by_username(&cleaned.username)
        .await?
        .is_some()
    {
        return taken();
    }

    let password_hash = state.passwords.hash(&cleaned.password)?;
    let user = match state
        .repos
        .users
        .create(User::new(cleaned.username, password_hash))
        .await
    {
        Ok(user) => user,
        Err(RepoError::Constraint(_)) => return taken(),
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
    start_session(&state, &user, urls::index())
}

/// GET /auth/login/
pub async fn login_form(query: web::Query<NextQuery>) -> AppResult<HttpResponse> {
    auth_page(
        templates::LOGIN,
        FormView::default(),
        query.into_inner().next,
    )
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    query: web::Query<NextQuery>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let next = query.into_inner().next;

    let (username, password) = match form.clean() {
        Ok(credentials) => credentials,
        Err(errors) => return auth_page(templates::LOGIN, form_view(form.values(), errors), next),
    };

    let user = state.repos.users.find_by_username(&username).await?;
    let verified = match &user {
        Some(user) => state.passwords.verify(&password, &user.password_hash)?,
        None => false,
    };

    match user {
        Some(user) if verified => {
            tracing::info!(user_id = %user.id, "User logged in");
            start_session(&state, &user, urls::safe_next(next.as_deref()))
        }
        _ => {
            tracing::debug!(%username, "Login rejected");
            let errors = FormErrors::new().with(NON_FIELD_ERRORS, BAD_CREDENTIALS);
            auth_page(templates::LOGIN, form_view(form.values(), errors), next)
        }
    }
}

/// GET|POST /auth/logout/
pub async fn logout() -> AppResult<HttpResponse> {
    let document = Rendered::new(
        templates::LOGGED_OUT,
        LoggedOutContext {
            title: "You have been logged out".to_string(),
        },
    );

    Ok(HttpResponse::Ok()
        .cookie(cleared_session_cookie())
        .content_type(ContentType::json())
        .body(serde_json::to_string(&document)?))
}
