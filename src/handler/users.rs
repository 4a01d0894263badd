//! User account handlers
//!
//! Sign-in, sign-up, and sign-out against the YAML credential store.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::handler::{form_fields, internal_error, page_state, RequestContext};
use crate::http;
use crate::state::AppState;
use crate::store::credentials::signup_error;
use crate::view;

/// GET /users/signin
pub async fn signin_form(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let (flash, username) = page_state(ctx, state).await;
    http::build_html_response(
        StatusCode::OK,
        view::signin_page(flash.as_deref(), username.as_deref()),
    )
}

/// POST /users/signin
pub async fn signin(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let fields = form_fields(ctx);
    let username = fields.get("username").map_or("", String::as_str);
    let password = fields.get("password").map_or("", String::as_str);

    match state.credentials.verify(username, password).await {
        Ok(true) => {
            state.sessions.sign_in(&ctx.session_token, username).await;
            state
                .sessions
                .set_flash(&ctx.session_token, "Welcome!")
                .await;
            http::build_redirect_response("/")
        }
        Ok(false) => {
            let current = state.sessions.username(&ctx.session_token).await;
            http::build_html_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                view::signin_page(Some("Invalid Credentials"), current.as_deref()),
            )
        }
        Err(e) => internal_error(&e),
    }
}

/// GET /users/signup
pub async fn signup_form(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let (flash, username) = page_state(ctx, state).await;
    http::build_html_response(
        StatusCode::OK,
        view::signup_page(flash.as_deref(), username.as_deref()),
    )
}

/// POST /users/signup
pub async fn signup(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let fields = form_fields(ctx);
    let username = fields.get("username").map_or("", String::as_str);
    let password = fields.get("password").map_or("", String::as_str);
    let verify = fields.get("verify_password").map_or("", String::as_str);

    let users = match state.credentials.load().await {
        Ok(users) => users,
        Err(e) => return internal_error(&e),
    };

    if let Some(error) = signup_error(&users, username, password, verify) {
        let current = state.sessions.username(&ctx.session_token).await;
        return http::build_html_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            view::signup_page(Some(error), current.as_deref()),
        );
    }

    match state.credentials.signup(username, password).await {
        Ok(()) => {
            state.sessions.sign_in(&ctx.session_token, username).await;
            state
                .sessions
                .set_flash(&ctx.session_token, &format!("Welcome {username}!"))
                .await;
            http::build_redirect_response("/")
        }
        // Lost a signup race for the same name
        Err(e) if is_taken(&e) => {
            let current = state.sessions.username(&ctx.session_token).await;
            http::build_html_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                view::signup_page(
                    Some("Username is taken -- Please choose another."),
                    current.as_deref(),
                ),
            )
        }
        Err(e) => internal_error(&e),
    }
}

/// POST /users/signout
pub async fn signout(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    state.sessions.sign_out(&ctx.session_token).await;
    state
        .sessions
        .set_flash(&ctx.session_token, "You have been signed out")
        .await;
    http::build_redirect_response("/")
}

fn is_taken(error: &crate::error::StoreError) -> bool {
    matches!(
        error,
        crate::error::StoreError::Io(e) if e.kind() == std::io::ErrorKind::AlreadyExists
    )
}
