//! Document page handlers
//!
//! Index listing, create/show/edit/delete/duplicate, and appending image
//! references to markdown documents.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::handler::{form_fields, internal_error, page_state, require_signed_in, RequestContext};
use crate::http;
use crate::markdown;
use crate::state::AppState;
use crate::store::documents::valid_name;
use crate::store::RenderMode;
use crate::view;

/// GET / - document listing
pub async fn index(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let files = match state.documents.list().await {
        Ok(files) => files,
        Err(e) => return internal_error(&e),
    };
    let (flash, username) = page_state(ctx, state).await;
    http::build_html_response(
        StatusCode::OK,
        view::index_page(&files, flash.as_deref(), username.as_deref()),
    )
}

/// GET /new - new-document form
pub async fn new_form(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }
    let (flash, username) = page_state(ctx, state).await;
    http::build_html_response(
        StatusCode::OK,
        view::new_document_page(flash.as_deref(), username.as_deref()),
    )
}

/// POST /new - create an empty document
pub async fn create(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }

    let fields = form_fields(ctx);
    let name = fields
        .get("new_file")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    let extension = fields
        .get("extension")
        .map_or(".txt", String::as_str);

    let username = state.sessions.username(&ctx.session_token).await;
    let rerender = |message: &str| {
        http::build_html_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            view::new_document_page(Some(message), username.as_deref()),
        )
    };

    if name.is_empty() {
        return rerender("A name is required.");
    }
    if !matches!(extension, ".txt" | ".md") {
        return rerender("Unsupported document type.");
    }
    let filename = format!("{name}{extension}");
    if !valid_name(&filename) {
        return rerender("Invalid document name.");
    }

    match state.documents.create(&filename).await {
        Ok(()) => {
            state
                .sessions
                .set_flash(&ctx.session_token, &format!("{filename} has been created."))
                .await;
            http::build_redirect_response("/")
        }
        Err(e) => internal_error(&e),
    }
}

/// GET /:filename - raw text or rendered markdown
pub async fn show(ctx: &RequestContext, state: &AppState, name: &str) -> Response<Full<Bytes>> {
    match state.documents.read(name).await {
        Ok(Some(content)) => match RenderMode::from_name(name) {
            RenderMode::PlainText => http::build_text_response(content),
            RenderMode::Markdown => {
                http::build_html_response(StatusCode::OK, markdown::render(&content))
            }
        },
        Ok(None) => not_found_redirect(ctx, state, name).await,
        Err(e) => internal_error(&e),
    }
}

/// GET /:filename/edit - edit form
pub async fn edit_form(ctx: &RequestContext, state: &AppState, name: &str) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }

    let content = match state.documents.read(name).await {
        Ok(Some(content)) => content,
        Ok(None) => return not_found_redirect(ctx, state, name).await,
        Err(e) => return internal_error(&e),
    };

    // Only markdown documents can embed images
    let images = if RenderMode::from_name(name) == RenderMode::Markdown {
        match state.images.list().await {
            Ok(images) => Some(images),
            Err(e) => return internal_error(&e),
        }
    } else {
        None
    };

    let (flash, username) = page_state(ctx, state).await;
    http::build_html_response(
        StatusCode::OK,
        view::edit_page(
            name,
            &content,
            images.as_deref(),
            flash.as_deref(),
            username.as_deref(),
        ),
    )
}

/// POST /:filename/edit - overwrite content
pub async fn edit(ctx: &RequestContext, state: &AppState, name: &str) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }
    if !valid_name(name) {
        return not_found_redirect(ctx, state, name).await;
    }

    let fields = form_fields(ctx);
    let content = fields.get("content").map_or("", String::as_str);

    match state.documents.write(name, content).await {
        Ok(()) => {
            state
                .sessions
                .set_flash(&ctx.session_token, &format!("{name} has been updated"))
                .await;
            http::build_redirect_response("/")
        }
        Err(e) => internal_error(&e),
    }
}

/// POST /:filename/add-image/:image - append an image reference
pub async fn add_image(
    ctx: &RequestContext,
    state: &AppState,
    document: &str,
    image: &str,
) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }
    if !valid_name(image) {
        return not_found_redirect(ctx, state, image).await;
    }

    let fragment = format!("\n![image](/uploads/{image})");
    match state.documents.append(document, &fragment).await {
        Ok(true) => {
            state
                .sessions
                .set_flash(
                    &ctx.session_token,
                    &format!("{image} has been added to {document}."),
                )
                .await;
            http::build_redirect_response(&format!("/{document}/edit"))
        }
        Ok(false) => not_found_redirect(ctx, state, document).await,
        Err(e) => internal_error(&e),
    }
}

/// POST /:filename/delete
pub async fn delete(ctx: &RequestContext, state: &AppState, name: &str) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }

    match state.documents.delete(name).await {
        Ok(true) => {
            state
                .sessions
                .set_flash(&ctx.session_token, &format!("{name} has been deleted."))
                .await;
            http::build_redirect_response("/")
        }
        Ok(false) => not_found_redirect(ctx, state, name).await,
        Err(e) => internal_error(&e),
    }
}

/// POST /:filename/duplicate
pub async fn duplicate(ctx: &RequestContext, state: &AppState, name: &str) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }

    match state.documents.duplicate(name).await {
        Ok(Some(_)) => {
            state
                .sessions
                .set_flash(&ctx.session_token, &format!("{name} has been duplicated."))
                .await;
            http::build_redirect_response("/")
        }
        Ok(None) => not_found_redirect(ctx, state, name).await,
        Err(e) => internal_error(&e),
    }
}

/// Flash "does not exist" and send the client back to the index
async fn not_found_redirect(
    ctx: &RequestContext,
    state: &AppState,
    name: &str,
) -> Response<Full<Bytes>> {
    state
        .sessions
        .set_flash(&ctx.session_token, &format!("{name} does not exist."))
        .await;
    http::build_redirect_response("/")
}
