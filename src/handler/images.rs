//! Image page handlers
//!
//! Gallery listing, multipart upload, and serving uploaded image bytes
//! with cache revalidation.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::path::Path;

use crate::handler::{internal_error, page_state, require_signed_in, RequestContext};
use crate::http::{self, cache, form, mime};
use crate::state::AppState;
use crate::store::images::is_image;
use crate::view;

/// GET /images - gallery with upload form
pub async fn gallery(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let images = match state.images.list().await {
        Ok(images) => images,
        Err(e) => return internal_error(&e),
    };
    let (flash, username) = page_state(ctx, state).await;
    http::build_html_response(
        StatusCode::OK,
        view::images_page(&images, flash.as_deref(), username.as_deref()),
    )
}

/// POST /upload - accept a multipart image upload
pub async fn upload(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    if let Some(denied) = require_signed_in(ctx, state).await {
        return denied;
    }

    let file = ctx
        .content_type
        .as_deref()
        .and_then(form::multipart_boundary)
        .and_then(|boundary| form::parse_multipart(&ctx.body, &boundary, "file"));

    let message = match file {
        Some(file) if is_image(&file.filename) => {
            match state.images.save(&file.filename, &file.data).await {
                Ok(()) => format!("{} has been uploaded.", file.filename),
                Err(e) => return internal_error(&e),
            }
        }
        Some(_) => "File must be an image.".to_string(),
        None => "You must choose a file.".to_string(),
    };

    state.sessions.set_flash(&ctx.session_token, &message).await;
    http::build_redirect_response("/images")
}

/// GET /uploads/:image - serve image bytes
pub async fn serve(ctx: &RequestContext, state: &AppState, name: &str) -> Response<Full<Bytes>> {
    match state.images.read(name).await {
        Ok(Some(data)) => {
            let etag = cache::generate_etag(&data);
            if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
                return http::build_304_response(&etag);
            }
            let content_type =
                mime::get_content_type(Path::new(name).extension().and_then(|e| e.to_str()));
            http::build_image_response(data, content_type, &etag)
        }
        Ok(None) => http::build_404_response(),
        Err(e) => internal_error(&e),
    }
}
