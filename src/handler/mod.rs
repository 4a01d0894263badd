//! Request handler module
//!
//! The hyper entry point: collects the request body (bounded by
//! `max_body_size`), resolves the session from the cookie, dispatches to
//! the page handlers, and writes the access log entry.

mod documents;
mod images;
pub mod router;
mod users;

pub use router::{dispatch, Route, RouteError};

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::error::StoreError;
use crate::http::{self, cookie, form, response};
use crate::logger::{self, AccessLogEntry};
use crate::state::AppState;

/// Request context encapsulating what the page handlers need
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Token of the (possibly fresh) session this request runs under
    pub session_token: String,
    pub content_type: Option<String>,
    pub if_none_match: Option<String>,
    pub body: Bytes,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let http_version = version_label(req.version());

    // Only the page methods are served
    if method != Method::GET && method != Method::POST {
        logger::log_warning(&format!("Method not allowed: {method}"));
        return Ok(http::build_405_response());
    }

    let max_body_size = state.config.http.max_body_size;
    if declared_body_size(req.headers()).is_some_and(|size| size > max_body_size) {
        logger::log_error(&format!("Request body too large (max: {max_body_size})"));
        return Ok(http::build_413_response());
    }

    let cookie_header = header_value(req.headers(), "cookie");
    let content_type = header_value(req.headers(), "content-type");
    let if_none_match = header_value(req.headers(), "if-none-match");
    let referer = header_value(req.headers(), "referer");
    let user_agent = header_value(req.headers(), "user-agent");

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            logger::log_error(&format!("Failed to read request body: {e}"));
            return Ok(http::build_500_response());
        }
    };
    // Content-Length can lie; re-check what actually arrived
    if body.len() as u64 > max_body_size {
        return Ok(http::build_413_response());
    }

    // Resolve the session, creating one for first-time visitors
    let existing = cookie::get_cookie(cookie_header.as_deref(), &state.config.session.cookie_name);
    let (session_token, is_new_session) = match existing {
        Some(token) if state.sessions.contains(&token).await => (token, false),
        _ => (state.sessions.create().await, true),
    };

    let ctx = RequestContext {
        method: method.clone(),
        path: path.clone(),
        session_token: session_token.clone(),
        content_type,
        if_none_match,
        body,
    };

    let mut resp = dispatch(&ctx, &state).await;

    if is_new_session {
        let cookie = cookie::session_cookie(&state.config.session.cookie_name, &session_token);
        response::attach_cookie(&mut resp, &cookie);
    }

    if state.cached_access_log.load(Ordering::Relaxed) {
        let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path);
        entry.http_version = http_version.to_string();
        entry.status = resp.status().as_u16();
        entry.body_bytes = response_body_size(&resp);
        entry.referer = referer;
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(resp)
}

/// Parsed Content-Length, when present and well-formed
fn declared_body_size(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get("content-length")?.to_str().ok()?;
    match raw.parse() {
        Ok(size) => Some(size),
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{raw}', skipping size check"
            ));
            None
        }
    }
}

/// Body size for access logging, read back from Content-Length
fn response_body_size(resp: &Response<Full<Bytes>>) -> usize {
    resp.headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: hyper::Version) -> &'static str {
    if version == hyper::Version::HTTP_10 {
        "1.0"
    } else if version == hyper::Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

/// Parse the urlencoded request body into a field map
pub(crate) fn form_fields(ctx: &RequestContext) -> HashMap<String, String> {
    form::parse_urlencoded(&String::from_utf8_lossy(&ctx.body))
}

/// Gate a handler on a signed-in session
///
/// Returns the redirect to send instead when the session is anonymous.
pub(crate) async fn require_signed_in(
    ctx: &RequestContext,
    state: &AppState,
) -> Option<Response<Full<Bytes>>> {
    if state.sessions.username(&ctx.session_token).await.is_some() {
        return None;
    }
    state
        .sessions
        .set_flash(&ctx.session_token, "You must be signed in to do that.")
        .await;
    Some(http::build_redirect_response("/"))
}

/// Flash and username for a page render; consumes the pending flash
pub(crate) async fn page_state(
    ctx: &RequestContext,
    state: &AppState,
) -> (Option<String>, Option<String>) {
    let flash = state.sessions.take_flash(&ctx.session_token).await;
    let username = state.sessions.username(&ctx.session_token).await;
    (flash, username)
}

/// Map a store failure to the error log and a 500 page
pub(crate) fn internal_error(error: &StoreError) -> Response<Full<Bytes>> {
    logger::log_error(&format!("Store operation failed: {error}"));
    http::build_500_response()
}
