//! Request routing dispatch module
//!
//! Maps `(method, path)` pairs, including the dynamic `:filename` and
//! `:image` segments, to page handlers.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};

use crate::handler::{documents, images, users, RequestContext};
use crate::http;
use crate::state::AppState;

/// A resolved application route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    NewDocumentForm,
    CreateDocument,
    Images,
    Upload,
    ServeUpload(String),
    ShowDocument(String),
    EditDocumentForm(String),
    EditDocument(String),
    AddImage { document: String, image: String },
    DeleteDocument(String),
    DuplicateDocument(String),
    SigninForm,
    Signin,
    SignupForm,
    Signup,
    Signout,
}

/// Why a request did not resolve to a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    NotFound,
    MethodNotAllowed,
}

impl Route {
    /// Resolve a method and path to a route
    ///
    /// Literal paths are matched before the dynamic `:filename` patterns,
    /// so `/new` is always the form and never a document named `new`.
    /// Path segments are percent-decoded.
    pub fn parse(method: &Method, path: &str) -> Result<Self, RouteError> {
        let mut segments = Vec::new();
        for raw in path.split('/').filter(|s| !s.is_empty()) {
            let decoded = urlencoding::decode(raw).map_err(|_| RouteError::NotFound)?;
            segments.push(decoded.into_owned());
        }
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let get = *method == Method::GET;
        let post = *method == Method::POST;

        match segments.as_slice() {
            [] if get => Ok(Self::Index),
            [] => Err(RouteError::MethodNotAllowed),

            ["new"] if get => Ok(Self::NewDocumentForm),
            ["new"] if post => Ok(Self::CreateDocument),
            ["new"] => Err(RouteError::MethodNotAllowed),

            ["images"] if get => Ok(Self::Images),
            ["images"] => Err(RouteError::MethodNotAllowed),

            ["upload"] if post => Ok(Self::Upload),
            ["upload"] => Err(RouteError::MethodNotAllowed),

            ["users", "signin"] if get => Ok(Self::SigninForm),
            ["users", "signin"] if post => Ok(Self::Signin),
            ["users", "signin"] => Err(RouteError::MethodNotAllowed),

            ["users", "signup"] if get => Ok(Self::SignupForm),
            ["users", "signup"] if post => Ok(Self::Signup),
            ["users", "signup"] => Err(RouteError::MethodNotAllowed),

            ["users", "signout"] if post => Ok(Self::Signout),
            ["users", "signout"] => Err(RouteError::MethodNotAllowed),

            ["uploads", image] if get => Ok(Self::ServeUpload((*image).to_string())),
            ["uploads", _] => Err(RouteError::MethodNotAllowed),

            [filename] if get => Ok(Self::ShowDocument((*filename).to_string())),
            [_] => Err(RouteError::MethodNotAllowed),

            [filename, "edit"] if get => Ok(Self::EditDocumentForm((*filename).to_string())),
            [filename, "edit"] if post => Ok(Self::EditDocument((*filename).to_string())),
            [_, "edit"] => Err(RouteError::MethodNotAllowed),

            [filename, "delete"] if post => Ok(Self::DeleteDocument((*filename).to_string())),
            [_, "delete"] => Err(RouteError::MethodNotAllowed),

            [filename, "duplicate"] if post => {
                Ok(Self::DuplicateDocument((*filename).to_string()))
            }
            [_, "duplicate"] => Err(RouteError::MethodNotAllowed),

            [document, "add-image", image] if post => Ok(Self::AddImage {
                document: (*document).to_string(),
                image: (*image).to_string(),
            }),
            [_, "add-image", _] => Err(RouteError::MethodNotAllowed),

            _ => Err(RouteError::NotFound),
        }
    }
}

/// Resolve and run the handler for a request
pub async fn dispatch(ctx: &RequestContext, state: &AppState) -> Response<Full<Bytes>> {
    let route = match Route::parse(&ctx.method, &ctx.path) {
        Ok(route) => route,
        Err(RouteError::NotFound) => return http::build_404_response(),
        Err(RouteError::MethodNotAllowed) => return http::build_405_response(),
    };

    match route {
        Route::Index => documents::index(ctx, state).await,
        Route::NewDocumentForm => documents::new_form(ctx, state).await,
        Route::CreateDocument => documents::create(ctx, state).await,
        Route::ShowDocument(name) => documents::show(ctx, state, &name).await,
        Route::EditDocumentForm(name) => documents::edit_form(ctx, state, &name).await,
        Route::EditDocument(name) => documents::edit(ctx, state, &name).await,
        Route::AddImage { document, image } => {
            documents::add_image(ctx, state, &document, &image).await
        }
        Route::DeleteDocument(name) => documents::delete(ctx, state, &name).await,
        Route::DuplicateDocument(name) => documents::duplicate(ctx, state, &name).await,
        Route::Images => images::gallery(ctx, state).await,
        Route::Upload => images::upload(ctx, state).await,
        Route::ServeUpload(name) => images::serve(ctx, state, &name).await,
        Route::SigninForm => users::signin_form(ctx, state).await,
        Route::Signin => users::signin(ctx, state).await,
        Route::SignupForm => users::signup_form(ctx, state).await,
        Route::Signup => users::signup(ctx, state).await,
        Route::Signout => users::signout(ctx, state).await,
    }
}
