//! CRUD acceptance tests
//!
//! Drives the page handlers directly through `handler::dispatch` with
//! tempdir-backed stores, covering the full HTTP surface: document CRUD,
//! authentication gating, signup validation, and image uploads.

use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Response};
use tempfile::TempDir;

use flatdoc::config::Config;
use flatdoc::handler::{self, RequestContext};
use flatdoc::state::AppState;

struct TestApp {
    state: Arc<AppState>,
    _dirs: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let dirs = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dirs.path().join("data")).unwrap();
        std::fs::create_dir_all(dirs.path().join("uploads")).unwrap();

        let mut cfg = Config::load_from("nonexistent-config").unwrap();
        cfg.storage.data_dir = dirs.path().join("data").to_string_lossy().into_owned();
        cfg.storage.uploads_dir = dirs.path().join("uploads").to_string_lossy().into_owned();
        cfg.storage.credentials_file = dirs.path().join("users.yml").to_string_lossy().into_owned();

        Self {
            state: Arc::new(AppState::new(&cfg)),
            _dirs: dirs,
        }
    }

    /// A fresh anonymous session token
    async fn session(&self) -> String {
        self.state.sessions.create().await
    }

    /// A session already signed in as `admin`
    async fn admin_session(&self) -> String {
        let token = self.state.sessions.create().await;
        self.state.sessions.sign_in(&token, "admin").await;
        token
    }

    async fn create_document(&self, name: &str, content: &str) {
        self.state.documents.write(name, content).await.unwrap();
    }

    async fn get(&self, path: &str, token: &str) -> Response<Full<Bytes>> {
        self.request(Method::GET, path, token, Bytes::new(), None, None)
            .await
    }

    async fn post(&self, path: &str, token: &str, body: &str) -> Response<Full<Bytes>> {
        self.request(
            Method::POST,
            path,
            token,
            Bytes::from(body.to_string()),
            Some("application/x-www-form-urlencoded".to_string()),
            None,
        )
        .await
    }

    async fn post_multipart(
        &self,
        path: &str,
        token: &str,
        body: Vec<u8>,
        boundary: &str,
    ) -> Response<Full<Bytes>> {
        self.request(
            Method::POST,
            path,
            token,
            Bytes::from(body),
            Some(format!("multipart/form-data; boundary={boundary}")),
            None,
        )
        .await
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Bytes,
        content_type: Option<String>,
        if_none_match: Option<String>,
    ) -> Response<Full<Bytes>> {
        let ctx = RequestContext {
            method,
            path: path.to_string(),
            session_token: token.to_string(),
            content_type,
            if_none_match,
            body,
        };
        handler::dispatch(&ctx, &self.state).await
    }

    async fn flash(&self, token: &str) -> Option<String> {
        self.state.sessions.take_flash(token).await
    }
}

async fn body_string(resp: Response<Full<Bytes>>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn header<'a>(resp: &'a Response<Full<Bytes>>, name: &str) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn multipart_upload(boundary: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_index() {
    let app = TestApp::new().await;
    app.create_document("about.md", "").await;
    app.create_document("changes.txt", "").await;
    let token = app.session().await;

    let resp = app.get("/", &token).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "Content-Type"), "text/html; charset=utf-8");

    let body = body_string(resp).await;
    assert!(body.contains("about.md"));
    assert!(body.contains("changes.txt"));
}

#[tokio::test]
async fn test_viewing_text_document() {
    let app = TestApp::new().await;
    app.create_document("history.txt", "2015 - Rust 1.0 released.")
        .await;
    let token = app.session().await;

    let resp = app.get("/history.txt", &token).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "Content-Type"), "text/plain; charset=utf-8");
    assert!(body_string(resp).await.contains("2015 - Rust 1.0 released."));
}

#[tokio::test]
async fn test_viewing_markdown_document() {
    let app = TestApp::new().await;
    app.create_document("about.md", "# About this wiki").await;
    let token = app.session().await;

    let resp = app.get("/about.md", &token).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "Content-Type"), "text/html; charset=utf-8");
    assert!(body_string(resp).await.contains("<h1>About this wiki</h1>"));
}

#[tokio::test]
async fn test_document_not_found() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app.get("/notafile.ext", &token).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(header(&resp, "Location"), "/");
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("notafile.ext does not exist.")
    );
}

#[tokio::test]
async fn test_editing_document() {
    let app = TestApp::new().await;
    app.create_document("changes.txt", "This space for rent.")
        .await;
    let token = app.admin_session().await;

    let resp = app.get("/changes.txt/edit", &token).await;
    assert_eq!(resp.status(), 200);

    let body = body_string(resp).await;
    assert!(body.contains("<textarea"));
    assert!(body.contains(r#"<button type="submit""#));
    assert!(body.contains("This space for rent."));
}

#[tokio::test]
async fn test_editing_document_signed_out() {
    let app = TestApp::new().await;
    app.create_document("changes.txt", "This space for rent.")
        .await;
    let token = app.session().await;

    let resp = app.get("/changes.txt/edit", &token).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
}

#[tokio::test]
async fn test_updating_document() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app
        .post("/changes.txt/edit", &token, "content=new_content")
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("changes.txt has been updated")
    );

    let resp = app.get("/changes.txt", &token).await;
    assert_eq!(resp.status(), 200);
    assert!(body_string(resp).await.contains("new_content"));
}

#[tokio::test]
async fn test_updating_document_signed_out() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .post("/changes.txt/edit", &token, "content=new+content")
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
}

#[tokio::test]
async fn test_view_new_document_form() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app.get("/new", &token).await;
    assert_eq!(resp.status(), 200);

    let body = body_string(resp).await;
    assert!(body.contains(r#"<button type="submit""#));
    assert!(body.contains("<input"));
}

#[tokio::test]
async fn test_new_document_form_signed_out() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app.get("/new", &token).await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
}

#[tokio::test]
async fn test_create_new_document() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app
        .post("/new", &token, "new_file=test&extension=.txt")
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("test.txt has been created.")
    );

    let resp = app.get("/", &token).await;
    assert!(body_string(resp).await.contains("test.txt"));
}

#[tokio::test]
async fn test_create_new_document_signed_out() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .post("/new", &token, "new_file=test&extension=.txt")
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
}

#[tokio::test]
async fn test_create_new_document_without_filename() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app.post("/new", &token, "new_file=").await;
    assert_eq!(resp.status(), 422);
    assert!(body_string(resp).await.contains("A name is required."));
}

#[tokio::test]
async fn test_create_new_document_bad_extension() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app
        .post("/new", &token, "new_file=evil&extension=.exe")
        .await;
    assert_eq!(resp.status(), 422);
    assert!(body_string(resp).await.contains("Unsupported document type."));
}

#[tokio::test]
async fn test_delete_document() {
    let app = TestApp::new().await;
    app.create_document("test.txt", "").await;
    let token = app.admin_session().await;

    let resp = app.post("/test.txt/delete", &token, "").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("test.txt has been deleted.")
    );

    let resp = app.get("/", &token).await;
    assert!(!body_string(resp).await.contains(r#"href="/test.txt""#));
}

#[tokio::test]
async fn test_delete_document_signed_out() {
    let app = TestApp::new().await;
    app.create_document("test.txt", "").await;
    let token = app.session().await;

    let resp = app.post("/test.txt/delete", &token, "").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
    assert!(app.state.documents.exists("test.txt").await);
}

#[tokio::test]
async fn test_duplicate_document() {
    let app = TestApp::new().await;
    app.create_document("changes.txt", "testing 1, 2, 3").await;
    let token = app.admin_session().await;

    let resp = app.post("/changes.txt/duplicate", &token, "").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("changes.txt has been duplicated.")
    );

    let resp = app.get("/", &token).await;
    assert!(body_string(resp).await.contains("changes_copy_1.txt"));

    let resp = app.get("/changes_copy_1.txt", &token).await;
    assert!(body_string(resp).await.contains("testing 1, 2, 3"));
}

#[tokio::test]
async fn test_duplicate_document_signed_out() {
    let app = TestApp::new().await;
    app.create_document("changes.txt", "testing 1, 2, 3").await;
    let token = app.session().await;

    let resp = app.post("/changes.txt/duplicate", &token, "").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
}

#[tokio::test]
async fn test_signin_form() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app.get("/users/signin", &token).await;
    assert_eq!(resp.status(), 200);

    let body = body_string(resp).await;
    assert!(body.contains(r#"<button type="submit""#));
    assert!(body.contains("<input"));
}

#[tokio::test]
async fn test_signin() {
    let app = TestApp::new().await;
    app.state.credentials.signup("admin", "secret").await.unwrap();
    let token = app.session().await;

    let resp = app
        .post("/users/signin", &token, "username=admin&password=secret")
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(header(&resp, "Location"), "/");
    assert_eq!(app.flash(&token).await.as_deref(), Some("Welcome!"));
    assert_eq!(
        app.state.sessions.username(&token).await.as_deref(),
        Some("admin")
    );

    let resp = app.get("/", &token).await;
    assert!(body_string(resp).await.contains("Signed in as admin"));
}

#[tokio::test]
async fn test_signin_with_bad_credentials() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .post("/users/signin", &token, "username=test&password=incorrect")
        .await;
    assert_eq!(resp.status(), 422);
    assert_eq!(app.state.sessions.username(&token).await, None);
    assert!(body_string(resp).await.contains("Invalid Credentials"));
}

#[tokio::test]
async fn test_signout() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app.get("/", &token).await;
    assert!(body_string(resp).await.contains("Signed in as admin"));

    let resp = app.post("/users/signout", &token, "").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(app.state.sessions.username(&token).await, None);

    let resp = app.get("/", &token).await;
    let body = body_string(resp).await;
    assert!(body.contains("You have been signed out"));
    assert!(body.contains("Sign In"));
}

#[tokio::test]
async fn test_signup() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .post(
            "/users/signup",
            &token,
            "username=new_user&password=shhhhh&verify_password=shhhhh",
        )
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(app.flash(&token).await.as_deref(), Some("Welcome new_user!"));
    assert_eq!(
        app.state.sessions.username(&token).await.as_deref(),
        Some("new_user")
    );

    let resp = app.get("/", &token).await;
    assert!(body_string(resp).await.contains("Signed in as new_user"));
}

#[tokio::test]
async fn test_signup_with_repeat_username() {
    let app = TestApp::new().await;
    app.state.credentials.signup("admin", "secret").await.unwrap();
    let token = app.session().await;

    let resp = app
        .post(
            "/users/signup",
            &token,
            "username=admin&password=secret1&verify_password=secret1",
        )
        .await;
    assert_eq!(resp.status(), 422);
    assert_eq!(app.state.sessions.username(&token).await, None);
    assert!(body_string(resp)
        .await
        .contains("Username is taken -- Please choose another."));
}

#[tokio::test]
async fn test_signup_with_mismatched_passwords() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .post(
            "/users/signup",
            &token,
            "username=new_user&password=shhhhh&verify_password=shhhhhh",
        )
        .await;
    assert_eq!(resp.status(), 422);
    assert!(body_string(resp)
        .await
        .contains("Passwords do not match -- Please try again."));
}

#[tokio::test]
async fn test_signup_with_short_password() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .post(
            "/users/signup",
            &token,
            "username=new_user&password=shh&verify_password=shh",
        )
        .await;
    assert_eq!(resp.status(), 422);
    assert!(body_string(resp)
        .await
        .contains("Password must be at least 6 characters."));
}

#[tokio::test]
async fn test_signup_with_short_username() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .post(
            "/users/signup",
            &token,
            "username=abc&password=shhhhh&verify_password=shhhhh",
        )
        .await;
    assert_eq!(resp.status(), 422);
    assert!(body_string(resp)
        .await
        .contains("Username must be at least 4 characters (no spaces)"));
}

#[tokio::test]
async fn test_images_page() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app.get("/images", &token).await;
    assert_eq!(resp.status(), 200);

    let body = body_string(resp).await;
    assert!(body.contains(r#"<input type="submit""#));
    assert!(body.contains("<input"));
}

#[tokio::test]
async fn test_upload_image() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let body = multipart_upload("AaB03x", "test_image.jpg", b"\xff\xd8\xff\xe0fakejpeg");
    let resp = app.post_multipart("/upload", &token, body, "AaB03x").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(header(&resp, "Location"), "/images");
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("test_image.jpg has been uploaded.")
    );

    let resp = app.get("/images", &token).await;
    assert!(body_string(resp).await.contains("test_image.jpg"));

    let resp = app.get("/uploads/test_image.jpg", &token).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(header(&resp, "Content-Type"), "image/jpeg");
}

#[tokio::test]
async fn test_upload_unsupported_file() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let body = multipart_upload("AaB03x", "test_file.rtf", b"{\\rtf1}");
    let resp = app.post_multipart("/upload", &token, body, "AaB03x").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("File must be an image.")
    );
    assert!(!app.state.images.exists("test_file.rtf").await);
}

#[tokio::test]
async fn test_upload_without_file() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app.post("/upload", &token, "").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must choose a file.")
    );
}

#[tokio::test]
async fn test_upload_signed_out() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app.post("/upload", &token, "").await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
}

#[tokio::test]
async fn test_serve_upload_etag_revalidation() {
    let app = TestApp::new().await;
    app.state.images.save("cat.gif", b"GIF89a").await.unwrap();
    let token = app.session().await;

    let resp = app.get("/uploads/cat.gif", &token).await;
    assert_eq!(resp.status(), 200);
    let etag = header(&resp, "ETag").to_string();
    assert!(!etag.is_empty());

    let resp = app
        .request(
            Method::GET,
            "/uploads/cat.gif",
            &token,
            Bytes::new(),
            None,
            Some(etag),
        )
        .await;
    assert_eq!(resp.status(), 304);
}

#[tokio::test]
async fn test_no_image_list_for_text_document() {
    let app = TestApp::new().await;
    app.create_document("changes.txt", "This space for rent.")
        .await;
    let token = app.admin_session().await;

    let resp = app.get("/changes.txt/edit", &token).await;
    assert_eq!(resp.status(), 200);

    let body = body_string(resp).await;
    assert!(!body.contains("<h3>Add an Image</h3>"));
    assert!(body.contains("This space for rent."));
}

#[tokio::test]
async fn test_image_list_for_markdown_document() {
    let app = TestApp::new().await;
    app.create_document("about.md", "# About this wiki").await;
    let token = app.admin_session().await;

    let resp = app.get("/about.md/edit", &token).await;
    assert_eq!(resp.status(), 200);

    let body = body_string(resp).await;
    assert!(body.contains("# About this wiki"));
    assert!(body.contains("<h3>Add an Image</h3>"));
}

#[tokio::test]
async fn test_add_image_to_document() {
    let app = TestApp::new().await;
    app.state
        .images
        .save("test_image.jpg", b"\xff\xd8\xff")
        .await
        .unwrap();
    app.create_document("about.md", "# About this wiki").await;
    let token = app.admin_session().await;

    let resp = app
        .post("/about.md/add-image/test_image.jpg", &token, "")
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(header(&resp, "Location"), "/about.md/edit");
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("test_image.jpg has been added to about.md.")
    );

    let resp = app.get("/about.md/edit", &token).await;
    let body = body_string(resp).await;
    assert!(body.contains("![image](/uploads/test_image.jpg)"));
    assert!(body.contains("# About this wiki"));
}

#[tokio::test]
async fn test_add_image_signed_out() {
    let app = TestApp::new().await;
    app.create_document("about.md", "# About this wiki").await;
    let token = app.session().await;

    let resp = app
        .post("/about.md/add-image/test_image.jpg", &token, "")
        .await;
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("You must be signed in to do that.")
    );
}

#[tokio::test]
async fn test_flash_is_shown_once() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app.get("/notafile.ext", &token).await;
    assert_eq!(resp.status(), 302);

    let resp = app.get("/", &token).await;
    assert!(body_string(resp).await.contains("notafile.ext does not exist."));

    let resp = app.get("/", &token).await;
    assert!(!body_string(resp).await.contains("notafile.ext does not exist."));
}

#[tokio::test]
async fn test_traversal_filename_is_rejected() {
    let app = TestApp::new().await;
    let token = app.admin_session().await;

    let resp = app.get("/%2e%2e%2fsecret", &token).await;
    // Decodes to "../secret" which is not a valid document name
    assert_eq!(resp.status(), 302);
    assert_eq!(
        app.flash(&token).await.as_deref(),
        Some("../secret does not exist.")
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app.get("/a/b/c/d", &token).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_wrong_method_is_405() {
    let app = TestApp::new().await;
    let token = app.session().await;

    let resp = app
        .request(
            Method::POST,
            "/images",
            &token,
            Bytes::new(),
            None,
            None,
        )
        .await;
    assert_eq!(resp.status(), 405);
}
