//! Session store module
//!
//! Server-side sessions keyed by a random cookie token. Each session
//! carries the signed-in username (if any) and a one-shot flash message
//! consumed on the next page render. Sessions live only as long as the
//! server process.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Length of generated session tokens
pub const TOKEN_LEN: usize = 32;

/// Per-browser session state
#[derive(Debug, Default, Clone)]
pub struct Session {
    pub username: Option<String>,
    pub flash: Option<String>,
}

/// In-memory session map behind an async lock
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh session and return its token
    pub async fn create(&self) -> String {
        let token = generate_token();
        self.sessions
            .write()
            .await
            .insert(token.clone(), Session::default());
        token
    }

    /// Whether a token refers to a live session
    pub async fn contains(&self, token: &str) -> bool {
        self.sessions.read().await.contains_key(token)
    }

    /// The signed-in username for a session, if any
    pub async fn username(&self, token: &str) -> Option<String> {
        self.sessions
            .read()
            .await
            .get(token)
            .and_then(|s| s.username.clone())
    }

    /// Record a successful sign-in
    pub async fn sign_in(&self, token: &str, username: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.username = Some(username.to_string());
        }
    }

    /// Drop the signed-in username, keeping the session alive
    pub async fn sign_out(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.username = None;
        }
    }

    /// Store a flash message for the next render
    pub async fn set_flash(&self, token: &str, message: &str) {
        if let Some(session) = self.sessions.write().await.get_mut(token) {
            session.flash = Some(message.to_string());
        }
    }

    /// Consume the pending flash message, if any
    pub async fn take_flash(&self, token: &str) -> Option<String> {
        self.sessions
            .write()
            .await
            .get_mut(token)
            .and_then(|s| s.flash.take())
    }
}

/// Generate a random alphanumeric session token
fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
