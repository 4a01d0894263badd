// Application state module
// Bundles configuration, the stores, and cached config flags

use std::sync::atomic::AtomicBool;

use crate::config::Config;
use crate::session::SessionStore;
use crate::store::{CredentialStore, DocumentStore, ImageStore};

/// Application state shared across connections
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub documents: DocumentStore,
    pub images: ImageStore,
    pub credentials: CredentialStore,

    // Cached config value for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            sessions: SessionStore::new(),
            documents: DocumentStore::new(&config.storage.data_dir),
            images: ImageStore::new(&config.storage.uploads_dir),
            credentials: CredentialStore::new(&config.storage.credentials_file),
            cached_access_log: AtomicBool::new(config.logging.access_log),
        }
    }
}
