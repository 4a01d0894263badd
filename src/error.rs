//! Store error types
//!
//! Failures from the filesystem-backed stores and the credential file.
//! Handlers map these to a 500 page and the error log.

use thiserror::Error;

/// Errors surfaced by the document, image, and credential stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential file error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("password hash error: {0}")]
    PasswordHash(String),
}
