//! Credential store module
//!
//! One YAML mapping of `username -> argon2 hash`, rewritten on every
//! signup. Hashing and verification go through the `argon2` crate's
//! password-hash API; the PHC string embeds the per-user salt.

use crate::error::StoreError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Minimum username length after trimming
pub const MIN_USERNAME_LEN: usize = 4;
/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Store over the credential YAML file
pub struct CredentialStore {
    path: PathBuf,
    // Serializes signup read-modify-write cycles
    write_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the credential mapping; a missing file is an empty mapping
    pub async fn load(&self) -> Result<HashMap<String, String>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Check a username/password pair against the stored hash
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        let users = self.load().await?;
        Ok(users
            .get(username)
            .is_some_and(|hash| verify_password(password, hash)))
    }

    /// Register a new user and persist the mapping
    ///
    /// Validation is the caller's job (`signup_error`); this re-checks
    /// only uniqueness under the write lock.
    pub async fn signup(&self, username: &str, password: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut users = self.load().await?;
        if users.contains_key(username) {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "username is taken",
            )));
        }
        users.insert(username.to_string(), hash_password(password)?);

        let serialized = serde_yaml::to_string(&users)?;
        fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

/// Validation error for a signup attempt, password rules first
pub fn signup_error(
    users: &HashMap<String, String>,
    username: &str,
    password: &str,
    verify_password: &str,
) -> Option<&'static str> {
    error_for_passwords(password, verify_password).or_else(|| error_for_username(users, username))
}

fn error_for_passwords(password: &str, verify: &str) -> Option<&'static str> {
    if password != verify {
        Some("Passwords do not match -- Please try again.")
    } else if password.len() < MIN_PASSWORD_LEN {
        Some("Password must be at least 6 characters.")
    } else if password.contains(' ') {
        Some("Please provide a password with no spaces.")
    } else {
        None
    }
}

fn error_for_username(users: &HashMap<String, String>, username: &str) -> Option<&'static str> {
    if username.trim().len() < MIN_USERNAME_LEN || username.contains(' ') {
        Some("Username must be at least 4 characters (no spaces)")
    } else if users.contains_key(username) {
        Some("Username is taken -- Please choose another.")
    } else {
        None
    }
}

/// Hash a password with a fresh random salt
fn hash_password(password: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored PHC hash string
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}
