//! Image store module
//!
//! Uploaded images in their own directory, gated by an extension
//! allow-list.

use crate::error::StoreError;
use crate::store::documents::valid_name;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Accepted image file extensions (lowercase, without the dot)
pub const IMAGE_FILE_EXTENSIONS: [&str; 4] = ["jpeg", "png", "gif", "jpg"];

/// Whether a file name carries an allow-listed image extension
pub fn is_image(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            IMAGE_FILE_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Store over the uploads directory
pub struct ImageStore {
    uploads_dir: PathBuf,
}

impl ImageStore {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.uploads_dir
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if valid_name(name) {
            Some(self.uploads_dir.join(name))
        } else {
            None
        }
    }

    /// List uploaded image names, sorted
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.uploads_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Save an uploaded image under its (already validated) name
    pub async fn save(&self, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.resolve(name).ok_or_else(|| {
            StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "invalid image name",
            ))
        })?;
        fs::write(&path, data).await?;
        Ok(())
    }

    /// Read an image's bytes; `None` when it does not exist
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.resolve(name) {
            Some(path) => fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }
}
