//! Document store module
//!
//! Flat-file documents in a single directory. The file extension selects
//! the render mode; duplication appends a `_copy_N` suffix to the stem.

use crate::error::StoreError;
use std::path::{Path, PathBuf};
use tokio::fs;

/// How a document is served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Raw bytes as `text/plain`
    PlainText,
    /// Rendered to HTML
    Markdown,
}

impl RenderMode {
    /// Render mode for a document name. Anything that is not `.md` is
    /// served as plain text.
    pub fn from_name(name: &str) -> Self {
        match Path::new(name).extension().and_then(|e| e.to_str()) {
            Some("md") => Self::Markdown,
            _ => Self::PlainText,
        }
    }
}

/// Check that a name is a single path segment
///
/// Rejects empty names, path separators, and dot traversal. Names failing
/// this check are treated as not-found rather than resolved.
pub fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Store over one directory of flat document files
pub struct DocumentStore {
    data_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve a document name to its path, gated on name validity
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if valid_name(name) {
            Some(self.data_dir.join(name))
        } else {
            None
        }
    }

    /// List document names, sorted
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Read a document's content; `None` when it does not exist
    pub async fn read(&self, name: &str) -> Result<Option<String>, StoreError> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
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

    /// Create an empty document
    pub async fn create(&self, name: &str) -> Result<(), StoreError> {
        self.write(name, "").await
    }

    /// Write a document's content, creating it if missing
    pub async fn write(&self, name: &str, content: &str) -> Result<(), StoreError> {
        let path = self.resolve(name).ok_or_else(invalid_name_error)?;
        fs::write(&path, content).await?;
        Ok(())
    }

    /// Append a fragment to a document; `Ok(false)` when it does not exist
    pub async fn append(&self, name: &str, fragment: &str) -> Result<bool, StoreError> {
        let Some(content) = self.read(name).await? else {
            return Ok(false);
        };
        self.write(name, &format!("{content}{fragment}")).await?;
        Ok(true)
    }

    /// Delete a document; `Ok(false)` when it does not exist
    pub async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let Some(path) = self.resolve(name) else {
            return Ok(false);
        };
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Duplicate a document as `{base}_copy_{N}{ext}` and return the new name
    ///
    /// `N` is one past the highest existing copy number for the same base
    /// stem; duplicating a copy numbers from the original's base. Returns
    /// `Ok(None)` when the source does not exist.
    pub async fn duplicate(&self, name: &str) -> Result<Option<String>, StoreError> {
        let Some(path) = self.resolve(name) else {
            return Ok(None);
        };
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let base = copy_base(&stem);

        let mut next = 1;
        for entry in self.list().await? {
            let entry_stem = Path::new(&entry)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if let Some(n) = copy_number(&entry_stem, base) {
                next = next.max(n + 1);
            }
        }

        let new_name = format!("{base}_copy_{next}{ext}");
        fs::copy(&path, self.data_dir.join(&new_name)).await?;
        Ok(Some(new_name))
    }
}

/// Strip a trailing `_copy_N` suffix from a document stem
fn copy_base(stem: &str) -> &str {
    if let Some(idx) = stem.rfind("_copy_") {
        let digits = &stem[idx + "_copy_".len()..];
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return &stem[..idx];
        }
    }
    stem
}

/// Copy number of a stem relative to a base, e.g. `changes_copy_2` → 2
fn copy_number(stem: &str, base: &str) -> Option<u32> {
    stem.strip_prefix(base)?.strip_prefix("_copy_")?.parse().ok()
}

fn invalid_name_error() -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "invalid document name",
    ))
}
