//! Storage layer module
//!
//! Filesystem-backed stores: documents, uploaded images, and the YAML
//! credential file. No state beyond the directories themselves.

pub mod credentials;
pub mod documents;
pub mod images;

pub use credentials::CredentialStore;
pub use documents::{DocumentStore, RenderMode};
pub use images::ImageStore;
