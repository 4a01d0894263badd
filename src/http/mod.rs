//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! page handlers: response builders, cookie and form parsing, MIME lookup,
//! and cache revalidation.

pub mod cache;
pub mod cookie;
pub mod form;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_304_response, build_404_response, build_405_response, build_413_response,
    build_500_response, build_html_response, build_image_response, build_redirect_response,
    build_text_response,
};
