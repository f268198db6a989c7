//! HTTP protocol layer module
//!
//! MIME inference and response builders, decoupled from the file-serving
//! business logic.

pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_405_response, build_file_response, build_html_response,
    build_redirect_response,
};
