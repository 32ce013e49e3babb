//! Utility functions for common operations.
//!
//! - **URL validation**: http(s)-only parsing, plus an SSRF guard for feed
//!   endpoints loaded from catalog files
//! - **Text processing**: HTML-to-text, control-character stripping and
//!   character-safe truncation

mod text;
mod url_validator;

pub use text::{collapse_whitespace, strip_control_chars, strip_html, truncate_chars};
pub use url_validator::{parse_http_url, validate_feed_url, UrlValidationError};
