//! Content helpers: type sniffing, markdown rendering and error documents

pub mod error_page;
pub mod markdown;
pub mod mime;

pub use error_page::ErrorPage;
pub use mime::{accept_wants_html, is_html_type, sniff};
