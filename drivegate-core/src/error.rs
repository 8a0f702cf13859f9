//! Gateway error taxonomy
//!
//! Every failure the request pipeline can surface maps to exactly one
//! variant here. Each variant knows the status code it is reported with and
//! what the themed error page should say about it.

use crate::archive::StoreError;
use crate::content::error_page::ErrorPage;
use crate::dns::ResolveError;
use crate::key::ContentKey;
use crate::url::UrlError;
use hyper::{Method, StatusCode};
use std::fmt;

/// Which thing the deadline expired while looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutResource {
    /// The drive was found but the file was not produced in time
    Page,
    /// The drive itself was never found
    Site,
}

impl fmt::Display for TimeoutResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutResource::Page => f.write_str("page"),
            TimeoutResource::Site => f.write_str("site"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{url} is an invalid dat:// URL: {reason}")]
    InvalidUrl { url: String, reason: UrlError },

    #[error("method not supported: {0}")]
    MethodNotSupported(Method),

    #[error("no DNS record found for {host}: {source}")]
    NameResolutionFailed {
        host: String,
        #[source]
        source: ResolveError,
    },

    #[error("failed to open drive {key}: {source}")]
    ArchiveLoadFailed {
        key: ContentKey,
        #[source]
        source: StoreError,
    },

    #[error("failed to check out drive {key}: {source}")]
    CheckoutFailed {
        key: ContentKey,
        #[source]
        source: StoreError,
    },

    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("timed out searching for {0}")]
    Timeout(TimeoutResource),

    #[error("failed to read file: {0}")]
    StreamRead(#[source] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidUrl { .. } => StatusCode::NOT_FOUND,
            GatewayError::MethodNotSupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::NameResolutionFailed { .. } => StatusCode::NOT_FOUND,
            GatewayError::ArchiveLoadFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::CheckoutFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::StreamRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short status text shown when no richer description exists
    pub fn status_text(&self) -> String {
        match self {
            GatewayError::InvalidUrl { .. } => "Archive Not Found".to_string(),
            GatewayError::MethodNotSupported(_) => "Method Not Supported".to_string(),
            GatewayError::NameResolutionFailed { host, .. } => {
                format!("No DNS record found for {}", host)
            }
            GatewayError::ArchiveLoadFailed { .. }
            | GatewayError::CheckoutFailed { .. }
            | GatewayError::Internal(_) => {
                "Failed".to_string()
            }
            GatewayError::NotFound { .. } => "File Not Found".to_string(),
            GatewayError::Timeout(resource) => format!("Timed out searching for {}", resource),
            GatewayError::StreamRead(_) => "Failed to read file".to_string(),
        }
    }

    /// Error page content for clients that asked for HTML
    pub fn page(&self, request_url: &str) -> ErrorPage {
        let page = ErrorPage::new(self.status(), self.status_text(), request_url);
        match self {
            GatewayError::InvalidUrl { url, .. } => page
                .title("Archive Not Found")
                .description("Invalid URL")
                .info(format!("{} is an invalid dat:// URL", url)),
            GatewayError::NameResolutionFailed { host, .. } => page
                .description("No DNS record found")
                .info(format!("No DNS record found for dat://{}", host)),
            GatewayError::NotFound { path } => page
                .title("File Not Found")
                .description("File Not Found")
                .info(format!("Could not find the file {}", path)),
            GatewayError::Timeout(resource) => page.resource(resource.to_string()),
            _ => page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::MethodNotSupported(Method::POST).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            GatewayError::Timeout(TimeoutResource::Site).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            GatewayError::NotFound { path: "/x".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_timeout_text_names_resource() {
        assert_eq!(
            GatewayError::Timeout(TimeoutResource::Page).status_text(),
            "Timed out searching for page"
        );
        assert_eq!(
            GatewayError::Timeout(TimeoutResource::Site).status_text(),
            "Timed out searching for site"
        );
    }

    #[test]
    fn test_dns_text_names_host() {
        let err = GatewayError::NameResolutionFailed {
            host: "example.com".into(),
            source: ResolveError::NotFound("example.com".into()),
        };
        assert_eq!(err.status_text(), "No DNS record found for example.com");
        let page = err.page("dat://example.com/");
        assert_eq!(page.info.as_deref(), Some("No DNS record found for dat://example.com"));
    }
}
