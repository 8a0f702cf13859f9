//! HTTP front end
//!
//! Exposes the gateway over plain HTTP: `GET /<host>[+<version>]/<path>`
//! is served as `dat://<host>[+<version>]/<path>`.

pub mod server;

pub use server::GatewayServer;

use crate::url::SCHEME;
use http::Uri;

/// Drive URL addressed by an HTTP request target
pub fn drive_url_for(uri: &Uri) -> String {
    let path = uri.path().trim_start_matches('/');
    match uri.query() {
        Some(query) => format!("{}://{}?{}", SCHEME, path, query),
        None => format!("{}://{}", SCHEME, path),
    }
}

/// Rewrite a `dat://` redirect target into a gateway-relative path. Other
/// locations pass through unchanged.
pub fn rewrite_location(location: &str) -> String {
    let prefix = format!("{}://", SCHEME);
    match location.strip_prefix(&prefix) {
        Some(rest) => format!("/{}", rest),
        None => location.to_string(),
    }
}

/// Log one access line for a finished request
pub fn log_access(
    remote: Option<std::net::SocketAddr>,
    method: &str,
    path: &str,
    status: u16,
    len: Option<&str>,
    start: std::time::Instant,
) {
    let line = serde_json::json!({
        "remote": remote.map(|r| r.ip().to_string()).unwrap_or_else(|| "-".into()),
        "method": method,
        "path": path,
        "status": status,
        "len": len.unwrap_or("-"),
        "dur_ms": start.elapsed().as_millis() as u64,
    });
    log::info!(target: "drivegate::http", "{}", line);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_url_for() {
        let uri: Uri = "/blog.example+3/posts/a.md?x=1".parse().unwrap();
        assert_eq!(drive_url_for(&uri), "dat://blog.example+3/posts/a.md?x=1");
        let uri: Uri = "/blog.example".parse().unwrap();
        assert_eq!(drive_url_for(&uri), "dat://blog.example");
        let uri: Uri = "/".parse().unwrap();
        assert_eq!(drive_url_for(&uri), "dat://");
    }

    #[test]
    fn test_rewrite_location() {
        assert_eq!(rewrite_location("dat://blog.example/docs/"), "/blog.example/docs/");
        assert_eq!(rewrite_location("https://elsewhere/"), "https://elsewhere/");
    }
}
