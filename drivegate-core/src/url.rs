//! `dat://` URL parsing
//!
//! A drive URL has the shape `dat://<host>[+<version>]/<path>[?<query>]`,
//! where `<host>` is either a raw content key or a human-readable name.

use std::collections::HashMap;
use std::fmt;

/// The scheme served by the gateway
pub const SCHEME: &str = "dat";

/// Why a URL could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("missing host")]
    MissingHost,
    #[error("invalid host: {0}")]
    InvalidHost(String),
    #[error("invalid percent-encoding in path: {0}")]
    InvalidPath(String),
}

/// Version selector from the `+<version>` host suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    /// Numeric sequence number
    Seq(u64),
    /// Opaque named tag
    Tag(String),
}

impl Version {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(seq) => Version::Seq(seq),
            Err(_) => Version::Tag(raw.to_string()),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Seq(seq) => write!(f, "{}", seq),
            Version::Tag(tag) => f.write_str(tag),
        }
    }
}

/// A parsed drive URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveUrl {
    /// Host as written (lower-cased), without the version suffix
    pub host: String,
    /// Raw version suffix, if any
    pub version: Option<String>,
    /// Path exactly as it appeared in the URL (may be empty)
    pub pathname: String,
    /// Query string including the leading `?`, or empty
    pub search: String,
    /// Decoded query parameters (last value wins)
    pub query: HashMap<String, String>,
    /// Percent-decoded path, `/` when the URL had none
    pub path: String,
    /// Whether the decoded path ends in `/`
    pub has_trailing_slash: bool,
}

impl DriveUrl {
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let input = input.trim();
        let rest = match input.find("://") {
            Some(idx) => {
                let scheme = &input[..idx];
                if !scheme.eq_ignore_ascii_case(SCHEME) {
                    return Err(UrlError::UnsupportedScheme(scheme.to_string()));
                }
                &input[idx + 3..]
            }
            None => input,
        };

        // Fragments never reach the drive
        let rest = rest.split('#').next().unwrap_or_default();

        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, tail) = rest.split_at(authority_end);

        let (host, version) = match authority.split_once('+') {
            Some((host, version)) if !version.is_empty() => (host, Some(version.to_string())),
            Some((host, _)) => (host, None),
            None => (authority, None),
        };

        if host.is_empty() {
            return Err(UrlError::MissingHost);
        }
        if !host.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')) {
            return Err(UrlError::InvalidHost(host.to_string()));
        }

        let (pathname, query_str) = match tail.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (tail, None),
        };

        let decoded = urlencoding::decode(pathname)
            .map_err(|_| UrlError::InvalidPath(pathname.to_string()))?
            .into_owned();
        let path = if decoded.is_empty() { "/".to_string() } else { decoded };
        let has_trailing_slash = path.ends_with('/');

        let search = match query_str {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        };

        Ok(Self {
            host: host.to_ascii_lowercase(),
            version,
            pathname: pathname.to_string(),
            search,
            query: query_str.map(parse_query).unwrap_or_default(),
            path,
            has_trailing_slash,
        })
    }

    /// Parsed version selector, `None` meaning latest
    pub fn version_selector(&self) -> Option<Version> {
        self.version.as_deref().map(Version::parse)
    }

    /// `dat://host[+version]`
    pub fn origin(&self) -> String {
        match &self.version {
            Some(v) => format!("{}://{}+{}", SCHEME, self.host, v),
            None => format!("{}://{}", SCHEME, self.host),
        }
    }

    /// Normalised URL string
    pub fn href(&self) -> String {
        let path = if self.pathname.is_empty() { "/" } else { &self.pathname };
        format!("{}{}{}", self.origin(), path, self.search)
    }

    /// Same URL with a `/` appended to the path, version and query preserved
    pub fn with_trailing_slash(&self) -> String {
        format!("{}{}/{}", self.origin(), self.pathname, self.search)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }
}

impl fmt::Display for DriveUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

fn parse_query(raw: &str) -> HashMap<String, String> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k), decode_component(v))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map(|s| s.into_owned()).unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let url = DriveUrl::parse("dat://Example.com+42/docs/read%20me.md?download_as=zip&x=1")
            .unwrap();
        assert_eq!(url.host, "example.com");
        assert_eq!(url.version.as_deref(), Some("42"));
        assert_eq!(url.version_selector(), Some(Version::Seq(42)));
        assert_eq!(url.pathname, "/docs/read%20me.md");
        assert_eq!(url.path, "/docs/read me.md");
        assert_eq!(url.search, "?download_as=zip&x=1");
        assert_eq!(url.query_param("download_as"), Some("zip"));
        assert!(!url.has_trailing_slash);
    }

    #[test]
    fn test_empty_path_defaults_to_root() {
        let url = DriveUrl::parse("dat://site").unwrap();
        assert_eq!(url.path, "/");
        assert!(url.has_trailing_slash);
        assert_eq!(url.href(), "dat://site/");
    }

    #[test]
    fn test_tag_version() {
        let url = DriveUrl::parse("dat://site+v1.2/").unwrap();
        assert_eq!(url.version_selector(), Some(Version::Tag("v1.2".to_string())));
    }

    #[test]
    fn test_empty_version_suffix_means_latest() {
        let url = DriveUrl::parse("dat://site+/a").unwrap();
        assert_eq!(url.version, None);
    }

    #[test]
    fn test_missing_host_fails() {
        assert_eq!(DriveUrl::parse("dat://"), Err(UrlError::MissingHost));
        assert_eq!(DriveUrl::parse("dat:///path"), Err(UrlError::MissingHost));
        assert_eq!(DriveUrl::parse("dat://+3/path"), Err(UrlError::MissingHost));
    }

    #[test]
    fn test_bad_host_and_scheme_fail() {
        assert!(matches!(DriveUrl::parse("dat://bad host/"), Err(UrlError::InvalidHost(_))));
        assert!(matches!(
            DriveUrl::parse("https://example.com/"),
            Err(UrlError::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_trailing_slash_redirect_target() {
        let url = DriveUrl::parse("dat://site+3/dir?q=1").unwrap();
        assert_eq!(url.with_trailing_slash(), "dat://site+3/dir/?q=1");
        let bare = DriveUrl::parse("dat://site/dir").unwrap();
        assert_eq!(bare.with_trailing_slash(), "dat://site/dir/");
    }

    #[test]
    fn test_query_decoding() {
        let url = DriveUrl::parse("dat://site/?name=hello+world&path=%2Fa").unwrap();
        assert_eq!(url.query_param("name"), Some("hello world"));
        assert_eq!(url.query_param("path"), Some("/a"));
    }

    #[test]
    fn test_fragment_is_dropped() {
        let url = DriveUrl::parse("dat://site/page.html#top").unwrap();
        assert_eq!(url.path, "/page.html");
        assert!(url.search.is_empty());
    }
}
