//! Content-type detection
//!
//! Drives are not required to use conventional file names, so the type of
//! a file is decided from its leading bytes first and its name second.

/// Does the `Accept` header ask for an HTML document?
pub fn accept_wants_html(accept: Option<&str>) -> bool {
    accept
        .unwrap_or("")
        .split(',')
        .map(|part| part.split(';').next().unwrap_or("").trim())
        .any(|media| media.eq_ignore_ascii_case("text/html"))
}

/// Is this an HTML-family type that a browser would execute?
pub fn is_html_type(mime: &str) -> bool {
    mime.to_ascii_lowercase().contains("html")
}

/// Leading-byte signatures, checked in order
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"PK\x05\x06", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
    (b"\0asm", "application/wasm"),
    (b"ID3", "audio/mpeg"),
    (b"OggS", "audio/ogg"),
    (b"fLaC", "audio/flac"),
    (b"\x1aE\xdf\xa3", "video/webm"),
    (b"wOFF", "font/woff"),
    (b"wOF2", "font/woff2"),
];

/// Textual markers that identify markup regardless of the file name
const MARKUP_MARKERS: &[(&str, &str)] = &[
    ("<!doctype html", "text/html"),
    ("<html", "text/html"),
    ("<head", "text/html"),
    ("<body", "text/html"),
    ("<script", "text/html"),
    ("<svg", "image/svg+xml"),
    ("<?xml", "text/xml"),
];

/// Identify a file from its first bytes and its path
pub fn sniff(prefix: &[u8], path: &str) -> String {
    if let Some(mime) = sniff_binary(prefix) {
        return mime.to_string();
    }
    let guessed = mime_guess::from_path(path).first();
    if let Some(mime) = sniff_markup(prefix) {
        // An .svg or .xhtml name is more specific than a generic marker
        let specific = guessed
            .as_ref()
            .map(|g| g.essence_str().contains(mime.trim_start_matches("text/")))
            .unwrap_or(false);
        let chosen = match (&guessed, specific) {
            (Some(g), true) => g.essence_str().to_string(),
            _ => mime.to_string(),
        };
        return with_charset(chosen);
    }
    if let Some(g) = guessed {
        return with_charset(g.essence_str().to_string());
    }
    if looks_like_text(prefix) {
        with_charset("text/plain".to_string())
    } else {
        "application/octet-stream".to_string()
    }
}

fn sniff_binary(prefix: &[u8]) -> Option<&'static str> {
    if prefix.len() >= 12 && &prefix[0..4] == b"RIFF" && &prefix[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if prefix.len() >= 12 && &prefix[4..8] == b"ftyp" {
        return Some("video/mp4");
    }
    SIGNATURES
        .iter()
        .find(|(magic, _)| prefix.starts_with(magic))
        .map(|(_, mime)| *mime)
}

fn sniff_markup(prefix: &[u8]) -> Option<&'static str> {
    let text = String::from_utf8_lossy(prefix);
    let head = text.trim_start_matches('\u{feff}').trim_start().to_ascii_lowercase();
    MARKUP_MARKERS
        .iter()
        .find(|(marker, _)| head.starts_with(marker))
        .map(|(_, mime)| *mime)
}

/// Text unless the prefix carries NULs or mostly control bytes
fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.contains(&0) {
        return false;
    }
    // A multi-byte sequence may be cut at the end of the prefix
    let valid = match std::str::from_utf8(prefix) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none(),
    };
    if !valid {
        return false;
    }
    let control = prefix
        .iter()
        .filter(|&&b| b.is_ascii_control() && !matches!(b, b'\n' | b'\r' | b'\t' | 0x0c))
        .count();
    control * 10 <= prefix.len()
}

fn with_charset(mime: String) -> String {
    if mime.starts_with("text/") && !mime.contains("charset") {
        format!("{}; charset=utf-8", mime)
    } else {
        mime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_wants_html() {
        assert!(accept_wants_html(Some("text/html,application/xhtml+xml,*/*;q=0.8")));
        assert!(accept_wants_html(Some("TEXT/HTML;q=0.9")));
        assert!(!accept_wants_html(Some("*/*")));
        assert!(!accept_wants_html(Some("application/json")));
        assert!(!accept_wants_html(None));
    }

    #[test]
    fn test_magic_beats_extension() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n....", "/photo.txt"), "image/png");
        assert_eq!(sniff(b"%PDF-1.7", "/no-extension"), "application/pdf");
    }

    #[test]
    fn test_html_detected_without_extension() {
        assert_eq!(
            sniff(b"  <!DOCTYPE html><html><body>hi", "/page"),
            "text/html; charset=utf-8"
        );
        assert_eq!(sniff(b"<svg xmlns='x'></svg>", "/logo"), "image/svg+xml");
    }

    #[test]
    fn test_extension_used_for_plain_content() {
        assert_eq!(sniff(b"body { color: red }", "/style.css"), "text/css; charset=utf-8");
        assert_eq!(sniff(b"{\"a\":1}", "/data.json"), "application/json");
    }

    #[test]
    fn test_text_binary_fallback() {
        assert_eq!(sniff(b"just some words", "/README"), "text/plain; charset=utf-8");
        assert_eq!(sniff(b"\x00\x01\x02\x03", "/blob"), "application/octet-stream");
    }

    #[test]
    fn test_cut_multibyte_sequence_is_still_text() {
        let snowman = "☃☃".as_bytes();
        assert_eq!(sniff(&snowman[..4], "/notes"), "text/plain; charset=utf-8");
    }

    #[test]
    fn test_is_html_type() {
        assert!(is_html_type("text/html; charset=utf-8"));
        assert!(is_html_type("application/xhtml+xml"));
        assert!(!is_html_type("text/plain"));
    }
}
