//! File serving
//!
//! Streamed files are held back until enough leading bytes have arrived to
//! sniff their type; only then are the headers committed.

use super::compose::{empty, full, inline, streamed, HeaderDraft, RespBody};
use super::range::ByteRange;
use crate::archive::{CheckoutFs, Entry};
use crate::content::{is_html_type, markdown, sniff};
use crate::error::GatewayError;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use hyper::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_LENGTH, CONTENT_SECURITY_POLICY, CONTENT_TYPE,
};
use hyper::{Response, StatusCode};
use std::sync::Arc;

/// Per-request inputs to serving one entry
pub struct ServeParams<'a> {
    pub draft: HeaderDraft,
    pub csp: &'a str,
    pub can_execute_html: bool,
    pub head: bool,
    pub sniff_bytes: usize,
}

/// Serve a markdown file, rendered when the drive may run HTML and as
/// plain text otherwise
pub async fn serve_markdown(
    view: &dyn CheckoutFs,
    entry: &Entry,
    params: ServeParams<'_>,
) -> Result<Response<RespBody>, GatewayError> {
    let raw = view.read_file(&entry.path).await.map_err(|err| {
        log::warn!(target: "drivegate::serve", "error reading {}: {}", entry.path, err);
        GatewayError::StreamRead(std::io::Error::other(err))
    })?;

    let mut draft = params.draft;
    draft.remove(&CONTENT_LENGTH);
    if params.can_execute_html {
        let source = String::from_utf8_lossy(&raw);
        Ok(inline(draft, "text/html", markdown::render_document(&source)))
    } else {
        Ok(inline(draft, "text/plain", raw))
    }
}

/// Stream a file, sniffing its type before the headers go out
pub async fn serve_stream(
    view: Arc<dyn CheckoutFs>,
    entry: &Entry,
    range: Option<ByteRange>,
    params: ServeParams<'_>,
) -> Result<Response<RespBody>, GatewayError> {
    let mut stream = view.create_read_stream(&entry.path, range);

    let mut prefix = BytesMut::new();
    let mut exhausted = false;
    while prefix.len() < params.sniff_bytes {
        match stream.next().await {
            Some(Ok(chunk)) => prefix.extend_from_slice(&chunk),
            Some(Err(err)) => {
                log::warn!(target: "drivegate::serve", "error reading {}: {}", entry.path, err);
                return Err(GatewayError::StreamRead(err));
            }
            None => {
                exhausted = true;
                break;
            }
        }
    }

    if exhausted && prefix.is_empty() {
        return Ok(empty_file(params.csp));
    }

    let window = prefix.len().min(params.sniff_bytes);
    let mut mime = sniff(&prefix[..window], &entry.path);
    if !params.can_execute_html && is_html_type(&mime) {
        mime = "text/plain".to_string();
    }

    let mut draft = params.draft;
    draft.set(CONTENT_TYPE, &mime);

    if params.head {
        drop(stream);
        draft.set_status(StatusCode::NO_CONTENT);
        draft.remove(&CONTENT_LENGTH);
        return Ok(draft.commit(empty()));
    }

    let head = futures::stream::once(futures::future::ready(Ok::<Bytes, std::io::Error>(
        prefix.freeze(),
    )));
    let path = entry.path.clone();
    let rest = stream.inspect_err(move |err| {
        log::warn!(target: "drivegate::serve", "error reading {} after headers: {}", path, err);
    });
    let body = if exhausted { head.boxed() } else { head.chain(rest).boxed() };
    Ok(draft.commit(streamed(body)))
}

/// Bare 200 for a zero-length file
fn empty_file(csp: &str) -> Response<RespBody> {
    let mut draft = HeaderDraft::new(StatusCode::OK);
    draft.set(CONTENT_SECURITY_POLICY, csp).set(ACCESS_CONTROL_ALLOW_ORIGIN, "*");
    draft.commit(full(Bytes::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveStore, ByteStream, MemoryStore, StoreError};
    use crate::gateway::range::RangePlan;
    use crate::key::ContentKey;
    use async_trait::async_trait;
    use http_body_util::BodyExt;

    async fn view(files: &[(&str, &[u8])], chunk: usize) -> Arc<dyn CheckoutFs> {
        let store = MemoryStore::new().with_chunk_size(chunk);
        let key = ContentKey::derive("serve");
        store.publish(key, files.iter().map(|(p, c)| (p.to_string(), Bytes::copy_from_slice(c))));
        store.load_archive(key).await.unwrap().checkout(None).await.unwrap()
    }

    fn params(size: u64, can_execute_html: bool, head: bool) -> ServeParams<'static> {
        ServeParams {
            draft: HeaderDraft::for_range(&RangePlan::for_entry(size, None)).with_policy("csp"),
            csp: "csp",
            can_execute_html,
            head,
            sniff_bytes: 512,
        }
    }

    #[tokio::test]
    async fn test_streams_whole_file_across_chunks() {
        let content = vec![b'a'; 2000];
        let v = view(&[("/a.txt", &content[..])], 100).await;
        let entry = Entry::file("/a.txt", 2000);
        let response = serve_stream(v, &entry, None, params(2000, true, false)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.len(), 2000);
    }

    #[tokio::test]
    async fn test_ranged_stream() {
        let v = view(&[("/n.txt", &b"0123456789"[..])], 4).await;
        let entry = Entry::file("/n.txt", 10);
        let range = ByteRange { start: 2, end: 5 };
        let response = serve_stream(v, &entry, Some(range), params(10, true, false)).await.unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"2345");
    }

    #[tokio::test]
    async fn test_html_is_downgraded_when_not_executable() {
        let v = view(&[("/page", &b"<!doctype html><script>x</script>"[..])], 64).await;
        let entry = Entry::file("/page", 34);
        let response = serve_stream(v.clone(), &entry, None, params(34, false, false)).await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");

        let response = serve_stream(v, &entry, None, params(34, true, false)).await.unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn test_head_is_no_content() {
        let v = view(&[("/img.png", &b"\x89PNG\r\n\x1a\nrest"[..])], 64).await;
        let entry = Entry::file("/img.png", 12);
        let response = serve_stream(v, &entry, None, params(12, true, true)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
        assert!(response.into_body().collect().await.unwrap().to_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_empty_file() {
        let v = view(&[("/empty", &b""[..])], 64).await;
        let entry = Entry::file("/empty", 0);
        let response = serve_stream(v, &entry, None, params(0, true, false)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    struct Broken;

    #[async_trait]
    impl CheckoutFs for Broken {
        fn version(&self) -> u64 {
            1
        }
        async fn stat(&self, _: &str) -> Result<Option<Entry>, StoreError> {
            Ok(None)
        }
        async fn read_dir(&self, _: &str) -> Result<Vec<Entry>, StoreError> {
            Ok(Vec::new())
        }
        async fn read_file(&self, path: &str) -> Result<Bytes, StoreError> {
            Err(StoreError::NoSuchFile(path.to_string()))
        }
        fn create_read_stream(&self, _: &str, _: Option<ByteRange>) -> ByteStream {
            futures::stream::iter(vec![
                Ok(Bytes::from_static(b"partial")),
                Err(std::io::Error::other("disk gone")),
            ])
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_read_error_before_headers() {
        let entry = Entry::file("/x", 100);
        let err = serve_stream(Arc::new(Broken), &entry, None, params(100, true, false))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_read_error_after_headers_fails_body() {
        let entry = Entry::file("/x", 100);
        let mut p = params(100, true, false);
        p.sniff_bytes = 4;
        let response = serve_stream(Arc::new(Broken), &entry, None, p).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.into_body().collect().await.is_err());
    }

    #[tokio::test]
    async fn test_markdown_modes() {
        let v = view(&[("/r.md", &b"# Title"[..])], 64).await;
        let entry = Entry::file("/r.md", 7);

        let rendered = serve_markdown(v.as_ref(), &entry, params(7, true, false)).await.unwrap();
        assert_eq!(rendered.headers()[CONTENT_TYPE], "text/html");
        let body = rendered.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&body).contains("<h1 id=\"title\">Title</h1>"));

        let plain = serve_markdown(v.as_ref(), &entry, params(7, false, false)).await.unwrap();
        assert_eq!(plain.headers()[CONTENT_TYPE], "text/plain");
        let body = plain.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"# Title");
    }
}
