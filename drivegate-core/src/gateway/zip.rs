//! `?download_as=zip` export
//!
//! The archive is produced incrementally: the zip writer spills into a
//! shared buffer which is drained into the response body after each entry.

use super::compose::{empty, streamed, HeaderDraft, RespBody};
use super::manifest::Manifest;
use crate::archive::{normalize_path, ByteStream, CheckoutFs};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use hyper::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_DISPOSITION, CONTENT_SECURITY_POLICY, CONTENT_TYPE,
};
use hyper::{Response, StatusCode};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Query value selecting the zip export
pub const ZIP_QUERY_VALUE: &str = "zip";

/// Attachment name: slug of the manifest title, or `fallback`
pub fn zip_filename(manifest: Option<&Manifest>, fallback: &str) -> String {
    let slug = manifest
        .and_then(|m| m.title.as_deref())
        .map(slug::slugify)
        .unwrap_or_default();
    let stem = if slug.is_empty() { fallback } else { slug.as_str() };
    format!("{}.zip", stem)
}

/// Respond with the zip export of `root`; headers only for HEAD
pub fn zip_response(
    view: Arc<dyn CheckoutFs>,
    root: &str,
    manifest: Option<&Manifest>,
    csp: &str,
    fallback_name: &str,
    head: bool,
) -> Response<RespBody> {
    let status = if head { StatusCode::NO_CONTENT } else { StatusCode::OK };
    let mut draft = HeaderDraft::new(status);
    draft
        .set(CONTENT_TYPE, "application/zip")
        .set(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", zip_filename(manifest, fallback_name)),
        )
        .set(CONTENT_SECURITY_POLICY, csp)
        .set(ACCESS_CONTROL_ALLOW_ORIGIN, "*");

    if head {
        return draft.commit(empty());
    }

    let root_path = normalize_path(root);
    let body = zip_stream(view, root_path.clone()).inspect_err(move |err| {
        log::error!(target: "drivegate::zip", "error while producing zip of {}: {}", root_path, err);
    });
    draft.commit(streamed(body.boxed()))
}

/// Writer target that collects output until it is drained
#[derive(Clone, Default)]
struct SpillBuffer(Arc<Mutex<Vec<u8>>>);

impl SpillBuffer {
    fn drain(&self) -> Bytes {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        Bytes::from(std::mem::take(&mut *buf))
    }
}

impl Write for SpillBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Entry name of `path` inside an archive rooted at `root`
fn relative_name(root: &str, path: &str) -> String {
    let prefix = if root == "/" { "/".to_string() } else { format!("{}/", root) };
    path.strip_prefix(&prefix).unwrap_or(path.trim_start_matches('/')).to_string()
}

/// Zip every file under `root`, directories included
pub fn zip_stream(view: Arc<dyn CheckoutFs>, root: String) -> ByteStream {
    let stream = async_stream::try_stream! {
        let spill = SpillBuffer::default();
        let mut writer = ZipWriter::new_stream(spill.clone());
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let root_entry = view.stat(&root).await.map_err(io::Error::other)?;
        let mut pending = Vec::new();
        match root_entry {
            Some(entry) if entry.is_file() => {
                let content = view.read_file(&entry.path).await.map_err(io::Error::other)?;
                writer.start_file(entry.name().to_string(), options).map_err(io::Error::other)?;
                writer.write_all(&content)?;
            }
            Some(_) => pending.push(root.clone()),
            None => {
                let err = io::Error::new(io::ErrorKind::NotFound, format!("no such path: {}", root));
                Err::<(), io::Error>(err)?;
            }
        }

        while let Some(dir) = pending.pop() {
            for entry in view.read_dir(&dir).await.map_err(io::Error::other)? {
                let name = relative_name(&root, &entry.path);
                if entry.is_directory() {
                    writer.add_directory(format!("{}/", name), options).map_err(io::Error::other)?;
                    pending.push(entry.path);
                } else {
                    let content = view.read_file(&entry.path).await.map_err(io::Error::other)?;
                    writer.start_file(name, options).map_err(io::Error::other)?;
                    writer.write_all(&content)?;
                }
                let chunk = spill.drain();
                if !chunk.is_empty() {
                    yield chunk;
                }
            }
        }

        writer.finish().map_err(io::Error::other)?;
        let chunk = spill.drain();
        if !chunk.is_empty() {
            yield chunk;
        }
    };
    stream.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveStore, MemoryStore};
    use crate::key::ContentKey;
    use http_body_util::BodyExt;

    async fn view() -> Arc<dyn CheckoutFs> {
        let store = MemoryStore::new();
        let key = ContentKey::derive("zip");
        store.publish(
            key,
            [("/index.html", "<h1>hi</h1>"), ("/docs/a.md", "# a"), ("/docs/deep/b.txt", "b")]
                .into_iter()
                .map(|(p, c)| (p.to_string(), Bytes::from(c))),
        );
        store.load_archive(key).await.unwrap().checkout(None).await.unwrap()
    }

    #[test]
    fn test_filename() {
        let m = Manifest { title: Some("My Great Site!".into()), ..Default::default() };
        assert_eq!(zip_filename(Some(&m), "archive"), "my-great-site.zip");
        assert_eq!(zip_filename(None, "archive"), "archive.zip");
        let blank = Manifest { title: Some("  ".into()), ..Default::default() };
        assert_eq!(zip_filename(Some(&blank), "archive"), "archive.zip");
    }

    #[test]
    fn test_relative_name() {
        assert_eq!(relative_name("/", "/docs/a.md"), "docs/a.md");
        assert_eq!(relative_name("/docs", "/docs/deep/b.txt"), "deep/b.txt");
    }

    #[tokio::test]
    async fn test_zip_contains_subtree() {
        let bytes = zip_stream(view().await, "/docs".into())
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));

        let archive = zip::ZipArchive::new(io::Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["a.md", "deep/", "deep/b.txt"]);
    }

    #[tokio::test]
    async fn test_head_has_headers_only() {
        let response = zip_response(view().await, "/", None, "csp", "archive", true);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/zip");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"archive.zip\""
        );
        assert!(response.into_body().collect().await.unwrap().to_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_get_streams_archive() {
        let response = zip_response(view().await, "/", None, "csp", "archive", false);
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.len() > 22);
    }

    #[tokio::test]
    async fn test_missing_root_fails_stream() {
        let result = zip_stream(view().await, "/nope".into()).try_collect::<Vec<_>>().await;
        assert!(result.is_err());
    }
}
