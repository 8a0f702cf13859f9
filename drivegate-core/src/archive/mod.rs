//! Drive storage boundary
//!
//! The replication engine that actually fetches drive bytes lives behind
//! these traits. The gateway only ever acquires a session for a key, checks
//! out a version, and reads from the resulting read-only view.

pub mod memory;
pub mod session;

pub use memory::{MemoryCheckout, MemoryDrive, MemoryStore};
pub use session::SessionCache;

use crate::gateway::manifest::{Manifest, MANIFEST_PATH};
use crate::gateway::range::ByteRange;
use crate::key::ContentKey;
use crate::url::Version;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Byte stream read out of a checkout
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("drive {0} not found")]
    DriveNotFound(ContentKey),
    #[error("version {0} not found")]
    UnknownVersion(String),
    #[error("no such file: {0}")]
    NoSuchFile(String),
    #[error("{0} is a directory")]
    IsDirectory(String),
    #[error("malformed manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A resolved filesystem node inside a checkout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: String,
    pub size: u64,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self { path: path.into(), size, kind: EntryKind::File }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self { path: path.into(), size: 0, kind: EntryKind::Directory }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Last path segment
    pub fn name(&self) -> &str {
        self.path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
    }
}

/// Read-only view of a drive pinned at one version
#[async_trait]
pub trait CheckoutFs: Send + Sync {
    /// Version this view is pinned to
    fn version(&self) -> u64;

    async fn stat(&self, path: &str) -> Result<Option<Entry>, StoreError>;

    /// Direct children of a directory, sorted by path
    async fn read_dir(&self, path: &str) -> Result<Vec<Entry>, StoreError>;

    async fn read_file(&self, path: &str) -> Result<Bytes, StoreError>;

    /// Stream a file, optionally limited to an inclusive byte range.
    /// Failures surface as stream items.
    fn create_read_stream(&self, path: &str, range: Option<ByteRange>) -> ByteStream;

    async fn read_manifest(&self) -> Result<Manifest, StoreError> {
        let raw = self.read_file(MANIFEST_PATH).await?;
        Ok(Manifest::from_json(&raw)?)
    }
}

/// Live handle on one drive, shared by every request for its key
#[async_trait]
pub trait ArchiveSession: Send + Sync {
    fn key(&self) -> ContentKey;

    /// Check out `version`, or the latest version when `None`
    async fn checkout(&self, version: Option<&Version>) -> Result<Arc<dyn CheckoutFs>, StoreError>;
}

/// Opens drive sessions
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    async fn load_archive(&self, key: ContentKey) -> Result<Arc<dyn ArchiveSession>, StoreError>;
}

/// Normalise a drive path: leading `/`, no trailing `/` except for the root,
/// no empty or `.` segments, `..` clamped at the root
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    format!("/{}", segments.join("/"))
}
