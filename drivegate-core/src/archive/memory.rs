//! In-memory drive store
//!
//! Holds every version of every drive as an immutable snapshot of
//! `path -> bytes`. Directories are implicit in file paths. Used to serve
//! local directories and as the store behind the test suite.

use super::{
    normalize_path, ArchiveSession, ArchiveStore, ByteStream, CheckoutFs, Entry, StoreError,
};
use crate::gateway::range::ByteRange;
use crate::key::ContentKey;
use crate::url::Version;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

type Snapshot = BTreeMap<String, Bytes>;

/// Store holding drives entirely in memory
pub struct MemoryStore {
    drives: RwLock<HashMap<ContentKey, Arc<MemoryDrive>>>,
    chunk_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { drives: RwLock::new(HashMap::new()), chunk_size: DEFAULT_CHUNK_SIZE }
    }

    /// Size of the chunks read streams are cut into
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The drive for `key`, created empty if unknown
    pub fn drive(&self, key: ContentKey) -> Arc<MemoryDrive> {
        let mut drives = self.drives.write().unwrap_or_else(|e| e.into_inner());
        drives
            .entry(key)
            .or_insert_with(|| Arc::new(MemoryDrive::new(key, self.chunk_size)))
            .clone()
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.drives.read().unwrap_or_else(|e| e.into_inner()).contains_key(key)
    }

    /// Publish a new version of `key` made of `files`; returns its number
    pub fn publish<I>(&self, key: ContentKey, files: I) -> u64
    where
        I: IntoIterator<Item = (String, Bytes)>,
    {
        self.drive(key).publish(files)
    }

    /// Publish the contents of a local directory as a new version of `key`
    pub async fn publish_directory(&self, key: ContentKey, directory: impl AsRef<Path>) -> Result<u64> {
        let dir = directory.as_ref().to_path_buf();
        let files = tokio::task::spawn_blocking(move || read_tree(&dir))
            .await
            .context("directory walk panicked")??;

        for (path, content) in &files {
            log::debug!(target: "drivegate::store", "[{}] {} ({} bytes)", key, path, content.len());
        }
        let count = files.len();
        let version = self.publish(key, files);
        log::info!(target: "drivegate::store", "published {} files as {}+{}", count, key, version);
        Ok(version)
    }
}

/// Walk a directory into `(drive path, content)` pairs, skipping symlinks
fn read_tree(root: &Path) -> Result<Vec<(String, Bytes)>> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<(String, Bytes)>) -> Result<()> {
        for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if path.is_symlink() {
                continue;
            }
            if path.is_dir() {
                walk(&path, root, out)?;
            } else if path.is_file() {
                let relative = path.strip_prefix(root)?;
                let drive_path = format!("/{}", relative.to_string_lossy().replace('\\', "/"));
                let content = std::fs::read(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                out.push((drive_path, Bytes::from(content)));
            }
        }
        Ok(())
    }

    if !root.is_dir() {
        anyhow::bail!("Directory does not exist: {}", root.display());
    }
    let mut out = Vec::new();
    walk(root, root, &mut out)?;
    Ok(out)
}

#[async_trait]
impl ArchiveStore for MemoryStore {
    async fn load_archive(&self, key: ContentKey) -> Result<Arc<dyn ArchiveSession>, StoreError> {
        let drives = self.drives.read().unwrap_or_else(|e| e.into_inner());
        match drives.get(&key) {
            Some(drive) => Ok(drive.clone() as Arc<dyn ArchiveSession>),
            None => Err(StoreError::DriveNotFound(key)),
        }
    }
}

/// One drive: an append-only list of versions plus named tags
pub struct MemoryDrive {
    key: ContentKey,
    versions: RwLock<Vec<Arc<Snapshot>>>,
    tags: RwLock<HashMap<String, u64>>,
    chunk_size: usize,
}

impl MemoryDrive {
    fn new(key: ContentKey, chunk_size: usize) -> Self {
        Self {
            key,
            versions: RwLock::new(Vec::new()),
            tags: RwLock::new(HashMap::new()),
            chunk_size,
        }
    }

    /// Append a version; version numbers start at 1
    pub fn publish<I>(&self, files: I) -> u64
    where
        I: IntoIterator<Item = (String, Bytes)>,
    {
        let snapshot: Snapshot =
            files.into_iter().map(|(path, content)| (normalize_path(&path), content)).collect();
        let mut versions = self.versions.write().unwrap_or_else(|e| e.into_inner());
        versions.push(Arc::new(snapshot));
        versions.len() as u64
    }

    /// Name an existing version
    pub fn tag(&self, name: impl Into<String>, version: u64) -> Result<(), StoreError> {
        if version == 0 || version > self.latest_version() {
            return Err(StoreError::UnknownVersion(version.to_string()));
        }
        self.tags.write().unwrap_or_else(|e| e.into_inner()).insert(name.into(), version);
        Ok(())
    }

    pub fn latest_version(&self) -> u64 {
        self.versions.read().unwrap_or_else(|e| e.into_inner()).len() as u64
    }

    fn snapshot(&self, version: u64) -> Option<Arc<Snapshot>> {
        if version == 0 {
            return Some(Arc::new(Snapshot::new()));
        }
        let versions = self.versions.read().unwrap_or_else(|e| e.into_inner());
        versions.get(version as usize - 1).cloned()
    }
}

#[async_trait]
impl ArchiveSession for MemoryDrive {
    fn key(&self) -> ContentKey {
        self.key
    }

    async fn checkout(&self, version: Option<&Version>) -> Result<Arc<dyn CheckoutFs>, StoreError> {
        let number = match version {
            None => self.latest_version(),
            Some(Version::Seq(seq)) => *seq,
            Some(Version::Tag(tag)) => *self
                .tags
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .get(tag)
                .ok_or_else(|| StoreError::UnknownVersion(tag.clone()))?,
        };
        let files = self
            .snapshot(number)
            .ok_or_else(|| StoreError::UnknownVersion(number.to_string()))?;
        Ok(Arc::new(MemoryCheckout { version: number, files, chunk_size: self.chunk_size }))
    }
}

/// Read-only view of one snapshot
pub struct MemoryCheckout {
    version: u64,
    files: Arc<Snapshot>,
    chunk_size: usize,
}

impl MemoryCheckout {
    fn dir_prefix(path: &str) -> String {
        if path == "/" {
            "/".to_string()
        } else {
            format!("{}/", path)
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        let prefix = Self::dir_prefix(path);
        self.files.range(prefix.clone()..).next().is_some_and(|(p, _)| p.starts_with(&prefix))
    }
}

#[async_trait]
impl CheckoutFs for MemoryCheckout {
    fn version(&self) -> u64 {
        self.version
    }

    async fn stat(&self, path: &str) -> Result<Option<Entry>, StoreError> {
        let path = normalize_path(path);
        if let Some(content) = self.files.get(&path) {
            return Ok(Some(Entry::file(path, content.len() as u64)));
        }
        if self.is_dir(&path) {
            return Ok(Some(Entry::directory(path)));
        }
        Ok(None)
    }

    async fn read_dir(&self, path: &str) -> Result<Vec<Entry>, StoreError> {
        let path = normalize_path(path);
        if self.files.contains_key(&path) {
            return Err(StoreError::NoSuchFile(format!("{} is not a directory", path)));
        }
        let prefix = Self::dir_prefix(&path);
        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();
        for (file_path, content) in self.files.range(prefix.clone()..) {
            let Some(rest) = file_path.strip_prefix(&prefix) else { break };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(format!("{}{}", prefix, dir));
                }
                None => files.push(Entry::file(file_path.clone(), content.len() as u64)),
            }
        }
        if files.is_empty() && dirs.is_empty() && path != "/" {
            return Err(StoreError::NoSuchFile(path));
        }
        let mut entries: Vec<Entry> = dirs.into_iter().map(Entry::directory).collect();
        entries.extend(files);
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    async fn read_file(&self, path: &str) -> Result<Bytes, StoreError> {
        let path = normalize_path(path);
        match self.files.get(&path) {
            Some(content) => Ok(content.clone()),
            None if self.is_dir(&path) => Err(StoreError::IsDirectory(path)),
            None => Err(StoreError::NoSuchFile(path)),
        }
    }

    fn create_read_stream(&self, path: &str, range: Option<ByteRange>) -> ByteStream {
        let path = normalize_path(path);
        let Some(content) = self.files.get(&path).cloned() else {
            let err = std::io::Error::new(std::io::ErrorKind::NotFound, format!("no such file: {}", path));
            return futures::stream::once(async move { Err(err) }).boxed();
        };

        let len = content.len() as u64;
        let (start, end) = match range {
            Some(r) => (r.start.min(len), r.end.saturating_add(1).min(len)),
            None => (0, len),
        };
        let body = content.slice(start as usize..end.max(start) as usize);
        let chunk_size = self.chunk_size;
        let chunks: Vec<std::io::Result<Bytes>> = (0..body.len())
            .step_by(chunk_size)
            .map(|offset| Ok(body.slice(offset..(offset + chunk_size).min(body.len()))))
            .collect();
        futures::stream::iter(chunks).boxed()
    }
}
