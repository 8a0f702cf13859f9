//! URL path to drive entry resolution

use super::manifest::Manifest;
use crate::archive::{normalize_path, CheckoutFs, Entry};
use crate::content::accept_wants_html;
use crate::url::DriveUrl;
use async_trait::async_trait;

/// Maps a request path onto an entry of a checkout
#[async_trait]
pub trait PathResolver: Send + Sync {
    /// `None` when nothing matches. Directories are returned as directory
    /// entries; the caller decides whether to redirect.
    async fn resolve(
        &self,
        view: &dyn CheckoutFs,
        manifest: Option<&Manifest>,
        url: &DriveUrl,
        accept: Option<&str>,
    ) -> Option<Entry>;
}

/// Resolution order:
///
/// 1. trailing `/`: `index.html`, `index.md`, then the directory itself
/// 2. otherwise the exact path, then `<path>.html`, then `<path>.md`
/// 3. the manifest's `fallback_page` when the client wants HTML
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPathResolver;

impl DefaultPathResolver {
    fn candidates(url: &DriveUrl) -> Vec<String> {
        let path = normalize_path(&url.path);
        if url.has_trailing_slash {
            let base = if path == "/" { String::new() } else { path.clone() };
            vec![format!("{}/index.html", base), format!("{}/index.md", base), path]
        } else {
            vec![path.clone(), format!("{}.html", path), format!("{}.md", path)]
        }
    }

    async fn lookup(view: &dyn CheckoutFs, path: &str) -> Option<Entry> {
        match view.stat(path).await {
            Ok(entry) => entry,
            Err(err) => {
                log::debug!(target: "drivegate::resolve", "stat {} failed: {}", path, err);
                None
            }
        }
    }
}

#[async_trait]
impl PathResolver for DefaultPathResolver {
    async fn resolve(
        &self,
        view: &dyn CheckoutFs,
        manifest: Option<&Manifest>,
        url: &DriveUrl,
        accept: Option<&str>,
    ) -> Option<Entry> {
        let exact = normalize_path(&url.path);
        for candidate in Self::candidates(url) {
            if let Some(entry) = Self::lookup(view, &candidate).await {
                // Only the exact path may resolve to a directory
                if entry.is_directory() && candidate != exact {
                    continue;
                }
                return Some(entry);
            }
        }

        let fallback = manifest.and_then(|m| m.fallback_page.as_deref())?;
        if !accept_wants_html(accept) {
            return None;
        }
        Self::lookup(view, &normalize_path(fallback)).await.filter(Entry::is_file)
    }
}
