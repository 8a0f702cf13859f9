//! Handler negotiation
//!
//! A drive may only run as an application (HTML and scripts) when its
//! handler is `website`. Any other drive type is rendered by a registered
//! handler application, which gets bootstrapped in place of the drive's own
//! pages when the client asks for HTML.

use super::manifest::Manifest;
use async_trait::async_trait;
use scc::HashMap as SccHashMap;
use std::collections::HashMap;

/// Handler that lets a drive execute its own HTML
pub const WEBSITE_HANDLER: &str = "website";

/// Registry of handler applications per drive type
#[async_trait]
pub trait TypeRegistry: Send + Sync {
    /// Handler registered for a manifest type (`None` = no type declared)
    async fn default_drive_handler(&self, drive_type: Option<&str>) -> String;

    /// Handler the user explicitly picked for a URL, if any
    async fn drive_handler_override(&self, url: &str) -> Option<String>;
}

/// Type registry backed by a fixed table plus runtime per-URL overrides
pub struct StaticTypeRegistry {
    default_handler: String,
    handlers: HashMap<String, String>,
    overrides: SccHashMap<String, String>,
}

impl Default for StaticTypeRegistry {
    fn default() -> Self {
        Self::new(WEBSITE_HANDLER, HashMap::new())
    }
}

impl StaticTypeRegistry {
    pub fn new(default_handler: impl Into<String>, handlers: HashMap<String, String>) -> Self {
        Self { default_handler: default_handler.into(), handlers, overrides: SccHashMap::new() }
    }

    pub async fn set_override(&self, url: impl Into<String>, handler: impl Into<String>) {
        let url = url.into();
        self.overrides.remove_async(&url).await;
        let _ = self.overrides.insert_async(url, handler.into()).await;
    }

    pub async fn clear_override(&self, url: &str) -> bool {
        self.overrides.remove_async(url).await.is_some()
    }
}

#[async_trait]
impl TypeRegistry for StaticTypeRegistry {
    async fn default_drive_handler(&self, drive_type: Option<&str>) -> String {
        drive_type
            .and_then(|t| self.handlers.get(t))
            .cloned()
            .unwrap_or_else(|| self.default_handler.clone())
    }

    async fn drive_handler_override(&self, url: &str) -> Option<String> {
        self.overrides.read_async(url, |_, handler| handler.clone()).await
    }
}

/// Result of negotiating how a drive is presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    pub handler: String,
    pub can_execute_html: bool,
}

impl Negotiation {
    /// A non-website handler that names a loadable application (a URL or an
    /// absolute path). Bare handler ids have nothing to bootstrap, so their
    /// drives are served as plain data.
    pub fn has_application(&self) -> bool {
        !self.can_execute_html && (self.handler.contains("://") || self.handler.starts_with('/'))
    }
}

/// Pick the handler for a request: explicit override first, then the
/// default for the manifest type
pub async fn negotiate(registry: &dyn TypeRegistry, url: &str, manifest: Option<&Manifest>) -> Negotiation {
    let handler = match registry.drive_handler_override(url).await {
        Some(handler) => handler,
        None => {
            let drive_type = manifest.and_then(|m| m.drive_type.as_deref());
            registry.default_drive_handler(drive_type).await
        }
    };
    let can_execute_html = handler == WEBSITE_HANDLER;
    Negotiation { handler, can_execute_html }
}

/// Small document that boots the handler application
pub fn handler_shell(handler: &str) -> String {
    format!(
        "<meta charset=\"utf-8\">\n<link rel=\"stylesheet\" href=\"{}\">\n<script type=\"module\" src=\"{}\"></script>\n",
        join_path(handler, "drive-handler.css"),
        join_path(handler, "drive-handler.js"),
    )
}

/// Join two path parts with exactly one `/`
pub fn join_path(left: &str, right: &str) -> String {
    format!("{}/{}", left.trim_end_matches('/'), right.trim_start_matches('/'))
}
