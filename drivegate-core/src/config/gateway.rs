//! Request pipeline configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// Gateway behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Budget for a whole request, from arrival to the first byte
    /// Env: DG_REQUEST_TIMEOUT_MS
    /// Default: 30000
    pub request_timeout_ms: u64,

    /// Policy for drives whose manifest declares none
    /// Env: DG_DEFAULT_CSP
    pub default_csp: String,

    /// Policy sent with error pages
    pub error_page_csp: String,

    /// Leading bytes inspected before the content type is decided
    /// Env: DG_SNIFF_BYTES
    /// Default: 512
    pub sniff_bytes: usize,

    /// Chunk size of streams read from the in-memory store
    /// Env: DG_STREAM_CHUNK_SIZE
    /// Default: 65536
    pub stream_chunk_size: usize,

    /// Zip attachment name when the drive has no title
    /// Default: "archive"
    pub zip_fallback_name: String,

    /// Handler for drives with no registered type
    /// Env: DG_DEFAULT_HANDLER
    /// Default: "website"
    pub default_handler: String,

    /// Manifest type -> handler
    pub type_handlers: HashMap<String, String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            default_csp: "default-src * 'unsafe-inline'".to_string(),
            error_page_csp: "default-src 'unsafe-inline' beaker:;".to_string(),
            sniff_bytes: 512,
            stream_chunk_size: 64 * 1024,
            zip_fallback_name: "archive".to_string(),
            default_handler: "website".to_string(),
            type_handlers: HashMap::new(),
        }
    }
}

impl GatewayConfig {
    pub fn merge(&mut self, other: Self) {
        self.request_timeout_ms = other.request_timeout_ms;
        self.default_csp = other.default_csp;
        self.error_page_csp = other.error_page_csp;
        self.sniff_bytes = other.sniff_bytes;
        self.stream_chunk_size = other.stream_chunk_size;
        self.zip_fallback_name = other.zip_fallback_name;
        self.default_handler = other.default_handler;
        self.type_handlers.extend(other.type_handlers);
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(timeout) = env::var("DG_REQUEST_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.request_timeout_ms = t;
            }
        }

        if let Ok(csp) = env::var("DG_DEFAULT_CSP") {
            self.default_csp = csp;
        }

        if let Ok(bytes) = env::var("DG_SNIFF_BYTES") {
            if let Ok(b) = bytes.parse() {
                self.sniff_bytes = b;
            }
        }

        if let Ok(size) = env::var("DG_STREAM_CHUNK_SIZE") {
            if let Ok(s) = size.parse() {
                self.stream_chunk_size = s;
            }
        }

        if let Ok(handler) = env::var("DG_DEFAULT_HANDLER") {
            self.default_handler = handler;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            bail!("Invalid request_timeout_ms: must be greater than 0");
        }
        if self.sniff_bytes == 0 {
            bail!("Invalid sniff_bytes: must be greater than 0");
        }
        if self.stream_chunk_size == 0 {
            bail!("Invalid stream_chunk_size: must be greater than 0");
        }
        if self.zip_fallback_name.trim().is_empty() {
            bail!("Invalid zip_fallback_name: cannot be empty");
        }
        if self.default_handler.is_empty() {
            bail!("Invalid default_handler: cannot be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
