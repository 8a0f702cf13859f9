//! Human-readable name resolution
//!
//! The gateway never trusts a remembered "not found": every lookup it makes
//! asks the resolver to bypass cached misses.

pub mod caching;
pub mod table;

pub use caching::CachingResolver;
pub use table::StaticNameResolver;

use crate::key::ContentKey;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no record for {0}")]
    NotFound(String),
    #[error("record for {host} is malformed: {detail}")]
    InvalidRecord { host: String, detail: String },
    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// Per-lookup flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Re-attempt names whose last lookup failed instead of failing fast
    pub ignore_cached_miss: bool,
}

/// Maps a host name to the key of the drive it publishes
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, host: &str, opts: ResolveOptions) -> Result<ContentKey, ResolveError>;
}

/// Resolve a URL host to a content key.
///
/// Raw keys are returned as-is without consulting the resolver.
pub async fn resolve_host(
    resolver: &dyn NameResolver,
    host: &str,
) -> Result<ContentKey, ResolveError> {
    if ContentKey::is_raw(host) {
        return host.parse().map_err(|_| ResolveError::InvalidRecord {
            host: host.to_string(),
            detail: "not a key".to_string(),
        });
    }
    resolver.resolve(host, ResolveOptions { ignore_cached_miss: true }).await
}
