pub mod fetch;
pub mod serve;

use anyhow::{bail, Context, Result};
use drivegate_core::config::DrivegateConfig;
use drivegate_core::dns::{CachingResolver, StaticNameResolver};
use drivegate_core::{archive::MemoryStore, ContentKey, Gateway};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Names cached by the resolver in front of the static table
const NAME_CACHE_CAPACITY: usize = 1024;

/// `NAME=DIR` argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSpec {
    pub name: String,
    pub dir: PathBuf,
}

impl FromStr for DriveSpec {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (name, dir) =
            raw.split_once('=').ok_or_else(|| format!("expected NAME=DIR, got \"{}\"", raw))?;
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() || dir.is_empty() {
            return Err(format!("expected NAME=DIR, got \"{}\"", raw));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')) {
            return Err(format!("invalid drive name: \"{}\"", name));
        }
        Ok(Self { name, dir: PathBuf::from(dir) })
    }
}

/// Defaults < config file < environment
pub fn load_config(path: Option<&Path>) -> Result<DrivegateConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            DrivegateConfig::load_from(path)
        }
        None => DrivegateConfig::load(),
    }
}

/// Publish every drive into a fresh store and build a gateway over it.
/// Returns the gateway and the key assigned to each drive name.
pub async fn build_gateway(
    config: &DrivegateConfig,
    drives: &[DriveSpec],
) -> Result<(Gateway, Vec<(String, ContentKey)>)> {
    let store = Arc::new(MemoryStore::new().with_chunk_size(config.gateway.stream_chunk_size));
    let mut names = StaticNameResolver::from_table(config.names.entries.iter())
        .context("Invalid [names] table")?;

    let mut published = Vec::with_capacity(drives.len());
    for drive in drives {
        let key = ContentKey::derive(&drive.name);
        store
            .publish_directory(key, &drive.dir)
            .await
            .with_context(|| format!("Failed to publish {} from {}", drive.name, drive.dir.display()))?;
        names.insert(&drive.name, key);
        published.push((drive.name.clone(), key));
    }

    let resolver = CachingResolver::new(Arc::new(names), NAME_CACHE_CAPACITY);
    let gateway = Gateway::builder(store)
        .resolver(Arc::new(resolver))
        .config(config.gateway.clone())
        .build();
    Ok((gateway, published))
}
