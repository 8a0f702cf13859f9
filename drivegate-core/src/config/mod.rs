//! Configuration for drivegate
//!
//! Values are resolved in the following order (highest priority wins):
//!
//! 1. **Code / CLI flags**
//! 2. **Environment variables** (`DG_*`)
//! 3. **Config file** (`drivegate.toml`)
//! 4. **Defaults**
//!
//! # Example
//!
//! ```no_run
//! use drivegate_core::config::DrivegateConfig;
//!
//! let config = DrivegateConfig::load()?;
//! config.validate()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod gateway;
pub mod logging;
pub mod names;
pub mod server;

pub use gateway::GatewayConfig;
pub use logging::LoggingConfig;
pub use names::NamesConfig;
pub use server::ServerConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name
pub const CONFIG_FILE: &str = "drivegate.toml";

/// Complete drivegate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrivegateConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
    pub names: NamesConfig,
}

impl DrivegateConfig {
    /// Load `drivegate.toml` from the working directory, if present
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Defaults, then `path` if it exists, then the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::default();

        if path.exists() {
            let file_config = Self::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.merge(file_config);
        }

        config.apply_env_vars();
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))
    }

    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.server.merge(other.server);
        self.gateway.merge(other.gateway);
        self.logging.merge(other.logging);
        self.names.merge(other.names);
    }

    pub fn apply_env_vars(&mut self) {
        self.server.apply_env_vars();
        self.gateway.apply_env_vars();
        self.logging.apply_env_vars();
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.gateway.validate()?;
        self.logging.validate()?;
        self.names.validate()?;
        Ok(())
    }
}
