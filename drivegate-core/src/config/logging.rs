//! Logging configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

const LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Env: DG_LOG_LEVEL
    pub level: String,
    /// `text` or `json`
    /// Env: DG_LOG_FORMAT
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "text".to_string() }
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        *self = other;
    }

    pub fn apply_env_vars(&mut self) {
        if let Ok(level) = env::var("DG_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(format) = env::var("DG_LOG_FORMAT") {
            self.format = format;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !LEVELS.contains(&self.level.to_ascii_lowercase().as_str()) {
            bail!("Invalid log level: {} (expected one of {})", self.level, LEVELS.join(", "));
        }
        if !matches!(self.format.as_str(), "text" | "json") {
            bail!("Invalid log format: {} (expected text or json)", self.format);
        }
        Ok(())
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}
