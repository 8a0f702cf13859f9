//! HTTP front end configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// HTTP listener configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port
    /// Env: DG_PORT
    /// Default: 8080
    pub port: u16,

    /// Listening address
    /// Env: DG_HOST
    /// Default: "127.0.0.1"
    pub host: String,

    /// Log one line per request
    /// Env: DG_ACCESS_LOG
    /// Default: true
    pub access_log: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080, host: "127.0.0.1".to_string(), access_log: true }
    }
}

impl ServerConfig {
    /// Merge another config into this one (other takes priority)
    pub fn merge(&mut self, other: Self) {
        self.port = other.port;
        self.host = other.host;
        self.access_log = other.access_log;
    }

    /// Apply environment variables
    pub fn apply_env_vars(&mut self) {
        if let Ok(port) = env::var("DG_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }

        if let Ok(host) = env::var("DG_HOST") {
            self.host = host;
        }

        if let Ok(enabled) = env::var("DG_ACCESS_LOG") {
            self.access_log = enabled.parse().unwrap_or(self.access_log);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            bail!("Invalid port: port must be between 1 and 65535");
        }

        if self.host.is_empty() {
            bail!("Invalid host: host cannot be empty");
        }

        Ok(())
    }

    /// `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
