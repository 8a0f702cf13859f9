//! Static name table

use crate::key::ContentKey;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Host name -> 64-hex drive key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamesConfig {
    pub entries: HashMap<String, String>,
}

impl NamesConfig {
    pub fn merge(&mut self, other: Self) {
        self.entries.extend(other.entries);
    }

    pub fn insert(&mut self, name: impl Into<String>, key: ContentKey) {
        self.entries.insert(name.into(), key.to_hex());
    }

    pub fn validate(&self) -> Result<()> {
        for (name, key) in &self.entries {
            if name.is_empty() {
                bail!("Invalid name entry: name cannot be empty");
            }
            if !ContentKey::is_raw(key) {
                bail!("Invalid key for {}: expected 64 hex characters", name);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_keys() {
        let mut names = NamesConfig::default();
        names.insert("site", ContentKey::derive("site"));
        assert!(names.validate().is_ok());
        names.entries.insert("bad".into(), "1234".into());
        assert!(names.validate().is_err());
    }
}
