//! Name resolution from a fixed table

use super::{NameResolver, ResolveError, ResolveOptions};
use crate::key::ContentKey;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolves names from a table supplied up front (configuration, tests)
#[derive(Debug, Clone, Default)]
pub struct StaticNameResolver {
    names: HashMap<String, ContentKey>,
}

impl StaticNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `name -> hex key` pairs, rejecting malformed keys
    pub fn from_table<'a, I>(entries: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut resolver = Self::new();
        for (name, key) in entries {
            let parsed = key.parse().map_err(|_| ResolveError::InvalidRecord {
                host: name.clone(),
                detail: format!("{} is not a content key", key),
            })?;
            resolver.insert(name, parsed);
        }
        Ok(resolver)
    }

    pub fn insert(&mut self, name: impl AsRef<str>, key: ContentKey) {
        self.names.insert(name.as_ref().to_ascii_lowercase(), key);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[async_trait]
impl NameResolver for StaticNameResolver {
    async fn resolve(&self, host: &str, _opts: ResolveOptions) -> Result<ContentKey, ResolveError> {
        self.names
            .get(&host.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| ResolveError::NotFound(host.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let mut resolver = StaticNameResolver::new();
        let key = ContentKey::derive("blog");
        resolver.insert("Blog.Example", key);
        let found = resolver.resolve("blog.example", ResolveOptions::default()).await.unwrap();
        assert_eq!(found, key);
    }

    #[tokio::test]
    async fn test_unknown_name() {
        let resolver = StaticNameResolver::new();
        let err = resolver.resolve("nope", ResolveOptions::default()).await.unwrap_err();
        assert_eq!(err, ResolveError::NotFound("nope".to_string()));
    }

    #[test]
    fn test_from_table_rejects_bad_keys() {
        let mut table = HashMap::new();
        table.insert("site".to_string(), "not-hex".to_string());
        assert!(matches!(
            StaticNameResolver::from_table(&table),
            Err(ResolveError::InvalidRecord { .. })
        ));
    }
}
