//! In-memory cache of generated artifacts and analysis results.
//!
//! Owned by the runtime and handed out by reference. It can hold derived
//! sensitive data, so a scrub clears it.

use lighthouse_scrub::Erasable;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct ArtifactCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.write().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    // Entries are replaced whole, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Value>> {
        self.entries.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.entries.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl Erasable for ArtifactCache {
    fn name(&self) -> &str {
        "artifact cache"
    }

    fn erase_all(&self) -> anyhow::Result<()> {
        self.clear();
        anyhow::ensure!(self.is_empty(), "artifact cache still holds entries");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_get_remove() {
        let cache = ArtifactCache::new();
        cache.insert("memorial-link", json!("https://lighthouse.example/m/42"));
        assert_eq!(cache.get("memorial-link"), Some(json!("https://lighthouse.example/m/42")));
        assert_eq!(cache.len(), 1);

        assert!(cache.remove("memorial-link").is_some());
        assert!(cache.get("memorial-link").is_none());
    }

    #[test]
    fn erase_all_empties_the_cache() {
        let cache = ArtifactCache::new();
        cache.insert("scan:State_ID_Card.pdf", json!({"idNumber": "D123-4567-8901"}));
        cache.insert("scan:Last_Will_and_Testament.pdf", json!({"executor": "Jordan Vance"}));

        cache.erase_all().unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.name(), "artifact cache");
    }
}
