use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::domain::ports::outbound::{CacheError, LocalCache};

/// Process-local cache backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry.
    pub fn with_entry(self, key: impl Into<String>, value: Value) -> Self {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert(key.into(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .expect("cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.entries
            .write()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().expect("cache lock poisoned").remove(key);
        Ok(())
    }
}
