use crate::prelude::*;

/// Last cleaned response text per cache key.
///
/// Entries are overwritten on every successful read and never expire; a read
/// that fails leaves whatever was there before. Lives inside the bridge lock,
/// so it carries no locking of its own.
#[derive(Debug, Default, Clone)]
pub struct ResponseCache {
    entries: HashMap<String, String>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, raw: impl Into<String>) {
        let key = key.into();
        trace!("response_cache: put {}", key);
        self.entries.insert(key, raw.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        debug!("response_cache: clearing {} entries", self.entries.len());
        self.entries.clear();
    }
}
