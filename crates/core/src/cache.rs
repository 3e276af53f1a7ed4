use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use crate::{error::Result, types::EnrichedRecord};

/// Cache key for a serializable search description: its canonical JSON.
///
/// Two searches share a key exactly when their serialized form is identical.
pub fn cache_key<T: serde::Serialize>(search: &T) -> Result<String> {
    Ok(serde_json::to_string(search)?)
}

/// Short fingerprint of a key, for log lines.
pub fn key_digest(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}

/// Memoized search results. Entries never expire; callers clear explicitly.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: HashMap<String, Arc<[EnrichedRecord]>>,
    hits: u64,
    misses: u64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &str) -> Option<Arc<[EnrichedRecord]>> {
        match self.entries.get(key) {
            Some(records) => {
                self.hits += 1;
                Some(Arc::clone(records))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: String, records: Vec<EnrichedRecord>) -> Arc<[EnrichedRecord]> {
        let records: Arc<[EnrichedRecord]> = records.into();
        self.entries.insert(key, Arc::clone(&records));
        records
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_deterministic() {
        let a = cache_key(&("rust", 50, Some(7))).unwrap();
        let b = cache_key(&("rust", 50, Some(7))).unwrap();
        let c = cache_key(&("rust", 25, Some(7))).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_key_is_the_full_canonical_form() {
        let key = cache_key(&("fixture", "rust", 50)).unwrap();
        assert_eq!(key, r#"["fixture","rust",50]"#);
        assert_eq!(key_digest(&key), key_digest(r#"["fixture","rust",50]"#));
    }

    #[test]
    fn test_hits_and_misses() {
        let mut cache = ResultCache::new();
        assert!(cache.get("a").is_none());
        cache.insert("a".to_string(), Vec::new());
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert_eq!((cache.hits(), cache.misses()), (1, 2));

        assert!(cache.remove("a"));
        assert!(!cache.remove("a"));
        assert!(cache.is_empty());
    }
}
