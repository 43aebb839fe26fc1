//! In-memory record store implementation using the dashmap crate.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use bloodlink_core::config::StoreConfig;
use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;

/// In-memory record store.
///
/// Single-key operations lock one shard, which makes `put_if_absent` and
/// `compare_and_set` atomic. Scans walk every shard and sort by key.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    /// Key → JSON text.
    entries: Arc<DashMap<String, String>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new in-memory store from configuration.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::with_capacity(config.initial_capacity)),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut matched: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        matched.sort_by(|a, b| a.0.cmp(&b.0));

        trace!(prefix, count = matched.len(), "Scanned prefix");
        Ok(matched.into_iter().map(|(_, v)| v).collect())
    }

    async fn put_if_absent(&self, key: &str, value: &str) -> AppResult<bool> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_string());
                Ok(true)
            }
        }
    }

    async fn compare_and_set(&self, key: &str, expected: &str, value: &str) -> AppResult<bool> {
        let swapped = match self.entries.get_mut(key) {
            Some(mut current) if current.value() == expected => {
                *current = value.to_string();
                true
            }
            _ => false,
        };
        Ok(swapped)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryRecordStore::new();
        store.put("k1", "v1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some("v1".to_string()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_prefix_is_ordered() {
        let store = MemoryRecordStore::new();
        store.put("donor:b", "2").await.unwrap();
        store.put("donor:a", "1").await.unwrap();
        store.put("recipient:a", "x").await.unwrap();
        let values = store.scan_prefix("donor:").await.unwrap();
        assert_eq!(values, vec!["1".to_string(), "2".to_string()]);
    }

    #[tokio::test]
    async fn test_put_if_absent() {
        let store = MemoryRecordStore::new();
        assert!(store.put_if_absent("k", "first").await.unwrap());
        assert!(!store.put_if_absent("k", "second").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("first".to_string()));
    }

    #[tokio::test]
    async fn test_compare_and_set() {
        let store = MemoryRecordStore::new();
        store.put("k", "a").await.unwrap();
        assert!(!store.compare_and_set("k", "stale", "b").await.unwrap());
        assert!(store.compare_and_set("k", "a", "b").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some("b".to_string()));
        assert!(!store.compare_and_set("absent", "a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_put_if_absent_single_winner() {
        let store = MemoryRecordStore::new();
        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.put_if_absent("race", &i.to_string()).await.unwrap()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
