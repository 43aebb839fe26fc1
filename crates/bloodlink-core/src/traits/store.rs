//! Record store trait for pluggable key-value persistence backends.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::result::AppResult;

/// Trait for prefix-scannable key-value stores.
///
/// Values are JSON text. No transactions are assumed: a key written by one
/// caller may become visible to another caller's scan slightly later.
/// `put_if_absent` and `compare_and_set` are the only atomic primitives and
/// are what idempotent creation and validated state transitions rely on.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug + 'static {
    /// Get a value by key. Returns `None` if the key does not exist.
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Unconditionally write a value.
    async fn put(&self, key: &str, value: &str) -> AppResult<()>;

    /// Return all values whose key starts with `prefix`, in key order.
    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>>;

    /// Write a value only if the key does not already exist.
    /// Returns `true` if the value was written.
    async fn put_if_absent(&self, key: &str, value: &str) -> AppResult<bool>;

    /// Replace the value only if the current value equals `expected`.
    /// Returns `true` if the swap happened.
    async fn compare_and_set(&self, key: &str, expected: &str, value: &str) -> AppResult<bool>;

    /// Check that the store backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}

impl dyn RecordStore {
    /// Get a typed value by deserializing from JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write a typed value serialized to JSON.
    pub async fn put_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.put(key, &json).await
    }

    /// Scan a prefix and deserialize every value.
    pub async fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> AppResult<Vec<T>> {
        self.scan_prefix(prefix)
            .await?
            .iter()
            .map(|raw| serde_json::from_str(raw).map_err(Into::into))
            .collect()
    }
}
