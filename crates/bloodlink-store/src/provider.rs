//! Store manager that dispatches to the configured provider.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use bloodlink_core::config::StoreConfig;
use bloodlink_core::error::AppError;
use bloodlink_core::result::AppResult;
use bloodlink_core::traits::store::RecordStore;

/// Store manager that wraps the configured record store provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct StoreManager {
    /// The inner store provider.
    inner: Arc<dyn RecordStore>,
}

impl StoreManager {
    /// Create a new store manager from configuration.
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        let inner: Arc<dyn RecordStore> = match config.provider.as_str() {
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory record store");
                Arc::new(crate::memory::MemoryRecordStore::from_config(config))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store provider: '{other}'. Supported: memory"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Create a store manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn RecordStore>) -> Self {
        Self { inner: provider }
    }

    /// Shared handle to the inner provider.
    pub fn provider(&self) -> Arc<dyn RecordStore> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl RecordStore for StoreManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> AppResult<()> {
        self.inner.put(key, value).await
    }

    async fn scan_prefix(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.inner.scan_prefix(prefix).await
    }

    async fn put_if_absent(&self, key: &str, value: &str) -> AppResult<bool> {
        self.inner.put_if_absent(key, value).await
    }

    async fn compare_and_set(&self, key: &str, expected: &str, value: &str) -> AppResult<bool> {
        self.inner.compare_and_set(key, expected, value).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}
