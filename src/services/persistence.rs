use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use crate::errors::AppResult;
use super::kv_store::KeyValueStore;

pub const SLOT_DATA_KEY: &str = "SLOT_DATA";
pub const USERS_KEY: &str = "users";

/// A JSON value persisted under one fixed key.
///
/// Reads never fail from the caller's point of view: anything that goes
/// wrong degrades to the supplied default. The default is only written back
/// when the key is genuinely absent, so an unreadable entry is left in place
/// for inspection instead of being overwritten.
pub struct PersistedValue<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for PersistedValue<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T> PersistedValue<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    pub async fn load(&self, default: T) -> T {
        let raw = match self.store.get(self.key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("Error loading {}: {}", self.key, e);
                return default;
            }
        };

        // An empty entry counts as absent and is seeded.
        match raw.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::error!("Error parsing {}: {}", self.key, e);
                    default
                }
            },
            None => {
                tracing::info!("No stored {}, seeding default", self.key);
                self.save(&default).await;
                default
            }
        }
    }

    /// Reads the stored value, surfacing failures. Used where a missing or
    /// corrupt entry must not be mistaken for an empty one.
    pub async fn try_load(&self) -> AppResult<Option<T>> {
        match self.store.get(self.key).await?.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, value: &T) {
        if let Err(e) = self.try_save(value).await {
            tracing::error!("Error saving {}: {}", self.key, e);
        }
    }

    pub async fn try_save(&self, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(self.key, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::services::kv_store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Counts writes so seeding can be checked.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for CountingStore {
        async fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> AppResult<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value).await
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::Storage("disk unavailable".into()))
        }

        async fn set(&self, _key: &str, _value: String) -> AppResult<()> {
            Err(AppError::Storage("disk unavailable".into()))
        }
    }

    #[tokio::test]
    async fn empty_store_is_seeded_once() {
        let store = Arc::new(CountingStore::default());
        let value: PersistedValue<Vec<u32>> = PersistedValue::new(store.clone(), "numbers");

        assert_eq!(value.load(vec![1, 2, 3]).await, vec![1, 2, 3]);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        // The second load reads what was seeded rather than the new default.
        assert_eq!(value.load(vec![9]).await, vec![1, 2, 3]);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_entry_is_left_untouched() {
        let store = Arc::new(CountingStore::default());
        store.inner.set("numbers", "[1, 2,".to_string()).await.unwrap();
        let value: PersistedValue<Vec<u32>> = PersistedValue::new(store.clone(), "numbers");

        assert_eq!(value.load(vec![7]).await, vec![7]);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(
            store.inner.get("numbers").await.unwrap().as_deref(),
            Some("[1, 2,")
        );
        assert!(value.try_load().await.is_err());
    }

    #[tokio::test]
    async fn empty_entry_is_seeded_like_a_missing_one() {
        let store = Arc::new(CountingStore::default());
        store.inner.set("numbers", String::new()).await.unwrap();
        let value: PersistedValue<Vec<u32>> = PersistedValue::new(store.clone(), "numbers");

        assert!(value.try_load().await.unwrap().is_none());
        assert_eq!(value.load(vec![1, 2]).await, vec![1, 2]);
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        assert_eq!(value.try_load().await.unwrap(), Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn storage_failures_are_absorbed() {
        let value: PersistedValue<Vec<u32>> = PersistedValue::new(Arc::new(BrokenStore), "numbers");

        assert_eq!(value.load(vec![4]).await, vec![4]);
        value.save(&vec![5]).await;
        assert!(value.try_save(&vec![5]).await.is_err());
    }
}
