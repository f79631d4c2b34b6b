//! Key-value store abstraction backing the fast pincode cache.
//!
//! The interface is deliberately small (`get`/`set`/`delete`/`exists`) so a
//! hosted store can replace the in-memory implementation without touching
//! the services that use it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() > at)
    }
}

/// In-process cache with a capacity bound. Expired entries are dropped
/// lazily on read and swept when the store hits capacity.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    capacity: usize,
}

const DEFAULT_CAPACITY: usize = 10_000;

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock_err<T>(_: T) -> CacheError {
        CacheError::OperationFailed("cache lock poisoned".to_string())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let expired = {
            let entries = self.entries.read().map_err(Self::lock_err)?;
            match entries.get(key) {
                Some(entry) if entry.is_expired() => true,
                Some(entry) => return Ok(Some(entry.value.clone())),
                None => return Ok(None),
            }
        };
        if expired {
            let mut entries = self.entries.write().map_err(Self::lock_err)?;
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(Self::lock_err)?;
        if entries.len() >= self.capacity && !entries.contains_key(key) {
            entries.retain(|_, entry| !entry.is_expired());
            if entries.len() >= self.capacity {
                return Err(CacheError::OperationFailed(format!(
                    "cache capacity {} exceeded",
                    self.capacity
                )));
            }
        }
        entries.insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(Self::lock_err)?;
        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.get(key).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = InMemoryCache::new();
        cache.set("pincode:s1", "560001", None).await.unwrap();
        assert_eq!(
            cache.get("pincode:s1").await.unwrap(),
            Some("560001".to_string())
        );
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("pincode:absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = InMemoryCache::new();
        cache.set("k", "v", None).await.unwrap();
        cache.delete("k").await.unwrap();
        assert!(!cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn expired_entries_read_as_missing() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v", Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn capacity_sweep_evicts_expired_before_rejecting() {
        let cache = InMemoryCache::with_capacity(1);
        cache
            .set("old", "v", Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.set("new", "v", None).await.unwrap();
        assert!(cache.exists("new").await.unwrap());
    }
}
