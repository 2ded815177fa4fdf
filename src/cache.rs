use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{ForecastError, Result};

/// Default lifetime of a cached forecast aggregate
pub const DEFAULT_FORECAST_TTL: Duration = Duration::from_secs(300);

#[derive(Serialize, Deserialize)]
struct StoredValue<T> {
    value: T,
}

struct StoredEntry {
    bytes: Vec<u8>,
    expires_at: Instant,
}

/// In-memory TTL cache shared by the forecast service.
///
/// Values are stored postcard-encoded so one instance can hold several value
/// types. Cloning yields another handle to the same map.
#[derive(Clone, Default)]
pub struct Cache {
    store: Arc<RwLock<HashMap<String, StoredEntry>>>,
}

impl Cache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self))]
    pub async fn put<T: Serialize + Debug>(&self, key: &str, value: T, ttl: Duration) -> Result<()> {
        let bytes = postcard::to_stdvec(&StoredValue { value })
            .map_err(|e| ForecastError::general(format!("Failed to encode cache value: {e}")))?;
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| ForecastError::general("TTL overflow"))?;

        self.store
            .write()
            .await
            .insert(key.to_string(), StoredEntry { bytes, expires_at });
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let now = Instant::now();
        let fresh = {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if now < entry.expires_at => Some(
                    postcard::from_bytes::<StoredValue<T>>(&entry.bytes).map_err(|e| {
                        ForecastError::general(format!("Failed to decode cache value: {e}"))
                    })?,
                ),
                Some(_) => None,
                None => {
                    tracing::debug!("Key not found");
                    return Ok(None);
                }
            }
        };

        match fresh {
            Some(stored) => {
                tracing::debug!("Key found and still fresh");
                Ok(Some(stored.value))
            }
            None => {
                tracing::debug!("Key found but expired");
                self.remove_if_expired(key, now).await;
                Ok(None)
            }
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) {
        self.store.write().await.remove(key);
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    /// Removes all expired entries, returning how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| now < entry.expires_at);
        before - store.len()
    }

    /// Number of stored entries, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Starts a background task that sweeps expired entries every `period`.
    ///
    /// Reads never depend on the sweep having run.
    #[must_use]
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let dropped = cache.sweep().await;
                if dropped > 0 {
                    tracing::debug!("Swept {} expired cache entries", dropped);
                }
            }
        })
    }

    // A concurrent put may have replaced the entry since it was read
    async fn remove_if_expired(&self, key: &str, now: Instant) {
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|e| now >= e.expires_at) {
            store.remove(key);
        }
    }
}
