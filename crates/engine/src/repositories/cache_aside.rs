//! Shared cache-aside plumbing.
//!
//! Reads swallow cache failures and report a miss. Writes happen on the
//! background pool after the durable write has committed.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::infrastructure::background::BackgroundTasks;
use crate::infrastructure::metrics::LobbyMetrics;
use crate::infrastructure::ports::{CacheError, CacheStore};

#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    tasks: BackgroundTasks,
    metrics: Arc<LobbyMetrics>,
    ttl: Duration,
}

impl CacheAside {
    pub fn new(
        store: Arc<dyn CacheStore>,
        tasks: BackgroundTasks,
        metrics: Arc<LobbyMetrics>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            tasks,
            metrics,
            ttl,
        }
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    /// Cached JSON value, or `None` on miss, cache error or undecodable entry.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    self.record_error("decode", key, &e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                self.record_error("get", key, &e);
                None
            }
        }
    }

    /// Store `value` as JSON in the background.
    pub fn write<T: Serialize>(&self, key: String, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                self.record_error("encode", &key, &e);
                return;
            }
        };
        self.spawn("cache_write", move |store, ttl| async move {
            store.set(&key, raw, ttl).await
        });
    }

    /// Drop `key` in the background.
    pub fn invalidate(&self, key: String) {
        self.spawn("cache_invalidate", move |store, _| async move {
            store.delete(&key).await
        });
    }

    /// Run cache work on the background pool; failures are logged and counted.
    pub fn spawn<F, Fut>(&self, name: &'static str, work: F)
    where
        F: FnOnce(Arc<dyn CacheStore>, Duration) -> Fut,
        Fut: Future<Output = Result<(), CacheError>> + Send + 'static,
    {
        let task = work(Arc::clone(&self.store), self.ttl);
        let metrics = Arc::clone(&self.metrics);
        self.tasks.spawn(name, async move {
            if let Err(e) = task.await {
                tracing::warn!(task = name, error = %e, "Background cache update failed");
                metrics.cache_error();
            }
        });
    }

    pub fn record_error(&self, operation: &'static str, key: &str, error: &dyn Display) {
        tracing::warn!(operation, key, error = %error, "Cache operation failed, using durable store");
        self.metrics.cache_error();
    }

    pub async fn idle(&self) {
        self.tasks.idle().await;
    }
}
