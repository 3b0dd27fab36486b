//! In-process TTL cache store.
//!
//! Implements the `CacheStore` port with strings, sets and sorted sets. Each
//! key carries its own expiry; expired entries are invisible to reads and are
//! removed when `cleanup_expired()` runs.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::infrastructure::ports::{CacheError, CacheStore};

/// A thread-safe cache with per-key time-to-live expiration.
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: CacheValue,
    expires_at: Instant,
}

enum CacheValue {
    Text(String),
    Set(HashSet<String>),
    Sorted(HashMap<String, f64>),
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Remove all expired entries and return the count of removed entries.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut guard = self.entries.write().await;
        let before_count = guard.len();
        guard.retain(|_, entry| entry.is_live(now));
        before_count - guard.len()
    }

    /// Get the current number of entries (including expired ones not yet cleaned).
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn wrong_type(key: &str) -> CacheError {
        CacheError::WrongType {
            key: key.to_string(),
        }
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                CacheValue::Text(text) => Ok(Some(text.clone())),
                _ => Err(Self::wrong_type(key)),
            },
            _ => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value: CacheValue::Text(value),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn set_add(&self, key: &str, member: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut guard = self.entries.write().await;
        let entry = guard.entry(key.to_string()).or_insert_with(|| CacheEntry {
            value: CacheValue::Set(HashSet::new()),
            expires_at: now,
        });
        if !entry.is_live(now) {
            entry.value = CacheValue::Set(HashSet::new());
        }
        match &mut entry.value {
            CacheValue::Set(set) => {
                set.insert(member);
            }
            _ => return Err(Self::wrong_type(key)),
        }
        entry.expires_at = now + ttl;
        Ok(())
    }

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), CacheError> {
        let mut guard = self.entries.write().await;
        if let Some(entry) = guard.get_mut(key) {
            match &mut entry.value {
                CacheValue::Set(set) => {
                    set.remove(member);
                }
                _ => return Err(Self::wrong_type(key)),
            }
        }
        Ok(())
    }

    async fn set_replace(
        &self,
        key: &str,
        members: Vec<String>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut guard = self.entries.write().await;
        if members.is_empty() {
            guard.remove(key);
            return Ok(());
        }
        let entry = CacheEntry {
            value: CacheValue::Set(members.into_iter().collect()),
            expires_at: Instant::now() + ttl,
        };
        guard.insert(key.to_string(), entry);
        Ok(())
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                CacheValue::Set(set) => Ok(set.iter().cloned().collect()),
                _ => Err(Self::wrong_type(key)),
            },
            _ => Ok(Vec::new()),
        }
    }

    async fn set_len(&self, key: &str) -> Result<u64, CacheError> {
        let now = Instant::now();
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                CacheValue::Set(set) => Ok(set.len() as u64),
                _ => Err(Self::wrong_type(key)),
            },
            _ => Ok(0),
        }
    }

    async fn sorted_add(
        &self,
        key: &str,
        member: String,
        score: f64,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut guard = self.entries.write().await;
        let entry = guard.entry(key.to_string()).or_insert_with(|| CacheEntry {
            value: CacheValue::Sorted(HashMap::new()),
            expires_at: now,
        });
        if !entry.is_live(now) {
            entry.value = CacheValue::Sorted(HashMap::new());
        }
        match &mut entry.value {
            CacheValue::Sorted(members) => {
                members.insert(member, score);
            }
            _ => return Err(Self::wrong_type(key)),
        }
        entry.expires_at = now + ttl;
        Ok(())
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> Result<(), CacheError> {
        let mut guard = self.entries.write().await;
        if let Some(entry) = guard.get_mut(key) {
            match &mut entry.value {
                CacheValue::Sorted(members) => {
                    members.remove(member);
                }
                _ => return Err(Self::wrong_type(key)),
            }
        }
        Ok(())
    }

    async fn sorted_range_desc(
        &self,
        key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                CacheValue::Sorted(members) => {
                    let mut ranked: Vec<(&String, f64)> =
                        members.iter().map(|(m, s)| (m, *s)).collect();
                    ranked.sort_by(|a, b| {
                        b.1.partial_cmp(&a.1)
                            .unwrap_or(Ordering::Equal)
                            .then_with(|| b.0.cmp(a.0))
                    });
                    Ok(ranked
                        .into_iter()
                        .skip(offset)
                        .take(limit)
                        .map(|(m, _)| m.clone())
                        .collect())
                }
                _ => Err(Self::wrong_type(key)),
            },
            _ => Ok(Vec::new()),
        }
    }

    async fn sorted_len(&self, key: &str) -> Result<u64, CacheError> {
        let now = Instant::now();
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(entry) if entry.is_live(now) => match &entry.value {
                CacheValue::Sorted(members) => Ok(members.len() as u64),
                _ => Err(Self::wrong_type(key)),
            },
            _ => Ok(0),
        }
    }
}
