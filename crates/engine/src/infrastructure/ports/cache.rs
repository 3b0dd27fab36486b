//! Cache store port.
//!
//! Plain key/value, set and sorted-set primitives with per-key TTL. Holds no
//! business logic; every caller must treat a miss or an error as "ask the
//! durable store".

use std::time::Duration;

use async_trait::async_trait;

use super::error::CacheError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Add to a set and refresh the key's TTL.
    async fn set_add(&self, key: &str, member: String, ttl: Duration) -> Result<(), CacheError>;

    async fn set_remove(&self, key: &str, member: &str) -> Result<(), CacheError>;

    /// Replace a set's members in one step. An empty `members` deletes the key.
    async fn set_replace(
        &self,
        key: &str,
        members: Vec<String>,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn set_members(&self, key: &str) -> Result<Vec<String>, CacheError>;

    async fn set_len(&self, key: &str) -> Result<u64, CacheError>;

    /// Add or rescore a sorted-set member and refresh the key's TTL.
    async fn sorted_add(
        &self,
        key: &str,
        member: String,
        score: f64,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn sorted_remove(&self, key: &str, member: &str) -> Result<(), CacheError>;

    /// Members by descending score, skipping `offset` and returning at most `limit`.
    async fn sorted_range_desc(
        &self,
        key: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<String>, CacheError>;

    async fn sorted_len(&self, key: &str) -> Result<u64, CacheError>;
}
