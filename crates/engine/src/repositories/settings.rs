//! Room settings repository: cache-aside over the durable settings store.

use std::sync::Arc;

use quizlobby_domain::{RoomId, RoomSettings};

use super::cache_aside::CacheAside;
use super::cache_keys;
use crate::infrastructure::ports::{RepoError, SettingsRepo};

pub struct SettingsRepository {
    repo: Arc<dyn SettingsRepo>,
    cache: CacheAside,
}

impl SettingsRepository {
    pub fn new(repo: Arc<dyn SettingsRepo>, cache: CacheAside) -> Self {
        Self { repo, cache }
    }

    pub async fn get(&self, room_id: RoomId) -> Result<Option<RoomSettings>, RepoError> {
        let key = cache_keys::room_settings(room_id);
        if let Some(settings) = self.cache.read::<RoomSettings>(&key).await {
            return Ok(Some(settings));
        }

        let settings = self.repo.get(room_id).await?;
        if let Some(settings) = &settings {
            self.cache.write(key, settings);
        }
        Ok(settings)
    }

    pub async fn get_for_update(&self, room_id: RoomId) -> Result<Option<RoomSettings>, RepoError> {
        self.repo.get_for_update(room_id).await
    }

    pub async fn save(&self, room_id: RoomId, settings: &RoomSettings) -> Result<(), RepoError> {
        self.repo.save(room_id, settings).await?;
        self.cache.invalidate(cache_keys::room_settings(room_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::background::BackgroundTasks;
    use crate::infrastructure::cache::MemoryCacheStore;
    use crate::infrastructure::metrics::LobbyMetrics;
    use crate::infrastructure::ports::{CacheStore, MockSettingsRepo};
    use std::time::Duration;

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let room_id = RoomId::new();
        let stored = RoomSettings::new(45, 90, false, true).unwrap();

        let mut durable = MockSettingsRepo::new();
        durable
            .expect_get()
            .times(1)
            .returning(move |_| Ok(Some(stored)));

        let metrics = Arc::new(LobbyMetrics::new());
        let store = Arc::new(MemoryCacheStore::new());
        let cache = CacheAside::new(
            store.clone() as Arc<dyn CacheStore>,
            BackgroundTasks::new(4, metrics.clone()),
            metrics,
            Duration::from_secs(60),
        );
        let repo = SettingsRepository::new(Arc::new(durable), cache.clone());

        assert_eq!(repo.get(room_id).await.unwrap(), Some(stored));
        cache.idle().await;
        assert_eq!(repo.get(room_id).await.unwrap(), Some(stored));
    }

    #[tokio::test]
    async fn missing_settings_are_not_cached() {
        let mut durable = MockSettingsRepo::new();
        durable.expect_get().times(2).returning(|_| Ok(None));

        let metrics = Arc::new(LobbyMetrics::new());
        let store = Arc::new(MemoryCacheStore::new());
        let cache = CacheAside::new(
            store.clone() as Arc<dyn CacheStore>,
            BackgroundTasks::new(4, metrics.clone()),
            metrics,
            Duration::from_secs(60),
        );
        let repo = SettingsRepository::new(Arc::new(durable), cache.clone());
        let room_id = RoomId::new();

        assert_eq!(repo.get(room_id).await.unwrap(), None);
        cache.idle().await;
        assert_eq!(repo.get(room_id).await.unwrap(), None);
        assert!(store.is_empty().await);
    }
}
