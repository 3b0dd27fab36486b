//! Room repository: cache-aside over the durable room store.

use std::sync::Arc;

use quizlobby_domain::{Membership, Room, RoomCode, RoomId, RoomSettings};

use super::cache_aside::CacheAside;
use super::cache_keys;
use crate::infrastructure::ports::{RepoError, RoomRepo};

pub struct RoomRepository {
    repo: Arc<dyn RoomRepo>,
    cache: CacheAside,
}

impl RoomRepository {
    pub fn new(repo: Arc<dyn RoomRepo>, cache: CacheAside) -> Self {
        Self { repo, cache }
    }

    /// Cached read, for queries only.
    pub async fn get(&self, id: RoomId) -> Result<Option<Room>, RepoError> {
        let key = cache_keys::room_meta(id);
        if let Some(room) = self.cache.read::<Room>(&key).await {
            return Ok(Some(room));
        }

        let room = self.repo.get(id).await?;
        if let Some(room) = &room {
            self.cache.write(key, room);
        }
        Ok(room)
    }

    /// Durable read. Every mutation starts here.
    pub async fn get_for_update(&self, id: RoomId) -> Result<Option<Room>, RepoError> {
        self.repo.get_for_update(id).await
    }

    pub async fn find_open_by_code(&self, code: &RoomCode) -> Result<Option<Room>, RepoError> {
        self.repo.find_open_by_code(code).await
    }

    pub async fn create_with_host(
        &self,
        room: &Room,
        settings: &RoomSettings,
        host: &Membership,
    ) -> Result<(), RepoError> {
        self.repo.create_with_host(room, settings, host).await?;
        self.cache.write(cache_keys::room_meta(room.id()), room);
        self.cache.write(cache_keys::room_settings(room.id()), settings);
        Ok(())
    }

    pub async fn save(&self, room: &Room) -> Result<(), RepoError> {
        self.repo.save(room).await?;
        self.cache.invalidate(cache_keys::room_meta(room.id()));
        Ok(())
    }

    pub async fn save_with_members(
        &self,
        room: &Room,
        members: &[Membership],
    ) -> Result<(), RepoError> {
        self.repo.save_with_members(room, members).await?;
        self.cache.invalidate(cache_keys::room_meta(room.id()));
        Ok(())
    }

    pub async fn save_with_settings(
        &self,
        room: &Room,
        settings: &RoomSettings,
    ) -> Result<(), RepoError> {
        self.repo.save_with_settings(room, settings).await?;
        self.cache.invalidate(cache_keys::room_meta(room.id()));
        self.cache.invalidate(cache_keys::room_settings(room.id()));
        Ok(())
    }

    pub async fn count_public_waiting(&self) -> Result<u64, RepoError> {
        self.repo.count_public_waiting().await
    }

    /// Public WAITING rooms newest first, from the durable store.
    pub async fn list_public_waiting(&self, limit: u32, offset: u32) -> Result<Vec<Room>, RepoError> {
        self.repo.list_public_waiting(limit, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::background::BackgroundTasks;
    use crate::infrastructure::cache::MemoryCacheStore;
    use crate::infrastructure::metrics::LobbyMetrics;
    use crate::infrastructure::ports::{CacheError, CacheStore, MockCacheStore};
    use crate::infrastructure::sqlite::test_support::*;
    use std::time::Duration;

    fn cache_aside(store: Arc<dyn CacheStore>, metrics: Arc<LobbyMetrics>) -> CacheAside {
        CacheAside::new(
            store,
            BackgroundTasks::new(8, metrics.clone()),
            metrics,
            Duration::from_secs(7200),
        )
    }

    fn unavailable_cache() -> MockCacheStore {
        let mut cache = MockCacheStore::new();
        cache
            .expect_get()
            .returning(|_| Err(CacheError::Unavailable("connection refused".into())));
        cache
            .expect_set()
            .returning(|_, _, _| Err(CacheError::Unavailable("connection refused".into())));
        cache
            .expect_delete()
            .returning(|_| Err(CacheError::Unavailable("connection refused".into())));
        cache
    }

    #[tokio::test]
    async fn read_populates_cache_after_miss() {
        let db = test_db().await;
        let (rooms, _, _) = repos(&db);
        let room = room("MISS01", 0);
        rooms
            .create_with_host(&room, &RoomSettings::default(), &host_of(&room))
            .await
            .unwrap();

        let store = Arc::new(MemoryCacheStore::new());
        let cache = cache_aside(store.clone(), Arc::new(LobbyMetrics::new()));
        let repo = RoomRepository::new(rooms, cache.clone());

        assert_eq!(repo.get(room.id()).await.unwrap(), Some(room.clone()));
        cache.idle().await;

        let cached = store.get(&cache_keys::room_meta(room.id())).await.unwrap();
        let cached: Room = serde_json::from_str(&cached.unwrap()).unwrap();
        assert_eq!(cached, room);
    }

    #[tokio::test]
    async fn unavailable_cache_falls_back_to_durable_store() {
        let db = test_db().await;
        let (rooms, _, _) = repos(&db);
        let metrics = Arc::new(LobbyMetrics::new());
        let cache = cache_aside(Arc::new(unavailable_cache()), metrics.clone());
        let repo = RoomRepository::new(rooms, cache.clone());

        let room = room("DOWN01", 0);
        repo.create_with_host(&room, &RoomSettings::default(), &host_of(&room))
            .await
            .unwrap();

        assert_eq!(repo.get(room.id()).await.unwrap(), Some(room));
        cache.idle().await;
        assert!(metrics.snapshot().cache_errors >= 1);
    }

    #[tokio::test]
    async fn save_invalidates_cached_meta() {
        let db = test_db().await;
        let (rooms, _, _) = repos(&db);
        let store = Arc::new(MemoryCacheStore::new());
        let cache = cache_aside(store.clone(), Arc::new(LobbyMetrics::new()));
        let repo = RoomRepository::new(rooms, cache.clone());

        let mut room = room("SAVE01", 0);
        repo.create_with_host(&room, &RoomSettings::default(), &host_of(&room))
            .await
            .unwrap();
        cache.idle().await;

        room.cancel(at(10)).unwrap();
        repo.save(&room).await.unwrap();
        cache.idle().await;

        assert_eq!(
            store.get(&cache_keys::room_meta(room.id())).await.unwrap(),
            None
        );
        assert_eq!(repo.get(room.id()).await.unwrap(), Some(room));
    }
}
