//! Advisory cache indices: the public room listing, each room's member set
//! and each user's current room.
//!
//! Nothing here is authoritative. Readers treat a miss or an error as "ask
//! the durable store", and the lobby never makes a decision from an index.

use quizlobby_domain::{Membership, Room, RoomId, UserId};

use super::cache_aside::CacheAside;
use super::cache_keys;
use crate::infrastructure::ports::CacheError;

#[derive(Clone)]
pub struct RoomIndex {
    cache: CacheAside,
}

impl RoomIndex {
    pub fn new(cache: CacheAside) -> Self {
        Self { cache }
    }

    /// Rebuild the indices for `room` from its committed active members.
    /// `departed` users lose their current-room pointer.
    pub fn room_changed(&self, room: &Room, active: &[Membership], departed: &[UserId]) {
        let room_id = room.id();
        let listed = room.is_public() && room.is_waiting();
        let score = room.created_at().timestamp_millis() as f64;
        let members: Vec<UserId> = active.iter().map(|m| m.user_id()).collect();
        let departed = departed.to_vec();

        self.cache.spawn("index_room", move |store, ttl| async move {
            let member = room_id.to_string();
            if listed {
                store
                    .sorted_add(cache_keys::ACTIVE_ROOMS, member, score, ttl)
                    .await?;
            } else {
                store
                    .sorted_remove(cache_keys::ACTIVE_ROOMS, &member)
                    .await?;
            }

            let roster = members.iter().map(UserId::to_string).collect();
            store
                .set_replace(&cache_keys::room_players(room_id), roster, ttl)
                .await?;
            let pointer = room_pointer(room_id);
            for user_id in &members {
                store
                    .set(&cache_keys::user_current_room(*user_id), pointer.clone(), ttl)
                    .await?;
            }
            for user_id in &departed {
                store.delete(&cache_keys::user_current_room(*user_id)).await?;
            }
            Ok::<(), CacheError>(())
        });
    }

    /// Remove a terminal room from every index.
    pub fn room_closed(&self, room_id: RoomId, departed: &[UserId]) {
        let departed = departed.to_vec();
        self.cache.spawn("index_room_closed", move |store, _| async move {
            store
                .sorted_remove(cache_keys::ACTIVE_ROOMS, &room_id.to_string())
                .await?;
            store.delete(&cache_keys::room_players(room_id)).await?;
            for user_id in &departed {
                store.delete(&cache_keys::user_current_room(*user_id)).await?;
            }
            Ok::<(), CacheError>(())
        });
    }

    /// A page of listed room ids (newest first) and the listing size.
    /// `None` when the index is empty or unreadable.
    pub async fn listing_page(&self, offset: usize, limit: usize) -> Option<(Vec<RoomId>, u64)> {
        let store = self.cache.store();
        let total = match store.sorted_len(cache_keys::ACTIVE_ROOMS).await {
            Ok(0) => return None,
            Ok(total) => total,
            Err(e) => {
                self.cache
                    .record_error("sorted_len", cache_keys::ACTIVE_ROOMS, &e);
                return None;
            }
        };

        let members = match store
            .sorted_range_desc(cache_keys::ACTIVE_ROOMS, offset, limit)
            .await
        {
            Ok(members) => members,
            Err(e) => {
                self.cache
                    .record_error("sorted_range_desc", cache_keys::ACTIVE_ROOMS, &e);
                return None;
            }
        };

        let ids = members
            .iter()
            .map(|member| member.parse::<RoomId>())
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        Some((ids, total))
    }

    /// Indexed member ids of `room_id`. Empty on miss or error.
    pub async fn members(&self, room_id: RoomId) -> Vec<UserId> {
        let key = cache_keys::room_players(room_id);
        match self.cache.store().set_members(&key).await {
            Ok(members) => members.iter().filter_map(|m| m.parse().ok()).collect(),
            Err(e) => {
                self.cache.record_error("set_members", &key, &e);
                Vec::new()
            }
        }
    }

    /// The room the pointer claims `user_id` is in. Verify before trusting.
    pub async fn current_room(&self, user_id: UserId) -> Option<RoomId> {
        self.cache
            .read::<RoomId>(&cache_keys::user_current_room(user_id))
            .await
    }

    pub fn repair_pointer(&self, user_id: UserId, room_id: Option<RoomId>) {
        let key = cache_keys::user_current_room(user_id);
        match room_id {
            Some(room_id) => self.cache.write(key, &room_id),
            None => self.cache.invalidate(key),
        }
    }

    pub async fn idle(&self) {
        self.cache.idle().await;
    }
}

/// Pointer values are JSON so they decode through [`CacheAside::read`].
fn room_pointer(room_id: RoomId) -> String {
    format!("\"{room_id}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::background::BackgroundTasks;
    use crate::infrastructure::cache::MemoryCacheStore;
    use crate::infrastructure::metrics::LobbyMetrics;
    use crate::infrastructure::sqlite::test_support::{host_of, player_in, room};
    use quizlobby_domain::Visibility;
    use std::sync::Arc;
    use std::time::Duration;

    fn index() -> (RoomIndex, Arc<MemoryCacheStore>) {
        let metrics = Arc::new(LobbyMetrics::new());
        let store = Arc::new(MemoryCacheStore::new());
        let cache = CacheAside::new(
            store.clone(),
            BackgroundTasks::new(8, metrics.clone()),
            metrics,
            Duration::from_secs(7200),
        );
        (RoomIndex::new(cache), store)
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let (index, _) = index();
        let older = room("OLD001", 1);
        let newer = room("NEW001", 5);
        index.room_changed(&older, &[host_of(&older)], &[]);
        index.idle().await;
        index.room_changed(&newer, &[host_of(&newer)], &[]);
        index.idle().await;

        let (ids, total) = index.listing_page(0, 10).await.unwrap();
        assert_eq!(ids, vec![newer.id(), older.id()]);
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn private_and_started_rooms_leave_the_listing() {
        let (index, _) = index();
        let public = room("PUB001", 1);
        index.room_changed(&public, &[host_of(&public)], &[]);
        index.idle().await;

        let private = public.clone().with_visibility(Visibility::Private);
        index.room_changed(&private, &[host_of(&private)], &[]);
        index.idle().await;

        assert_eq!(index.listing_page(0, 10).await, None);
    }

    #[tokio::test]
    async fn member_set_and_pointers_follow_active_members() {
        let (index, _) = index();
        let room = room("MEM001", 0);
        let host = host_of(&room);
        let player = player_in(&room, 3);

        index.room_changed(&room, &[host.clone(), player.clone()], &[]);
        index.idle().await;
        let mut members = index.members(room.id()).await;
        members.sort();
        let mut expected = vec![host.user_id(), player.user_id()];
        expected.sort();
        assert_eq!(members, expected);
        assert_eq!(index.current_room(player.user_id()).await, Some(room.id()));

        index.room_changed(&room, &[host.clone()], &[player.user_id()]);
        index.idle().await;
        assert_eq!(index.members(room.id()).await, vec![host.user_id()]);
        assert_eq!(index.current_room(player.user_id()).await, None);

        index.room_closed(room.id(), &[host.user_id()]);
        index.idle().await;
        assert!(index.members(room.id()).await.is_empty());
        assert_eq!(index.current_room(host.user_id()).await, None);
    }

    #[tokio::test]
    async fn overlapping_rebuilds_never_merge_rosters() {
        let (index, _) = index();
        let room = room("RACE01", 0);
        let host = host_of(&room);
        let early = player_in(&room, 1);
        let late = player_in(&room, 2);

        index.room_changed(&room, &[host.clone(), early.clone()], &[]);
        index.room_changed(&room, &[host.clone(), late.clone()], &[early.user_id()]);
        index.idle().await;

        let members = index.members(room.id()).await;
        assert_eq!(members.len(), 2);
        assert!(members.contains(&host.user_id()));
    }
}
