//! Per-room mutual exclusion for lifecycle operations.
//!
//! One async mutex per room id, created on demand. Entries are removed when
//! the last holder or waiter lets go, so the map only holds busy rooms.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use quizlobby_domain::RoomId;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<RoomId, Arc<Mutex<()>>>;

#[derive(Debug, thiserror::Error)]
#[error("Room {room_id} is busy (waited {waited:?})")]
pub struct RoomBusy {
    pub room_id: RoomId,
    pub waited: Duration,
}

#[derive(Clone, Default)]
pub struct RoomLocks {
    locks: Arc<LockMap>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `timeout` for exclusive access to `room_id`.
    pub async fn acquire(&self, room_id: RoomId, timeout: Duration) -> Result<RoomGuard, RoomBusy> {
        let lock = Arc::clone(
            self.locks
                .entry(room_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );

        match tokio::time::timeout(timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(RoomGuard {
                room_id,
                guard: Some(guard),
                locks: Arc::clone(&self.locks),
            }),
            Err(_) => {
                release_if_idle(&self.locks, room_id);
                tracing::warn!(room_id = %room_id, waited_ms = timeout.as_millis() as u64, "Timed out waiting for room lock");
                Err(RoomBusy {
                    room_id,
                    waited: timeout,
                })
            }
        }
    }

    /// Rooms with a holder or waiter.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

fn release_if_idle(locks: &LockMap, room_id: RoomId) {
    locks.remove_if(&room_id, |_, lock| Arc::strong_count(lock) == 1);
}

/// Exclusive access to one room; released on drop.
pub struct RoomGuard {
    room_id: RoomId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl RoomGuard {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        // The owned guard keeps its own Arc; release it before counting.
        drop(self.guard.take());
        release_if_idle(&self.locks, self.room_id);
    }
}
