//! Membership repository.
//!
//! Membership reads decide invariants (capacity, one active room per user,
//! host election) so they always go to the durable store.

use std::sync::Arc;

use quizlobby_domain::{Membership, RoomId, UserId};

use crate::infrastructure::ports::{MembershipRepo, RepoError};

pub struct MembershipRepository {
    repo: Arc<dyn MembershipRepo>,
}

impl MembershipRepository {
    pub fn new(repo: Arc<dyn MembershipRepo>) -> Self {
        Self { repo }
    }

    pub async fn insert(&self, membership: &Membership) -> Result<(), RepoError> {
        self.repo.insert(membership).await
    }

    pub async fn save(&self, membership: &Membership) -> Result<(), RepoError> {
        self.repo.save(membership).await
    }

    pub async fn get_active(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Option<Membership>, RepoError> {
        self.repo.get_active(room_id, user_id).await
    }

    pub async fn find_active_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Membership>, RepoError> {
        self.repo.find_active_by_user(user_id).await
    }

    pub async fn list_active(&self, room_id: RoomId) -> Result<Vec<Membership>, RepoError> {
        self.repo.list_active(room_id).await
    }

    pub async fn count_active(&self, room_id: RoomId) -> Result<u32, RepoError> {
        self.repo.count_active(room_id).await
    }
}
