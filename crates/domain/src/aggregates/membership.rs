//! Membership aggregate - one user's stay in one room
//!
//! A membership is active until `left_at` is set. Leaving never deletes the
//! row; rejoining creates a new membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::MemberRole;
use crate::{MembershipId, RoomId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    // Identity
    id: MembershipId,
    room_id: RoomId,
    user_id: UserId,

    // Profile snapshot taken at join time
    username: String,
    avatar_url: Option<String>,

    // State
    role: MemberRole,
    ready: bool,
    joined_at: DateTime<Utc>,
    left_at: Option<DateTime<Utc>>,
}

impl Membership {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn new(
        id: MembershipId,
        room_id: RoomId,
        user_id: UserId,
        username: impl Into<String>,
        role: MemberRole,
        joined_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            room_id,
            user_id,
            username: username.into(),
            avatar_url: None,
            role,
            ready: false,
            joined_at,
            left_at: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> MembershipId {
        self.id
    }

    #[inline]
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    #[inline]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[inline]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[inline]
    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref()
    }

    #[inline]
    pub fn role(&self) -> MemberRole {
        self.role
    }

    #[inline]
    pub fn is_host(&self) -> bool {
        self.role.is_host()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[inline]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    #[inline]
    pub fn left_at(&self) -> Option<DateTime<Utc>> {
        self.left_at
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.left_at.is_none()
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }

    /// Set ready flag and leave time (used when loading from storage).
    pub fn with_state(mut self, ready: bool, left_at: Option<DateTime<Utc>>) -> Self {
        self.ready = ready;
        self.left_at = left_at;
        self
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Close the membership. Fails if it is already closed.
    pub fn leave(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.left_at.is_some() {
            return Err(DomainError::constraint("Membership already closed"));
        }
        self.left_at = Some(now);
        self.ready = false;
        Ok(())
    }

    pub fn set_role(&mut self, role: MemberRole) {
        self.role = role;
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }
}

/// Pick the member that inherits the host role: earliest `joined_at`, then
/// lowest membership id.
pub fn longest_tenured<'a, I>(members: I) -> Option<&'a Membership>
where
    I: IntoIterator<Item = &'a Membership>,
{
    members
        .into_iter()
        .filter(|m| m.is_active())
        .min_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.id.cmp(&b.id))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, second).unwrap()
    }

    fn member(joined: u32) -> Membership {
        Membership::new(
            MembershipId::new(),
            RoomId::new(),
            UserId::new(),
            "player",
            MemberRole::Player,
            at(joined),
        )
    }

    #[test]
    fn leave_closes_once() {
        let mut m = member(0);
        m.set_ready(true);
        m.leave(at(5)).unwrap();
        assert!(!m.is_active());
        assert!(!m.is_ready());
        assert!(m.leave(at(6)).is_err());
    }

    #[test]
    fn longest_tenured_prefers_earliest_join() {
        let a = member(3);
        let b = member(1);
        let c = member(2);
        let members = [a, b.clone(), c];
        assert_eq!(longest_tenured(&members).map(|m| m.id()), Some(b.id()));
    }

    #[test]
    fn longest_tenured_breaks_ties_by_id() {
        let a = member(1);
        let b = member(1);
        let expected = a.id().min(b.id());
        let members = [a, b];
        assert_eq!(longest_tenured(&members).map(|m| m.id()), Some(expected));
    }

    #[test]
    fn longest_tenured_skips_closed_members() {
        let mut gone = member(0);
        gone.leave(at(1)).unwrap();
        let stays = member(2);
        let members = [gone, stays.clone()];
        assert_eq!(longest_tenured(&members).map(|m| m.id()), Some(stays.id()));
    }
}
