//! SQLite membership storage.

use async_trait::async_trait;
use quizlobby_domain::{MemberRole, Membership, MembershipId, RoomId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};

use super::{format_ts, parse_opt_ts, parse_ts, write_error};
use crate::infrastructure::ports::{MembershipRepo, RepoError};

const SELECT_MEMBERSHIP: &str = r#"
    SELECT id, room_id, user_id, username, avatar_url, role, is_ready, joined_at, left_at
    FROM room_players
"#;

pub struct SqliteMembershipRepo {
    pool: SqlitePool,
}

impl SqliteMembershipRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

pub(super) async fn insert_membership<'e, E>(
    executor: E,
    membership: &Membership,
) -> Result<(), RepoError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO room_players
            (id, room_id, user_id, username, avatar_url, role, is_ready, joined_at, left_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(membership.id().to_string())
    .bind(membership.room_id().to_string())
    .bind(membership.user_id().to_string())
    .bind(membership.username())
    .bind(membership.avatar_url())
    .bind(membership.role().as_str())
    .bind(membership.is_ready())
    .bind(format_ts(membership.joined_at()))
    .bind(membership.left_at().map(format_ts))
    .execute(executor)
    .await
    .map_err(|e| write_error("insert_membership", e))?;
    Ok(())
}

/// Update the mutable columns of an existing membership.
pub(super) async fn update_membership<'e, E>(
    executor: E,
    membership: &Membership,
) -> Result<(), RepoError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE room_players
        SET role = ?, is_ready = ?, left_at = ?
        WHERE id = ?
        "#,
    )
    .bind(membership.role().as_str())
    .bind(membership.is_ready())
    .bind(membership.left_at().map(format_ts))
    .bind(membership.id().to_string())
    .execute(executor)
    .await
    .map_err(|e| write_error("update_membership", e))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::not_found("Membership", membership.id()));
    }
    Ok(())
}

fn membership_from_row(row: &SqliteRow) -> Result<Membership, RepoError> {
    let id: String = row.get("id");
    let room_id: String = row.get("room_id");
    let user_id: String = row.get("user_id");
    let role: String = row.get("role");
    let joined_at: String = row.get("joined_at");

    let id: MembershipId = id.parse().map_err(RepoError::serialization)?;
    let room_id: RoomId = room_id.parse().map_err(RepoError::serialization)?;
    let user_id: UserId = user_id.parse().map_err(RepoError::serialization)?;
    let role: MemberRole = role.parse().map_err(RepoError::serialization)?;

    Ok(Membership::new(
        id,
        room_id,
        user_id,
        row.get::<String, _>("username"),
        role,
        parse_ts(&joined_at)?,
    )
    .with_avatar_url(row.get("avatar_url"))
    .with_state(row.get("is_ready"), parse_opt_ts(row.get("left_at"))?))
}

#[async_trait]
impl MembershipRepo for SqliteMembershipRepo {
    async fn insert(&self, membership: &Membership) -> Result<(), RepoError> {
        insert_membership(&self.pool, membership).await
    }

    async fn save(&self, membership: &Membership) -> Result<(), RepoError> {
        update_membership(&self.pool, membership).await
    }

    async fn get_active(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<Option<Membership>, RepoError> {
        let row = sqlx::query(&format!(
            "{SELECT_MEMBERSHIP} WHERE room_id = ? AND user_id = ? AND left_at IS NULL"
        ))
        .bind(room_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_active_membership", e))?;

        row.as_ref().map(membership_from_row).transpose()
    }

    async fn find_active_by_user(&self, user_id: UserId) -> Result<Option<Membership>, RepoError> {
        let row = sqlx::query(&format!(
            "{SELECT_MEMBERSHIP} WHERE user_id = ? AND left_at IS NULL"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("find_active_by_user", e))?;

        row.as_ref().map(membership_from_row).transpose()
    }

    async fn list_active(&self, room_id: RoomId) -> Result<Vec<Membership>, RepoError> {
        let rows = sqlx::query(&format!(
            "{SELECT_MEMBERSHIP} WHERE room_id = ? AND left_at IS NULL ORDER BY joined_at ASC, id ASC"
        ))
        .bind(room_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("list_active_memberships", e))?;

        rows.iter().map(membership_from_row).collect()
    }

    async fn count_active(&self, room_id: RoomId) -> Result<u32, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM room_players WHERE room_id = ? AND left_at IS NULL",
        )
        .bind(room_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::database("count_active_memberships", e))?;

        Ok(count as u32)
    }
}
