//! SQLite room storage.

use async_trait::async_trait;
use quizlobby_domain::{
    Membership, PackId, PasswordHash, Room, RoomCode, RoomId, RoomName, RoomSettings, RoomStatus,
    UserId, Visibility, MIN_PLAYERS,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};

use super::memberships::{insert_membership, update_membership};
use super::settings::upsert_settings;
use super::{format_ts, parse_opt_ts, parse_ts, write_error};
use crate::infrastructure::ports::{RepoError, RoomRepo};

const SELECT_ROOM: &str = r#"
    SELECT id, room_code, host_id, pack_id, name, status, max_players, is_public,
           password_hash, created_at, updated_at, started_at, finished_at
    FROM game_rooms
"#;

pub struct SqliteRoomRepo {
    pool: SqlitePool,
}

impl SqliteRoomRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, id: RoomId) -> Result<Option<Room>, RepoError> {
        let row = sqlx::query(&format!("{SELECT_ROOM} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("get_room", e))?;

        row.as_ref().map(room_from_row).transpose()
    }
}

async fn update_room<'e, E>(executor: E, room: &Room) -> Result<(), RepoError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE game_rooms
        SET host_id = ?, status = ?, max_players = ?, is_public = ?, password_hash = ?,
            updated_at = ?, started_at = ?, finished_at = ?
        WHERE id = ?
        "#,
    )
    .bind(room.host_id().to_string())
    .bind(room.status().as_str())
    .bind(room.max_players() as i64)
    .bind(room.is_public())
    .bind(room.password_hash().map(|h| h.as_str().to_string()))
    .bind(format_ts(room.updated_at()))
    .bind(room.started_at().map(format_ts))
    .bind(room.finished_at().map(format_ts))
    .bind(room.id().to_string())
    .execute(executor)
    .await
    .map_err(|e| write_error("update_room", e))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::not_found("Room", room.id()));
    }
    Ok(())
}

fn room_from_row(row: &SqliteRow) -> Result<Room, RepoError> {
    let id: String = row.get("id");
    let code: String = row.get("room_code");
    let host_id: String = row.get("host_id");
    let pack_id: String = row.get("pack_id");
    let name: String = row.get("name");
    let status: String = row.get("status");
    let max_players: i64 = row.get("max_players");
    let is_public: bool = row.get("is_public");
    let password_hash: Option<String> = row.get("password_hash");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let id: RoomId = id.parse().map_err(RepoError::serialization)?;
    let host_id: UserId = host_id.parse().map_err(RepoError::serialization)?;
    let pack_id: PackId = pack_id.parse().map_err(RepoError::serialization)?;
    let status: RoomStatus = status.parse().map_err(RepoError::serialization)?;
    let max_players = u32::try_from(max_players).map_err(RepoError::serialization)?;
    let created_at = parse_ts(&created_at)?;

    // Rooms are re-validated against their own stored limit.
    let room = Room::new(
        id,
        RoomCode::new(code).map_err(RepoError::serialization)?,
        host_id,
        pack_id,
        RoomName::new(name).map_err(RepoError::serialization)?,
        max_players,
        max_players.max(MIN_PLAYERS),
        created_at,
    )
    .map_err(RepoError::serialization)?;

    Ok(room
        .with_status(status)
        .with_visibility(Visibility::from_public_flag(is_public))
        .with_password_hash(password_hash.map(PasswordHash::from_encoded))
        .with_timestamps(
            created_at,
            parse_ts(&updated_at)?,
            parse_opt_ts(row.get("started_at"))?,
            parse_opt_ts(row.get("finished_at"))?,
        ))
}

#[async_trait]
impl RoomRepo for SqliteRoomRepo {
    async fn get(&self, id: RoomId) -> Result<Option<Room>, RepoError> {
        self.fetch_by_id(id).await
    }

    async fn get_for_update(&self, id: RoomId) -> Result<Option<Room>, RepoError> {
        self.fetch_by_id(id).await
    }

    async fn find_open_by_code(&self, code: &RoomCode) -> Result<Option<Room>, RepoError> {
        let row = sqlx::query(&format!(
            "{SELECT_ROOM} WHERE room_code = ? AND status NOT IN ('finished', 'cancelled')"
        ))
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("find_open_by_code", e))?;

        row.as_ref().map(room_from_row).transpose()
    }

    async fn create_with_host(
        &self,
        room: &Room,
        settings: &RoomSettings,
        host: &Membership,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("create_room", e))?;

        sqlx::query(
            r#"
            INSERT INTO game_rooms
                (id, room_code, host_id, pack_id, name, status, max_players, is_public,
                 password_hash, created_at, updated_at, started_at, finished_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(room.id().to_string())
        .bind(room.code().as_str())
        .bind(room.host_id().to_string())
        .bind(room.pack_id().to_string())
        .bind(room.name().as_str())
        .bind(room.status().as_str())
        .bind(room.max_players() as i64)
        .bind(room.is_public())
        .bind(room.password_hash().map(|h| h.as_str().to_string()))
        .bind(format_ts(room.created_at()))
        .bind(format_ts(room.updated_at()))
        .bind(room.started_at().map(format_ts))
        .bind(room.finished_at().map(format_ts))
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error("create_room", e))?;

        upsert_settings(&mut *tx, room.id(), settings).await?;
        insert_membership(&mut *tx, host).await?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("create_room", e))
    }

    async fn save(&self, room: &Room) -> Result<(), RepoError> {
        update_room(&self.pool, room).await
    }

    async fn save_with_members(
        &self,
        room: &Room,
        members: &[Membership],
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("save_room_with_members", e))?;

        update_room(&mut *tx, room).await?;
        for member in members {
            update_membership(&mut *tx, member).await?;
        }

        tx.commit()
            .await
            .map_err(|e| RepoError::database("save_room_with_members", e))
    }

    async fn save_with_settings(
        &self,
        room: &Room,
        settings: &RoomSettings,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::database("save_room_with_settings", e))?;

        upsert_settings(&mut *tx, room.id(), settings).await?;
        update_room(&mut *tx, room).await?;

        tx.commit()
            .await
            .map_err(|e| RepoError::database("save_room_with_settings", e))
    }

    async fn list_public_waiting(&self, limit: u32, offset: u32) -> Result<Vec<Room>, RepoError> {
        let rows = sqlx::query(&format!(
            "{SELECT_ROOM} WHERE status = 'waiting' AND is_public = 1 \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("list_public_waiting", e))?;

        rows.iter().map(room_from_row).collect()
    }

    async fn count_public_waiting(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM game_rooms WHERE status = 'waiting' AND is_public = 1",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::database("count_public_waiting", e))?;

        Ok(count as u64)
    }
}
