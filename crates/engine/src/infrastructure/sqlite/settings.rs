//! SQLite-backed room settings storage.

use async_trait::async_trait;
use quizlobby_domain::{RoomId, RoomSettings};
use sqlx::{Row, SqliteExecutor, SqlitePool};

use super::write_error;
use crate::infrastructure::ports::{RepoError, SettingsRepo};

pub struct SqliteSettingsRepo {
    pool: SqlitePool,
}

impl SqliteSettingsRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, room_id: RoomId) -> Result<Option<RoomSettings>, RepoError> {
        let row = sqlx::query(
            r#"
            SELECT time_for_answer, time_for_choice, allow_wrong_answer, show_right_answer
            FROM room_settings
            WHERE room_id = ?
            "#,
        )
        .bind(room_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::database("get_settings", e))?;

        match row {
            Some(row) => {
                let time_for_answer: i64 = row.get("time_for_answer");
                let time_for_choice: i64 = row.get("time_for_choice");
                let settings = RoomSettings::new(
                    u32::try_from(time_for_answer).map_err(RepoError::serialization)?,
                    u32::try_from(time_for_choice).map_err(RepoError::serialization)?,
                    row.get("allow_wrong_answer"),
                    row.get("show_right_answer"),
                )
                .map_err(RepoError::serialization)?;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }
}

pub(super) async fn upsert_settings<'e, E>(
    executor: E,
    room_id: RoomId,
    settings: &RoomSettings,
) -> Result<(), RepoError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO room_settings
            (room_id, time_for_answer, time_for_choice, allow_wrong_answer, show_right_answer)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (room_id) DO UPDATE SET
            time_for_answer = excluded.time_for_answer,
            time_for_choice = excluded.time_for_choice,
            allow_wrong_answer = excluded.allow_wrong_answer,
            show_right_answer = excluded.show_right_answer
        "#,
    )
    .bind(room_id.to_string())
    .bind(settings.time_for_answer() as i64)
    .bind(settings.time_for_choice() as i64)
    .bind(settings.allow_wrong_answer())
    .bind(settings.show_right_answer())
    .execute(executor)
    .await
    .map_err(|e| write_error("save_settings", e))?;
    Ok(())
}

#[async_trait]
impl SettingsRepo for SqliteSettingsRepo {
    async fn get(&self, room_id: RoomId) -> Result<Option<RoomSettings>, RepoError> {
        self.fetch(room_id).await
    }

    async fn get_for_update(&self, room_id: RoomId) -> Result<Option<RoomSettings>, RepoError> {
        self.fetch(room_id).await
    }

    async fn save(&self, room_id: RoomId, settings: &RoomSettings) -> Result<(), RepoError> {
        upsert_settings(&self.pool, room_id, settings).await
    }
}
