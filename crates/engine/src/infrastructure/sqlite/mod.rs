//! SQLite-backed durable lobby store.
//!
//! One database holds three tables: `game_rooms`, `room_players` and
//! `room_settings`. Two partial unique indexes back the lobby invariants:
//! a room code is unique among non-terminal rooms, and a user has at most
//! one active membership.

mod memberships;
mod rooms;
mod settings;

pub use memberships::SqliteMembershipRepo;
pub use rooms::SqliteRoomRepo;
pub use settings::SqliteSettingsRepo;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

/// Open (creating if needed) the lobby database and ensure its schema.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    let pool = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .map_err(|e| RepoError::database("connect", e))?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Create tables and indexes if they do not exist.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), RepoError> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS game_rooms (
            id TEXT PRIMARY KEY,
            room_code TEXT NOT NULL,
            host_id TEXT NOT NULL,
            pack_id TEXT NOT NULL,
            name TEXT NOT NULL,
            status TEXT NOT NULL,
            max_players INTEGER NOT NULL,
            is_public INTEGER NOT NULL,
            password_hash TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            started_at TEXT,
            finished_at TEXT
        )
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_game_rooms_open_code
            ON game_rooms (room_code)
            WHERE status NOT IN ('finished', 'cancelled')
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_game_rooms_listing
            ON game_rooms (status, is_public, created_at)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS room_players (
            id TEXT PRIMARY KEY,
            room_id TEXT NOT NULL REFERENCES game_rooms (id),
            user_id TEXT NOT NULL,
            username TEXT NOT NULL,
            avatar_url TEXT,
            role TEXT NOT NULL,
            is_ready INTEGER NOT NULL DEFAULT 0,
            joined_at TEXT NOT NULL,
            left_at TEXT
        )
        "#,
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_room_players_one_active
            ON room_players (user_id)
            WHERE left_at IS NULL
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_room_players_room
            ON room_players (room_id, left_at)
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS room_settings (
            room_id TEXT PRIMARY KEY REFERENCES game_rooms (id),
            time_for_answer INTEGER NOT NULL,
            time_for_choice INTEGER NOT NULL,
            allow_wrong_answer INTEGER NOT NULL,
            show_right_answer INTEGER NOT NULL
        )
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| RepoError::database("ensure_schema", e))?;
    }
    Ok(())
}

/// Fixed-width timestamp text so `ORDER BY` on the column is chronological.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("bad timestamp {raw:?}: {e}")))
}

pub(crate) fn parse_opt_ts(raw: Option<String>) -> Result<Option<DateTime<Utc>>, RepoError> {
    raw.as_deref().map(parse_ts).transpose()
}

/// Unique-index violations become `ConstraintViolation`; everything else is a database error.
pub(crate) fn write_error(operation: &'static str, e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::constraint(format!("{operation}: {}", db.message()))
        }
        _ => RepoError::database(operation, e),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use quizlobby_domain::{
        MemberRole, Membership, MembershipId, PackId, Room, RoomCode, RoomId, RoomName, UserId,
    };
    use sqlx::SqlitePool;
    use tempfile::TempDir;

    use super::*;

    pub struct TestDb {
        pub pool: SqlitePool,
        _dir: TempDir,
    }

    pub async fn test_db() -> TestDb {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lobby.db");
        let pool = connect(&path.to_string_lossy()).await.expect("connect");
        TestDb { pool, _dir: dir }
    }

    pub fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, second).unwrap()
    }

    pub fn room(code: &str, created: u32) -> Room {
        Room::new(
            RoomId::new(),
            RoomCode::new(code).unwrap(),
            UserId::new(),
            PackId::new(),
            RoomName::new("Quiz Night").unwrap(),
            6,
            12,
            at(created),
        )
        .unwrap()
    }

    pub fn host_of(room: &Room) -> Membership {
        Membership::new(
            MembershipId::new(),
            room.id(),
            room.host_id(),
            "host",
            MemberRole::Host,
            room.created_at(),
        )
    }

    pub fn player_in(room: &Room, joined: u32) -> Membership {
        Membership::new(
            MembershipId::new(),
            room.id(),
            UserId::new(),
            format!("player-{joined}"),
            MemberRole::Player,
            at(joined),
        )
    }

    pub fn repos(
        db: &TestDb,
    ) -> (
        Arc<SqliteRoomRepo>,
        Arc<SqliteMembershipRepo>,
        Arc<SqliteSettingsRepo>,
    ) {
        (
            Arc::new(SqliteRoomRepo::new(db.pool.clone())),
            Arc::new(SqliteMembershipRepo::new(db.pool.clone())),
            Arc::new(SqliteSettingsRepo::new(db.pool.clone())),
        )
    }

    /// Make every UPDATE of a `game_rooms` row matching `condition` (SQL over
    /// `OLD`) abort, as a failing disk would.
    pub async fn fail_room_updates(pool: &SqlitePool, condition: &str) {
        sqlx::query(&format!(
            "CREATE TRIGGER fail_room_updates BEFORE UPDATE ON game_rooms \
             WHEN {condition} BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END"
        ))
        .execute(pool)
        .await
        .expect("create trigger");
    }

    pub async fn heal_room_updates(pool: &SqlitePool) {
        sqlx::query("DROP TRIGGER IF EXISTS fail_room_updates")
            .execute(pool)
            .await
            .expect("drop trigger");
    }
}
