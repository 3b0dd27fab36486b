//! Lobby configuration loaded from the environment.

use std::str::FromStr;
use std::time::Duration;

use quizlobby_domain::{DEFAULT_CODE_CHARSET, DEFAULT_CODE_LENGTH};
use quizlobby_shared::GAME_EVENTS_TOPIC;

use crate::infrastructure::resilient::RetryPolicy;

/// Runtime configuration for the lobby engine.
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// SQLite database file.
    pub database_path: String,

    /// TTL applied to every cache entry.
    pub cache_ttl: Duration,
    /// How often expired cache entries are swept.
    pub cache_cleanup_interval: Duration,

    pub code_length: usize,
    pub code_charset: String,
    pub code_max_attempts: u32,

    /// Upper bound hosts may pick for `maxPlayers`.
    pub max_players_limit: u32,

    pub identity_url: String,
    pub pack_url: String,
    pub game_url: String,
    pub broker_url: String,
    pub broker_topic: String,

    /// Retry/backoff/timeout for peer calls.
    pub peer_retry: RetryPolicy,

    /// Pending events a slow live subscriber may hold before publishes fail.
    pub live_buffer_capacity: usize,
    /// Concurrent background tasks (cache refreshes, broker sends).
    pub background_concurrency: usize,
    /// Longest a lifecycle operation waits for the room token.
    pub lock_timeout: Duration,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            database_path: "lobby.db".into(),
            cache_ttl: Duration::from_secs(7200),
            cache_cleanup_interval: Duration::from_secs(60),
            code_length: DEFAULT_CODE_LENGTH,
            code_charset: DEFAULT_CODE_CHARSET.into(),
            code_max_attempts: 100,
            max_players_limit: 12,
            identity_url: "http://localhost:8081".into(),
            pack_url: "http://localhost:8082".into(),
            game_url: "http://localhost:8083".into(),
            broker_url: "http://localhost:8084".into(),
            broker_topic: GAME_EVENTS_TOPIC.into(),
            peer_retry: RetryPolicy::default(),
            live_buffer_capacity: 100,
            background_concurrency: 64,
            lock_timeout: Duration::from_secs(10),
        }
    }
}

impl LobbyConfig {
    /// Build configuration from `LOBBY_*` environment variables.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honored.
    /// Unset variables keep their defaults; unparsable ones are logged and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let retry = defaults.peer_retry.clone();

        Self {
            database_path: env_string("LOBBY_DB_PATH", defaults.database_path),
            cache_ttl: Duration::from_secs(env_parse(
                "LOBBY_CACHE_TTL_SECS",
                defaults.cache_ttl.as_secs(),
            )),
            cache_cleanup_interval: Duration::from_secs(env_parse(
                "LOBBY_CACHE_CLEANUP_SECS",
                defaults.cache_cleanup_interval.as_secs(),
            )),
            code_length: env_parse("LOBBY_CODE_LENGTH", defaults.code_length),
            code_charset: env_string("LOBBY_CODE_CHARSET", defaults.code_charset),
            code_max_attempts: env_parse("LOBBY_CODE_MAX_ATTEMPTS", defaults.code_max_attempts),
            max_players_limit: env_parse("LOBBY_MAX_PLAYERS_LIMIT", defaults.max_players_limit),
            identity_url: env_string("LOBBY_IDENTITY_URL", defaults.identity_url),
            pack_url: env_string("LOBBY_PACK_URL", defaults.pack_url),
            game_url: env_string("LOBBY_GAME_URL", defaults.game_url),
            broker_url: env_string("LOBBY_BROKER_URL", defaults.broker_url),
            broker_topic: env_string("LOBBY_BROKER_TOPIC", defaults.broker_topic),
            peer_retry: RetryPolicy {
                max_attempts: env_parse("LOBBY_PEER_MAX_ATTEMPTS", retry.max_attempts),
                initial_backoff: Duration::from_millis(env_parse(
                    "LOBBY_PEER_INITIAL_BACKOFF_MS",
                    retry.initial_backoff.as_millis() as u64,
                )),
                max_backoff: Duration::from_millis(env_parse(
                    "LOBBY_PEER_MAX_BACKOFF_MS",
                    retry.max_backoff.as_millis() as u64,
                )),
                call_timeout: Duration::from_millis(env_parse(
                    "LOBBY_PEER_TIMEOUT_MS",
                    retry.call_timeout.as_millis() as u64,
                )),
                jitter_factor: retry.jitter_factor,
            },
            live_buffer_capacity: env_parse(
                "LOBBY_LIVE_BUFFER_CAPACITY",
                defaults.live_buffer_capacity,
            ),
            background_concurrency: env_parse(
                "LOBBY_BACKGROUND_CONCURRENCY",
                defaults.background_concurrency,
            ),
            lock_timeout: Duration::from_millis(env_parse(
                "LOBBY_LOCK_TIMEOUT_MS",
                defaults.lock_timeout.as_millis() as u64,
            )),
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    variable = name,
                    value = %raw,
                    default = %default,
                    "Invalid configuration value, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
