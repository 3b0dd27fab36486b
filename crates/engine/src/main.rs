//! Quiz Lobby Engine - Main entry point.
//!
//! Assembles the lobby core over SQLite, the in-process cache and the HTTP
//! peer clients, then runs its housekeeping loops until shutdown. Transports
//! embed the library and drive `App::use_cases`.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quizlobby_engine::app::{App, AppPorts};
use quizlobby_engine::infrastructure::{
    broker::HttpBroker,
    cache::MemoryCacheStore,
    clock::{SystemClock, SystemRandom},
    config::LobbyConfig,
    peers::{HttpGameClient, HttpIdentityClient, HttpPackClient},
    sqlite::{self, SqliteMembershipRepo, SqliteRoomRepo, SqliteSettingsRepo},
};

const METRICS_LOG_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quizlobby_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Quiz Lobby Engine");

    let config = LobbyConfig::from_env();

    tracing::info!(path = %config.database_path, "Opening lobby database");
    let pool = sqlite::connect(&config.database_path).await?;

    let cache = Arc::new(MemoryCacheStore::new());
    let peer_timeout = config.peer_retry.call_timeout;
    tracing::info!(
        identity = %config.identity_url,
        pack = %config.pack_url,
        game = %config.game_url,
        max_attempts = config.peer_retry.max_attempts,
        timeout_ms = peer_timeout.as_millis() as u64,
        "Peer clients configured"
    );

    let app = Arc::new(App::new(
        &config,
        AppPorts {
            rooms: Arc::new(SqliteRoomRepo::new(pool.clone())),
            memberships: Arc::new(SqliteMembershipRepo::new(pool.clone())),
            settings: Arc::new(SqliteSettingsRepo::new(pool)),
            cache: cache.clone(),
            identity: Arc::new(HttpIdentityClient::new(&config.identity_url, peer_timeout)),
            pack: Arc::new(HttpPackClient::new(&config.pack_url, peer_timeout)),
            game: Arc::new(HttpGameClient::new(&config.game_url, peer_timeout)),
            broker: Arc::new(HttpBroker::new(&config.broker_url, peer_timeout)),
            clock: Arc::new(SystemClock::new()),
            random: Arc::new(SystemRandom::new()),
        },
    ));

    // Sweep expired cache entries
    let cleanup_interval = config.cache_cleanup_interval;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(cleanup_interval).await;
            let removed = cache.cleanup_expired().await;
            if removed > 0 {
                tracing::debug!(removed, "Swept expired cache entries");
            }
        }
    });

    // Periodic counters
    let metrics_app = app.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(METRICS_LOG_INTERVAL).await;
            let snapshot = metrics_app.metrics.snapshot();
            let live = metrics_app.live.stats();
            tracing::info!(
                rooms_created = snapshot.rooms_created,
                rooms_started = snapshot.rooms_started,
                rooms_cancelled = snapshot.rooms_cancelled,
                rooms_finished = snapshot.rooms_finished,
                start_failures = snapshot.start_failures,
                starts_recovered = snapshot.starts_recovered,
                cache_errors = snapshot.cache_errors,
                background_dropped = snapshot.background_dropped,
                broker_failed = snapshot.broker_failed,
                live_channels = live.active_channels,
                live_dropped = live.dropped,
                "Lobby counters"
            );
        }
    });

    tracing::info!("Lobby engine ready");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down, draining background work");
    app.settle().await;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
