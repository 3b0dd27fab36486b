//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    background::BackgroundTasks,
    config::LobbyConfig,
    metrics::LobbyMetrics,
    ports::{
        BrokerPort, CacheStore, ClockPort, GameSessionPort, IdentityPort, MembershipRepo,
        PackPort, RandomPort, RoomRepo, SettingsRepo,
    },
    resilient::{ResilientGameClient, ResilientIdentityClient, ResilientPackClient},
    room_events::RoomEventPublisher,
    room_locks::RoomLocks,
};
use crate::repositories::{
    CacheAside, MembershipRepository, RoomIndex, RoomRepository, SettingsRepository,
};
use crate::use_cases::auth::{AuthUseCases, Authenticate};
use crate::use_cases::lobby::{
    DurableEventPublisher, LobbyContext, LobbyPolicy, LobbyUseCases, RoomCodeGenerator,
};

/// Main application state.
///
/// Holds the repositories and use cases a transport layer drives, plus the
/// live event channels clients subscribe to.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    pub live: Arc<RoomEventPublisher>,
    pub metrics: Arc<LobbyMetrics>,
    pub tasks: BackgroundTasks,
}

/// Container for the repository wrappers.
pub struct Repositories {
    pub rooms: Arc<RoomRepository>,
    pub members: Arc<MembershipRepository>,
    pub settings: Arc<SettingsRepository>,
    pub index: RoomIndex,
}

/// Container for all use cases.
pub struct UseCases {
    pub lobby: LobbyUseCases,
    pub auth: AuthUseCases,
}

/// Adapters the application is assembled from.
pub struct AppPorts {
    pub rooms: Arc<dyn RoomRepo>,
    pub memberships: Arc<dyn MembershipRepo>,
    pub settings: Arc<dyn SettingsRepo>,
    pub cache: Arc<dyn CacheStore>,
    pub identity: Arc<dyn IdentityPort>,
    pub pack: Arc<dyn PackPort>,
    pub game: Arc<dyn GameSessionPort>,
    pub broker: Arc<dyn BrokerPort>,
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

impl App {
    pub fn new(config: &LobbyConfig, ports: AppPorts) -> Self {
        let metrics = Arc::new(LobbyMetrics::new());
        let tasks = BackgroundTasks::new(config.background_concurrency, metrics.clone());

        // Peer calls go through bounded retry with per-attempt timeouts
        let identity: Arc<dyn IdentityPort> = Arc::new(ResilientIdentityClient::new(
            ports.identity,
            config.peer_retry.clone(),
            metrics.clone(),
        ));
        let pack: Arc<dyn PackPort> = Arc::new(ResilientPackClient::new(
            ports.pack,
            config.peer_retry.clone(),
            metrics.clone(),
        ));
        let game: Arc<dyn GameSessionPort> = Arc::new(ResilientGameClient::new(
            ports.game,
            config.peer_retry.clone(),
            metrics.clone(),
        ));

        let cache = CacheAside::new(ports.cache, tasks.clone(), metrics.clone(), config.cache_ttl);
        let repositories = Repositories {
            rooms: Arc::new(RoomRepository::new(ports.rooms, cache.clone())),
            members: Arc::new(MembershipRepository::new(ports.memberships)),
            settings: Arc::new(SettingsRepository::new(ports.settings, cache.clone())),
            index: RoomIndex::new(cache),
        };

        let live = Arc::new(RoomEventPublisher::new(config.live_buffer_capacity));
        let durable = Arc::new(DurableEventPublisher::new(
            ports.broker,
            config.broker_topic.clone(),
            tasks.clone(),
            metrics.clone(),
        ));

        let ctx = Arc::new(LobbyContext {
            rooms: repositories.rooms.clone(),
            members: repositories.members.clone(),
            settings: repositories.settings.clone(),
            index: repositories.index.clone(),
            locks: RoomLocks::new(),
            live: live.clone(),
            durable,
            clock: ports.clock,
            random: ports.random.clone(),
            metrics: metrics.clone(),
            policy: LobbyPolicy {
                max_players_limit: config.max_players_limit,
                lock_timeout: config.lock_timeout,
            },
        });
        let codes = Arc::new(RoomCodeGenerator::new(
            ports.random,
            repositories.rooms.clone(),
            &config.code_charset,
            config.code_length,
            config.code_max_attempts,
        ));

        let use_cases = UseCases {
            lobby: LobbyUseCases::new(ctx, pack, game, codes),
            auth: AuthUseCases::new(Arc::new(Authenticate::new(identity))),
        };

        Self {
            repositories,
            use_cases,
            live,
            metrics,
            tasks,
        }
    }

    /// Wait until queued cache and broker work has drained.
    pub async fn settle(&self) {
        self.tasks.idle().await;
    }
}
