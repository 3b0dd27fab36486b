//! Lobby harness: the real `App` over a temp SQLite file and the in-process
//! cache, with scripted peers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dashmap::DashMap;
use quizlobby_domain::{PackId, RoomId, SettingsPatch, UserId, Visibility};
use quizlobby_shared::BrokerRecord;
use sqlx::SqlitePool;
use tempfile::TempDir;

use crate::app::{App, AppPorts, Repositories, UseCases};
use crate::infrastructure::background::BackgroundTasks;
use crate::infrastructure::cache::MemoryCacheStore;
use crate::infrastructure::clock::{SteppingClock, SystemRandom};
use crate::infrastructure::config::LobbyConfig;
use crate::infrastructure::metrics::LobbyMetrics;
use crate::infrastructure::ports::{
    BrokerError, BrokerPort, GameSession, GameSessionPort, GameSessionRequest, IdentityPort,
    PackInfo, PackPort, PackValidation, PeerError, TokenIdentity, UserInfo, PACK_STATUS_APPROVED,
};
use crate::infrastructure::resilient::RetryPolicy;
use crate::infrastructure::room_events::RoomEventPublisher;
use crate::infrastructure::sqlite::{
    self, SqliteMembershipRepo, SqliteRoomRepo, SqliteSettingsRepo,
};
use crate::use_cases::lobby::{CreateRoomInput, JoinTarget, LobbyUser, RoomView};

/// Pack validation answer with the given flags and no error.
pub fn pack_status(exists: bool, is_owner: bool, status: &str) -> PackValidation {
    PackValidation {
        exists,
        is_owner,
        status: status.to_string(),
        error: None,
    }
}

pub struct LobbyHarness {
    pub repositories: Repositories,
    pub use_cases: UseCases,
    pub live: Arc<RoomEventPublisher>,
    pub metrics: Arc<LobbyMetrics>,
    pub cache: Arc<MemoryCacheStore>,
    pub identity: Arc<FakeIdentity>,
    pub pack: Arc<FakePack>,
    pub game: Arc<ScriptedGame>,
    pub broker: Arc<RecordingBroker>,
    /// The pool behind the durable store, for fault injection.
    pub db: SqlitePool,
    pub host: LobbyUser,
    tasks: BackgroundTasks,
    _db_dir: TempDir,
}

impl LobbyHarness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lobby.db");
        let pool = sqlite::connect(&path.to_string_lossy())
            .await
            .expect("connect");

        let config = LobbyConfig {
            peer_retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(4),
                call_timeout: Duration::from_millis(200),
                jitter_factor: 0.0,
            },
            ..LobbyConfig::default()
        };

        let cache = Arc::new(MemoryCacheStore::new());
        let identity = Arc::new(FakeIdentity::default());
        let pack = Arc::new(FakePack::default());
        let game = Arc::new(ScriptedGame::default());
        let broker = Arc::new(RecordingBroker::default());
        let start = Utc
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid start time");

        let app = App::new(
            &config,
            AppPorts {
                rooms: Arc::new(SqliteRoomRepo::new(pool.clone())),
                memberships: Arc::new(SqliteMembershipRepo::new(pool.clone())),
                settings: Arc::new(SqliteSettingsRepo::new(pool.clone())),
                cache: cache.clone(),
                identity: identity.clone(),
                pack: pack.clone(),
                game: game.clone(),
                broker: broker.clone(),
                clock: Arc::new(SteppingClock::new(start)),
                random: Arc::new(SystemRandom::new()),
            },
        );
        let App {
            repositories,
            use_cases,
            live,
            metrics,
            tasks,
        } = app;

        Self {
            repositories,
            use_cases,
            live,
            metrics,
            cache,
            identity,
            pack,
            game,
            broker,
            db: pool,
            host: LobbyUser::new(UserId::new(), "host"),
            tasks,
            _db_dir: dir,
        }
    }

    pub fn user(&self, name: &str) -> LobbyUser {
        LobbyUser::new(UserId::new(), name)
    }

    pub fn create_input(&self) -> CreateRoomInput {
        CreateRoomInput {
            pack_id: PackId::new(),
            name: "Quiz Night".to_string(),
            max_players: 6,
            visibility: Visibility::Public,
            password: None,
            settings: SettingsPatch::default(),
        }
    }

    pub async fn create_room_as(&self, user: &LobbyUser) -> RoomView {
        self.create(user, self.create_input()).await
    }

    pub async fn create_room_with_max(&self, user: &LobbyUser, max_players: u32) -> RoomView {
        self.create(
            user,
            CreateRoomInput {
                max_players,
                ..self.create_input()
            },
        )
        .await
    }

    pub async fn create_private_room(&self, user: &LobbyUser, password: &str) -> RoomView {
        self.create(
            user,
            CreateRoomInput {
                visibility: Visibility::Private,
                password: Some(password.to_string()),
                ..self.create_input()
            },
        )
        .await
    }

    async fn create(&self, user: &LobbyUser, input: CreateRoomInput) -> RoomView {
        self.use_cases
            .lobby
            .create_room
            .execute(user, input)
            .await
            .expect("create room")
    }

    pub async fn join(&self, room: &RoomView, user: &LobbyUser) -> RoomView {
        self.use_cases
            .lobby
            .join_room
            .execute(JoinTarget::Id(room.room.id()), user, None)
            .await
            .expect("join room")
    }

    /// The room as the durable store holds it, bypassing the cache.
    pub async fn durable_view(&self, room_id: RoomId) -> RoomView {
        let room = self
            .repositories
            .rooms
            .get_for_update(room_id)
            .await
            .expect("load room")
            .expect("room exists");
        let members = self
            .repositories
            .members
            .list_active(room_id)
            .await
            .expect("list members");
        let settings = self
            .repositories
            .settings
            .get_for_update(room_id)
            .await
            .expect("load settings")
            .expect("settings exist");
        RoomView {
            room,
            members,
            settings,
        }
    }

    /// Wait for background cache and broker work.
    pub async fn settle(&self) {
        self.tasks.idle().await;
    }
}

// =============================================================================
// Peers
// =============================================================================

/// Identity service with a fixed token table.
#[derive(Default)]
pub struct FakeIdentity {
    tokens: DashMap<String, UserId>,
    users: DashMap<UserId, UserInfo>,
}

impl FakeIdentity {
    pub fn register(&self, token: &str, user: &LobbyUser) {
        self.tokens.insert(token.to_string(), user.user_id);
        self.users.insert(
            user.user_id,
            UserInfo {
                user_id: user.user_id,
                username: user.username.clone(),
                avatar_url: user.avatar_url.clone(),
            },
        );
    }
}

#[async_trait]
impl IdentityPort for FakeIdentity {
    async fn validate_token(&self, token: &str) -> Result<Option<TokenIdentity>, PeerError> {
        let Some(user_id) = self.tokens.get(token).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.users.get(&user_id).map(|info| TokenIdentity {
            user_id,
            username: info.username.clone(),
        }))
    }

    async fn get_user_info(&self, user_id: UserId) -> Result<Option<UserInfo>, PeerError> {
        Ok(self.users.get(&user_id).map(|info| info.clone()))
    }
}

/// Pack service answering every pack the same way.
pub struct FakePack {
    validation: Mutex<Result<PackValidation, PeerError>>,
}

impl Default for FakePack {
    fn default() -> Self {
        Self {
            validation: Mutex::new(Ok(pack_status(true, false, PACK_STATUS_APPROVED))),
        }
    }
}

impl FakePack {
    pub fn set_validation(&self, validation: PackValidation) {
        *self.validation.lock().expect("pack lock") = Ok(validation);
    }

    pub fn fail_with(&self, error: PeerError) {
        *self.validation.lock().expect("pack lock") = Err(error);
    }
}

#[async_trait]
impl PackPort for FakePack {
    async fn validate_pack(
        &self,
        _pack_id: PackId,
        _user_id: Option<UserId>,
    ) -> Result<PackValidation, PeerError> {
        self.validation.lock().expect("pack lock").clone()
    }

    async fn get_pack_info(&self, pack_id: PackId) -> Result<Option<PackInfo>, PeerError> {
        Ok(Some(PackInfo {
            id: pack_id,
            name: "Test Pack".to_string(),
            author: "quizmaster".to_string(),
            rounds_count: 3,
            questions_count: 30,
        }))
    }
}

#[derive(Default)]
struct GameScript {
    failures: VecDeque<PeerError>,
    delays: VecDeque<Duration>,
    requests: Vec<GameSessionRequest>,
}

/// Game service that records every attempt and replays queued failures.
#[derive(Default)]
pub struct ScriptedGame {
    script: Mutex<GameScript>,
}

impl ScriptedGame {
    /// Fail the next `times` calls with `error`.
    pub fn fail_next(&self, times: usize, error: PeerError) {
        let mut script = self.script.lock().expect("game lock");
        script
            .failures
            .extend(std::iter::repeat(error).take(times));
    }

    /// Hold each of the next `times` calls for `delay` before answering.
    pub fn delay_next(&self, times: usize, delay: Duration) {
        let mut script = self.script.lock().expect("game lock");
        script.delays.extend(std::iter::repeat(delay).take(times));
    }

    pub fn requests(&self) -> Vec<GameSessionRequest> {
        self.script.lock().expect("game lock").requests.clone()
    }
}

#[async_trait]
impl GameSessionPort for ScriptedGame {
    async fn create_game_session(
        &self,
        request: GameSessionRequest,
    ) -> Result<GameSession, PeerError> {
        let room_id = request.room_id;
        let (delay, failure) = {
            let mut script = self.script.lock().expect("game lock");
            script.requests.push(request);
            (script.delays.pop_front(), script.failures.pop_front())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        let game_session_id = format!("game-{room_id}");
        Ok(GameSession {
            websocket_url: format!("ws://game.test/sessions/{game_session_id}"),
            game_session_id,
        })
    }
}

/// Broker that keeps every record it is handed.
#[derive(Default)]
pub struct RecordingBroker {
    published: Mutex<Vec<(String, String, String)>>,
}

impl RecordingBroker {
    /// Published records in send order.
    pub fn records(&self) -> Vec<BrokerRecord> {
        self.published
            .lock()
            .expect("broker lock")
            .iter()
            .map(|(_, _, payload)| serde_json::from_str(payload).expect("broker record"))
            .collect()
    }
}

#[async_trait]
impl BrokerPort for RecordingBroker {
    async fn publish(&self, topic: &str, key: &str, payload: String) -> Result<(), BrokerError> {
        self.published
            .lock()
            .expect("broker lock")
            .push((topic.to_string(), key.to_string(), payload));
        Ok(())
    }
}
