//! Starting a game session for a waiting room.
//!
//! The room token is held across the game-service call so no join, leave or
//! second start can interleave. The room is persisted as STARTING before the
//! call and either promoted to PLAYING or rolled back to WAITING after it.

use std::sync::Arc;

use quizlobby_domain::{Room, RoomEventPayload, RoomId, UserId, MIN_PLAYERS};

use super::context::{require_host, require_waiting, LobbyContext};
use super::error::{BadRequestReason, LobbyError, NotFoundReason};
use super::types::RoomView;
use crate::infrastructure::ports::{
    GameSession, GameSessionPort, GameSessionRequest, PackPort, RosterEntry,
};

/// A room that reached PLAYING and the session it is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedGame {
    pub view: RoomView,
    pub session: GameSession,
}

pub struct StartGame {
    ctx: Arc<LobbyContext>,
    pack: Arc<dyn PackPort>,
    game: Arc<dyn GameSessionPort>,
}

impl StartGame {
    pub fn new(
        ctx: Arc<LobbyContext>,
        pack: Arc<dyn PackPort>,
        game: Arc<dyn GameSessionPort>,
    ) -> Self {
        Self { ctx, pack, game }
    }

    pub async fn execute(&self, room_id: RoomId, user_id: UserId) -> Result<StartedGame, LobbyError> {
        let _guard = self.ctx.lock(room_id).await?;
        let room = self.ctx.load_room(room_id).await?;
        require_host(&room, user_id)?;
        self.start_locked(room).await
    }

    /// Start `room`. The caller must hold its token.
    pub(super) async fn start_locked(&self, mut room: Room) -> Result<StartedGame, LobbyError> {
        require_waiting(&room)?;
        let room_id = room.id();

        let current = self.ctx.view(room.clone()).await?;
        let actual = current.current_players();
        if actual < MIN_PLAYERS {
            return Err(LobbyError::BadRequest(
                BadRequestReason::InsufficientPlayers {
                    required: MIN_PLAYERS,
                    actual,
                },
            ));
        }

        let validation = self
            .pack
            .validate_pack(room.pack_id(), Some(room.host_id()))
            .await
            .map_err(|e| LobbyError::upstream("pack", e))?;
        if !validation.exists {
            return Err(LobbyError::NotFound(NotFoundReason::Pack));
        }
        if !validation.is_usable() {
            return Err(LobbyError::BadRequest(BadRequestReason::PackNotApproved));
        }

        room.begin_start(self.ctx.now())?;
        self.ctx.rooms.save(&room).await?;
        self.ctx.index.room_changed(&room, &current.members, &[]);

        let roster: Vec<RosterEntry> = current
            .members
            .iter()
            .map(|m| RosterEntry {
                user_id: m.user_id(),
                username: m.username().to_string(),
                role: m.role(),
            })
            .collect();
        let request = GameSessionRequest {
            room_id,
            pack_id: room.pack_id(),
            players: roster.clone(),
            settings: current.settings,
            idempotency_key: room_id.to_string(),
        };

        tracing::info!(room_id = %room_id, players = roster.len(), "Requesting game session");
        let session = match self.game.create_game_session(request).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(room_id = %room_id, error = %e, "Game session creation failed, reverting start");
                self.ctx.metrics.start_failed();
                self.roll_back(room, &current).await;
                return Err(LobbyError::upstream("game", e));
            }
        };

        let mut playing = room.clone();
        playing.mark_playing(self.ctx.now())?;
        if let Err(e) = self.ctx.rooms.save(&playing).await {
            tracing::error!(room_id = %room_id, error = %e, "Could not record started game, reverting start");
            self.ctx.metrics.start_failed();
            self.roll_back(room, &current).await;
            return Err(e.into());
        }

        tracing::info!(
            room_id = %room_id,
            game_session_id = %session.game_session_id,
            "Game started"
        );
        self.ctx.metrics.room_started();

        let view = RoomView {
            room: playing,
            members: current.members,
            settings: current.settings,
        };
        self.ctx.reindex(&view, &[]);
        self.ctx.emit(
            room_id,
            RoomEventPayload::RoomStarted {
                game_session_id: session.game_session_id.clone(),
                websocket_url: session.websocket_url.clone(),
            },
        );
        self.ctx
            .durable
            .room_started(&view.room, &session.game_session_id, &roster);

        Ok(StartedGame { view, session })
    }

    async fn roll_back(&self, mut room: Room, current: &RoomView) {
        if let Err(e) = room.revert_start(self.ctx.now()) {
            tracing::error!(room_id = %room.id(), error = %e, "Room left its starting state unexpectedly");
            return;
        }
        match self.ctx.rooms.save(&room).await {
            Ok(()) => self.ctx.index.room_changed(&room, &current.members, &[]),
            Err(e) => tracing::error!(
                room_id = %room.id(),
                error = %e,
                "Failed to revert room to waiting, recovery deferred to next operation"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::PeerError;
    use crate::infrastructure::sqlite::test_support::{fail_room_updates, heal_room_updates};
    use crate::test_fixtures::lobby::{pack_status, LobbyHarness};
    use crate::use_cases::lobby::error::{ConflictReason, ForbiddenReason};
    use crate::use_cases::lobby::types::JoinTarget;
    use quizlobby_domain::RoomStatus;
    use quizlobby_shared::BrokerEventType;
    use std::time::Duration;

    #[tokio::test]
    async fn start_moves_room_to_playing_and_announces_session() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        let guest = harness.user("guest");
        harness.join(&room, &guest).await;
        let mut events = harness.live.subscribe(room.room.id());

        let started = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap();

        assert_eq!(started.view.room.status(), RoomStatus::Playing);
        assert!(started.view.room.started_at().is_some());
        let stored = harness.durable_view(room.room.id()).await;
        assert_eq!(stored.room.status(), RoomStatus::Playing);

        let requests = harness.game.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].idempotency_key, room.room.id().to_string());
        assert_eq!(requests[0].players.len(), 2);

        match events.recv().await.unwrap().payload {
            RoomEventPayload::RoomStarted {
                game_session_id, ..
            } => assert_eq!(game_session_id, started.session.game_session_id),
            other => panic!("unexpected event {other:?}"),
        }

        harness.settle().await;
        let record = harness
            .broker
            .records()
            .into_iter()
            .find(|r| r.event_type == BrokerEventType::RoomStarted)
            .unwrap();
        assert_eq!(record.data["player_count"], "2");
        assert_eq!(harness.metrics.snapshot().rooms_started, 1);
    }

    #[tokio::test]
    async fn single_player_cannot_start() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;

        let err = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LobbyError::BadRequest(BadRequestReason::InsufficientPlayers {
                required: 2,
                actual: 1
            })
        ));
        assert_eq!(
            harness.durable_view(room.room.id()).await.room.status(),
            RoomStatus::Waiting
        );
        assert!(harness.game.requests().is_empty());
    }

    #[tokio::test]
    async fn only_the_host_starts() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        let guest = harness.user("guest");
        harness.join(&room, &guest).await;

        let err = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), guest.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Forbidden(ForbiddenReason::NotHost)));
    }

    #[tokio::test]
    async fn transient_game_failures_are_retried_with_same_key() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        harness
            .game
            .fail_next(2, PeerError::Unavailable("warming up".into()));

        let started = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap();

        assert_eq!(started.view.room.status(), RoomStatus::Playing);
        let requests = harness.game.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|r| r.idempotency_key == requests[0].idempotency_key));
    }

    #[tokio::test]
    async fn game_failure_reverts_to_waiting() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        harness
            .game
            .fail_next(1, PeerError::InvalidArgument("bad roster".into()));

        let err = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap_err();

        assert!(matches!(err, LobbyError::Upstream { peer: "game", .. }));
        let stored = harness.durable_view(room.room.id()).await;
        assert_eq!(stored.room.status(), RoomStatus::Waiting);
        assert!(stored.room.started_at().is_none());
        assert_eq!(harness.game.requests().len(), 1);
        assert_eq!(harness.metrics.snapshot().start_failures, 1);

        // The host can try again once the game service recovers.
        assert!(harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn exhausted_retries_revert_to_waiting() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        harness
            .game
            .fail_next(3, PeerError::Unavailable("down".into()));

        let err = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LobbyError::Upstream {
                peer: "game",
                source: PeerError::Unavailable(_)
            }
        ));
        assert_eq!(harness.game.requests().len(), 3);
        let stored = harness.durable_view(room.room.id()).await;
        assert_eq!(stored.room.status(), RoomStatus::Waiting);
        assert_eq!(stored.current_players(), 2);
    }

    #[tokio::test]
    async fn slow_game_service_times_out_and_reverts() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        harness.game.delay_next(3, Duration::from_millis(400));

        let err = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LobbyError::Upstream {
                peer: "game",
                source: PeerError::DeadlineExceeded(_)
            }
        ));
        assert_eq!(harness.game.requests().len(), 3);
        assert_eq!(
            harness.durable_view(room.room.id()).await.room.status(),
            RoomStatus::Waiting
        );
        assert_eq!(harness.metrics.snapshot().start_failures, 1);
    }

    #[tokio::test]
    async fn room_left_starting_is_recovered_by_next_start() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        // Neither the promotion to PLAYING nor the rollback can be written.
        fail_room_updates(&harness.db, "OLD.status = 'starting'").await;

        let start = &harness.use_cases.lobby.start_game;
        let err = start
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Internal(_)));
        assert_eq!(
            harness.durable_view(room.room.id()).await.room.status(),
            RoomStatus::Starting
        );

        heal_room_updates(&harness.db).await;
        let started = start
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap();

        assert_eq!(started.view.room.status(), RoomStatus::Playing);
        let requests = harness.game.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].idempotency_key, requests[1].idempotency_key);
        assert_eq!(harness.metrics.snapshot().starts_recovered, 1);
    }

    #[tokio::test]
    async fn room_left_starting_can_be_cancelled() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        harness
            .game
            .fail_next(1, PeerError::InvalidArgument("bad roster".into()));
        fail_room_updates(&harness.db, "OLD.status = 'starting'").await;
        assert!(harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .is_err());
        heal_room_updates(&harness.db).await;

        harness
            .use_cases
            .lobby
            .cancel_room
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap();
        assert_eq!(
            harness.durable_view(room.room.id()).await.room.status(),
            RoomStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn pack_is_revalidated_at_start() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        harness.pack.set_validation(pack_status(true, false, "blocked"));

        let err = harness
            .use_cases
            .lobby
            .start_game
            .execute(room.room.id(), harness.host.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::BadRequest(BadRequestReason::PackNotApproved)));
        assert!(harness.game.requests().is_empty());
    }

    #[tokio::test]
    async fn joins_wait_for_an_in_flight_start() {
        let harness = LobbyHarness::new().await;
        let room = harness.create_room_as(&harness.host).await;
        harness.join(&room, &harness.user("guest")).await;
        harness.game.delay_next(1, Duration::from_millis(50));
        let late = harness.user("late");
        let lobby = &harness.use_cases.lobby;

        let (started, joined) = tokio::join!(
            lobby.start_game.execute(room.room.id(), harness.host.user_id),
            lobby
                .join_room
                .execute(JoinTarget::Id(room.room.id()), &late, None),
        );

        assert!(started.is_ok());
        assert!(matches!(
            joined.unwrap_err(),
            LobbyError::Conflict(ConflictReason::InvalidRoomState(RoomStatus::Playing))
        ));
        assert_eq!(harness.durable_view(room.room.id()).await.current_players(), 2);
    }
}
