//! Lobby use cases.
//!
//! Room lifecycle operations. Every mutation runs under the room's token
//! (see [`RoomLocks`](crate::infrastructure::room_locks::RoomLocks)), commits
//! to the durable store, then refreshes the advisory indices and publishes
//! events. Queries read without the token.

use std::sync::Arc;

mod close_room;
mod code_generator;
mod context;
mod create_room;
mod durable_events;
mod error;
mod join_room;
mod leave_room;
mod queries;
mod set_ready;
mod start_game;
mod transfer_host;
mod types;
mod update_settings;

pub use close_room::{CancelRoom, FinishGame};
pub use code_generator::RoomCodeGenerator;
pub use context::{LobbyContext, LobbyPolicy};
pub use create_room::CreateRoom;
pub use durable_events::{DurableEventPublisher, CANCEL_REASON_MANUAL, CANCEL_REASON_NO_PLAYERS};
pub use error::{BadRequestReason, ConflictReason, ForbiddenReason, LobbyError, NotFoundReason};
pub use join_room::JoinRoom;
pub use leave_room::{KickPlayer, LeaveRoom};
pub use queries::{LobbyQueries, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use set_ready::{ReadyOutcome, SetReady};
pub use start_game::{StartGame, StartedGame};
pub use transfer_host::TransferHost;
pub use types::{
    CreateRoomInput, JoinTarget, LobbyUser, PasswordChange, RoomPage, RoomView,
    UpdateSettingsInput,
};
pub use update_settings::UpdateSettings;

use crate::infrastructure::ports::{GameSessionPort, PackPort};

/// Container for lobby use cases.
pub struct LobbyUseCases {
    pub create_room: Arc<CreateRoom>,
    pub join_room: Arc<JoinRoom>,
    pub leave_room: Arc<LeaveRoom>,
    pub kick_player: Arc<KickPlayer>,
    pub transfer_host: Arc<TransferHost>,
    pub update_settings: Arc<UpdateSettings>,
    pub start_game: Arc<StartGame>,
    pub set_ready: Arc<SetReady>,
    pub cancel_room: Arc<CancelRoom>,
    pub finish_game: Arc<FinishGame>,
    pub queries: Arc<LobbyQueries>,
}

impl LobbyUseCases {
    pub fn new(
        ctx: Arc<LobbyContext>,
        pack: Arc<dyn PackPort>,
        game: Arc<dyn GameSessionPort>,
        codes: Arc<RoomCodeGenerator>,
    ) -> Self {
        let start_game = Arc::new(StartGame::new(ctx.clone(), pack.clone(), game));
        Self {
            create_room: Arc::new(CreateRoom::new(ctx.clone(), pack, codes)),
            join_room: Arc::new(JoinRoom::new(ctx.clone())),
            leave_room: Arc::new(LeaveRoom::new(ctx.clone())),
            kick_player: Arc::new(KickPlayer::new(ctx.clone())),
            transfer_host: Arc::new(TransferHost::new(ctx.clone())),
            update_settings: Arc::new(UpdateSettings::new(ctx.clone())),
            set_ready: Arc::new(SetReady::new(ctx.clone(), start_game.clone())),
            start_game,
            cancel_room: Arc::new(CancelRoom::new(ctx.clone())),
            finish_game: Arc::new(FinishGame::new(ctx.clone())),
            queries: Arc::new(LobbyQueries::new(ctx)),
        }
    }
}
