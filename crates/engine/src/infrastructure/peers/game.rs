//! Game-session service client.

use std::time::Duration;

use async_trait::async_trait;
use quizlobby_domain::{PackId, RoomId};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{http_client, normalize_base_url, read_json, transport_error};
use crate::infrastructure::ports::{
    GameSession, GameSessionPort, GameSessionRequest, PeerError, RosterEntry,
};

pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

#[derive(Clone)]
pub struct HttpGameClient {
    client: Client,
    base_url: String,
}

impl HttpGameClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: normalize_base_url(base_url),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameRequest<'a> {
    room_id: RoomId,
    pack_id: PackId,
    players: &'a [RosterEntry],
    settings: GameSettingsBody,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameSettingsBody {
    time_for_answer: u32,
    time_for_choice: u32,
    allow_wrong_answer: bool,
    show_right_answer: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameResponse {
    #[serde(default)]
    game_id: Option<String>,
    #[serde(default)]
    websocket_url: Option<String>,
}

impl CreateGameResponse {
    fn into_session(self) -> Result<GameSession, PeerError> {
        match (self.game_id, self.websocket_url) {
            (Some(id), Some(url)) if !id.is_empty() && !url.is_empty() => Ok(GameSession {
                game_session_id: id,
                websocket_url: url,
            }),
            _ => Err(PeerError::Malformed(
                "game session response missing gameId or websocketUrl".into(),
            )),
        }
    }
}

#[async_trait]
impl GameSessionPort for HttpGameClient {
    async fn create_game_session(
        &self,
        request: GameSessionRequest,
    ) -> Result<GameSession, PeerError> {
        let body = CreateGameRequest {
            room_id: request.room_id,
            pack_id: request.pack_id,
            players: &request.players,
            settings: GameSettingsBody {
                time_for_answer: request.settings.time_for_answer(),
                time_for_choice: request.settings.time_for_choice(),
                allow_wrong_answer: request.settings.allow_wrong_answer(),
                show_right_answer: request.settings.show_right_answer(),
            },
        };

        let response = self
            .client
            .post(format!("{}/api/game/create", self.base_url))
            .header(IDEMPOTENCY_KEY_HEADER, &request.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let body: CreateGameResponse = read_json(response).await?;
        body.into_session()
    }
}
