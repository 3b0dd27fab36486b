//! Inputs and projections of the lobby use cases.

use quizlobby_domain::{
    Membership, PackId, Room, RoomId, RoomSettings, SettingsPatch, UserId, Visibility,
};
use quizlobby_shared::{PlayerDto, RoomDto, RoomListDto, RoomSettingsDto, RoomSummaryDto};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyUser {
    pub user_id: UserId,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl LobbyUser {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            avatar_url: None,
        }
    }

    pub fn with_avatar_url(mut self, avatar_url: Option<String>) -> Self {
        self.avatar_url = avatar_url;
        self
    }
}

#[derive(Debug, Clone)]
pub struct CreateRoomInput {
    pub pack_id: PackId,
    pub name: String,
    pub max_players: u32,
    pub visibility: Visibility,
    pub password: Option<String>,
    /// Initial game settings; omitted fields take defaults.
    pub settings: SettingsPatch,
}

/// How a joiner names the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinTarget {
    Id(RoomId),
    Code(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PasswordChange {
    #[default]
    Keep,
    Set(String),
    Clear,
}

/// Partial update of a waiting room. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    pub settings: SettingsPatch,
    pub max_players: Option<u32>,
    pub visibility: Option<Visibility>,
    pub password: PasswordChange,
}

impl UpdateSettingsInput {
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
            && self.max_players.is_none()
            && self.visibility.is_none()
            && self.password == PasswordChange::Keep
    }
}

/// A room with its committed roster and settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomView {
    pub room: Room,
    /// Active members by join order.
    pub members: Vec<Membership>,
    pub settings: RoomSettings,
}

impl RoomView {
    pub fn current_players(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn host(&self) -> Option<&Membership> {
        self.members.iter().find(|m| m.is_host())
    }

    pub fn member(&self, user_id: UserId) -> Option<&Membership> {
        self.members.iter().find(|m| m.user_id() == user_id)
    }

    pub fn to_dto(&self) -> RoomDto {
        let room = &self.room;
        RoomDto {
            id: room.id().to_uuid(),
            room_code: room.code().to_string(),
            name: room.name().to_string(),
            host_id: room.host_id().to_uuid(),
            pack_id: room.pack_id().to_uuid(),
            status: room.status().to_string(),
            max_players: room.max_players(),
            current_players: self.current_players(),
            is_public: room.is_public(),
            has_password: room.has_password(),
            created_at: room.created_at(),
            started_at: room.started_at(),
            players: self.members.iter().map(player_dto).collect(),
            settings: settings_dto(&self.settings),
        }
    }
}

/// One page of the public room listing.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomPage {
    pub rooms: Vec<(Room, u32)>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl RoomPage {
    pub fn to_dto(&self) -> RoomListDto {
        RoomListDto {
            rooms: self
                .rooms
                .iter()
                .map(|(room, current_players)| summary_dto(room, *current_players))
                .collect(),
            total: self.total,
            page: self.page,
            size: self.size,
        }
    }
}

fn player_dto(member: &Membership) -> PlayerDto {
    PlayerDto {
        user_id: member.user_id().to_uuid(),
        username: member.username().to_string(),
        avatar_url: member.avatar_url().map(str::to_string),
        role: member.role().as_str().to_string(),
        is_ready: member.is_ready(),
        joined_at: member.joined_at(),
    }
}

fn settings_dto(settings: &RoomSettings) -> RoomSettingsDto {
    RoomSettingsDto {
        time_for_answer: settings.time_for_answer(),
        time_for_choice: settings.time_for_choice(),
        allow_wrong_answer: settings.allow_wrong_answer(),
        show_right_answer: settings.show_right_answer(),
    }
}

fn summary_dto(room: &Room, current_players: u32) -> RoomSummaryDto {
    RoomSummaryDto {
        id: room.id().to_uuid(),
        room_code: room.code().to_string(),
        name: room.name().to_string(),
        host_id: room.host_id().to_uuid(),
        pack_id: room.pack_id().to_uuid(),
        status: room.status().to_string(),
        max_players: room.max_players(),
        current_players,
        is_public: room.is_public(),
        has_password: room.has_password(),
        created_at: room.created_at(),
    }
}
