//! Lobby error taxonomy.
//!
//! One variant per failure class, each carrying a structured reason. The
//! class picks the transport status; the reason is the machine-readable tag.

use quizlobby_domain::{DomainError, RoomStatus};
use quizlobby_shared::{ErrorCode, ResponseResult};

use crate::infrastructure::ports::{PeerError, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    #[error("Not found: {0}")]
    NotFound(NotFoundReason),

    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    #[error("Forbidden: {0}")]
    Forbidden(ForbiddenReason),

    #[error("Bad request: {0}")]
    BadRequest(BadRequestReason),

    #[error("{peer} service call failed: {source}")]
    Upstream {
        peer: &'static str,
        #[source]
        source: PeerError,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundReason {
    #[error("room not found")]
    Room,
    #[error("no open room with code {0}")]
    RoomCode(String),
    #[error("player is not in this room")]
    PlayerNotInRoom,
    #[error("pack not found")]
    Pack,
    #[error("user not found")]
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConflictReason {
    #[error("room is full")]
    RoomFull,
    #[error("user is already in this room")]
    AlreadyMember,
    #[error("user is already in another room")]
    AlreadyInAnotherRoom,
    #[error("operation not allowed while room is {0}")]
    InvalidRoomState(RoomStatus),
    #[error("room code space exhausted")]
    CodeSpaceExhausted,
    #[error("room is busy, try again")]
    RoomBusy,
    #[error("room changed concurrently")]
    ConcurrentUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForbiddenReason {
    #[error("only the host may do this")]
    NotHost,
    #[error("the host cannot kick themselves")]
    CannotKickSelf,
    #[error("the host cannot be kicked")]
    CannotKickHost,
    #[error("invalid or expired token")]
    InvalidToken,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BadRequestReason {
    #[error("wrong room password")]
    WrongPassword,
    #[error("at least {required} players are needed, room has {actual}")]
    InsufficientPlayers { required: u32, actual: u32 },
    #[error("pack is not approved and not owned by the host")]
    PackNotApproved,
    #[error("{0}")]
    InvalidInput(String),
}

impl NotFoundReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Room => "room_not_found",
            Self::RoomCode(_) => "room_code_not_found",
            Self::PlayerNotInRoom => "player_not_in_room",
            Self::Pack => "pack_not_found",
            Self::User => "user_not_found",
        }
    }
}

impl ConflictReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoomFull => "room_full",
            Self::AlreadyMember => "already_member",
            Self::AlreadyInAnotherRoom => "already_in_another_room",
            Self::InvalidRoomState(_) => "invalid_room_state",
            Self::CodeSpaceExhausted => "code_space_exhausted",
            Self::RoomBusy => "room_busy",
            Self::ConcurrentUpdate => "concurrent_update",
        }
    }
}

impl ForbiddenReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotHost => "not_host",
            Self::CannotKickSelf => "cannot_kick_self",
            Self::CannotKickHost => "cannot_kick_host",
            Self::InvalidToken => "invalid_token",
        }
    }
}

impl BadRequestReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WrongPassword => "wrong_password",
            Self::InsufficientPlayers { .. } => "insufficient_players",
            Self::PackNotApproved => "pack_not_approved",
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}

impl LobbyError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::BadRequest(BadRequestReason::InvalidInput(message.into()))
    }

    pub fn invalid_state(status: RoomStatus) -> Self {
        Self::Conflict(ConflictReason::InvalidRoomState(status))
    }

    pub fn upstream(peer: &'static str, source: PeerError) -> Self {
        Self::Upstream { peer, source }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Conflict(_) => ErrorCode::Conflict,
            Self::Forbidden(_) => ErrorCode::Forbidden,
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::Upstream { .. } => ErrorCode::UpstreamError,
            Self::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Snake-case tag naming the specific failure.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound(r) => r.as_str(),
            Self::Conflict(r) => r.as_str(),
            Self::Forbidden(r) => r.as_str(),
            Self::BadRequest(r) => r.as_str(),
            Self::Upstream { source, .. } => source.kind(),
            Self::Internal(_) => "internal",
        }
    }

    /// Error envelope for transports. Internal details stay in the logs.
    pub fn to_response(&self) -> ResponseResult {
        let message = match self {
            Self::Internal(_) => "Internal error".to_string(),
            other => other.to_string(),
        };
        ResponseResult::error_with_reason(self.code(), message, self.reason())
    }
}

impl From<RepoError> for LobbyError {
    fn from(error: RepoError) -> Self {
        match error {
            // A concurrent writer beat us to a unique slot (code or active membership).
            RepoError::ConstraintViolation(message) => {
                tracing::info!(error = %message, "Durable store rejected a concurrent write");
                Self::Conflict(ConflictReason::ConcurrentUpdate)
            }
            other => {
                tracing::error!(error = %other, "Durable store failure");
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<DomainError> for LobbyError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(message)
            | DomainError::Constraint(message)
            | DomainError::Parse(message)
            | DomainError::InvalidId(message) => Self::invalid_input(message),
            DomainError::InvalidStateTransition { from, to } => {
                match from.parse::<RoomStatus>() {
                    Ok(status) => Self::invalid_state(status),
                    Err(_) => Self::Internal(format!("invalid transition {from} -> {to}")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_map_to_error_codes() {
        assert_eq!(
            LobbyError::Conflict(ConflictReason::RoomFull).code(),
            ErrorCode::Conflict
        );
        assert_eq!(
            LobbyError::upstream("game", PeerError::Unavailable("down".into())).code(),
            ErrorCode::UpstreamError
        );
        assert_eq!(
            LobbyError::Forbidden(ForbiddenReason::InvalidToken).code(),
            ErrorCode::Forbidden
        );
    }

    #[test]
    fn response_carries_reason_and_hides_internals() {
        match LobbyError::Conflict(ConflictReason::RoomFull).to_response() {
            ResponseResult::Error { code, reason, .. } => {
                assert_eq!(code, ErrorCode::Conflict);
                assert_eq!(reason.as_deref(), Some("room_full"));
            }
            other => panic!("unexpected response {other:?}"),
        }

        match LobbyError::Internal("pool timed out".into()).to_response() {
            ResponseResult::Error { message, .. } => assert_eq!(message, "Internal error"),
            other => panic!("unexpected response {other:?}"),
        }
    }

    #[test]
    fn constraint_violations_become_conflicts() {
        let err: LobbyError = RepoError::constraint("UNIQUE constraint failed").into();
        assert!(matches!(
            err,
            LobbyError::Conflict(ConflictReason::ConcurrentUpdate)
        ));

        let err: LobbyError = RepoError::database("save_room", "disk I/O error").into();
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn invalid_transition_keeps_current_status() {
        let err: LobbyError =
            DomainError::invalid_transition(RoomStatus::Playing, RoomStatus::Cancelled).into();
        assert!(matches!(
            err,
            LobbyError::Conflict(ConflictReason::InvalidRoomState(RoomStatus::Playing))
        ));
        assert_eq!(err.reason(), "invalid_room_state");
    }
}
