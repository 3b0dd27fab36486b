//! Room lifecycle states and the legal edges between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;

/// Lifecycle state of a room.
///
/// ```text
/// WAITING --> STARTING --> PLAYING --> FINISHED
///    |  ^________|
///    v   (failed start)
/// CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Starting,
    Playing,
    Finished,
    Cancelled,
}

impl RoomStatus {
    /// Lowercase storage form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Starting => "starting",
            Self::Playing => "playing",
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
        }
    }

    /// Finished and cancelled rooms never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: RoomStatus) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Starting)
                | (Self::Starting, Self::Playing)
                | (Self::Starting, Self::Waiting)
                | (Self::Playing, Self::Finished)
                | (Self::Waiting, Self::Cancelled)
        )
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "waiting" => Ok(Self::Waiting),
            "starting" => Ok(Self::Starting),
            "playing" => Ok(Self::Playing),
            "finished" => Ok(Self::Finished),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::parse(format!("Unknown room status: {}", other))),
        }
    }
}
