use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

const MIN_ROOM_NAME_LENGTH: usize = 3;
const MAX_ROOM_NAME_LENGTH: usize = 100;

/// A validated room name (3..=100 characters, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomName(String);

impl RoomName {
    /// Create a new validated room name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the trimmed name is shorter than 3
    /// or longer than 100 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        let length = trimmed.chars().count();
        if length < MIN_ROOM_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Room name must be at least {} characters",
                MIN_ROOM_NAME_LENGTH
            )));
        }
        if length > MAX_ROOM_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Room name cannot exceed {} characters",
                MAX_ROOM_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoomName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RoomName> for String {
    fn from(name: RoomName) -> String {
        name.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_accepts_bounds() {
        assert_eq!(RoomName::new("  abc  ").unwrap().as_str(), "abc");
        assert!(RoomName::new("a".repeat(100)).is_ok());
    }

    #[test]
    fn rejects_short_and_long_names() {
        assert!(RoomName::new("ab").is_err());
        assert!(RoomName::new("   ab   ").is_err());
        assert!(RoomName::new("a".repeat(101)).is_err());
    }

    #[test]
    fn counts_characters_not_bytes() {
        // three multi-byte characters
        assert!(RoomName::new("日本語").is_ok());
    }
}
