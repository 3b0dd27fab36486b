//! Short human-typable join codes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Default number of characters in a freshly generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Default alphabet codes are drawn from.
pub const DEFAULT_CODE_CHARSET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Longest code accepted from clients.
const MAX_CODE_LENGTH: usize = 16;

/// A join code (uppercase ASCII alphanumerics).
///
/// Codes are unique only among rooms that are not yet terminal; a code may be
/// handed out again once its room is finished or cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse a code typed by a user. Input is trimmed and uppercased.
    pub fn new(code: impl Into<String>) -> Result<Self, DomainError> {
        let code = code.into();
        let normalized = code.trim().to_ascii_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("Room code cannot be empty"));
        }
        if normalized.len() > MAX_CODE_LENGTH {
            return Err(DomainError::validation(format!(
                "Room code cannot exceed {} characters",
                MAX_CODE_LENGTH
            )));
        }
        if !normalized.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(DomainError::validation(
                "Room code may only contain letters and digits",
            ));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> String {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let code = RoomCode::new("  ab12cd ").unwrap();
        assert_eq!(code.as_str(), "AB12CD");
    }

    #[test]
    fn rejects_symbols() {
        assert!(RoomCode::new("AB-12").is_err());
        assert!(RoomCode::new("").is_err());
    }

    #[test]
    fn deserializes_through_validation() {
        let code: RoomCode = serde_json::from_str("\"xyz789\"").unwrap();
        assert_eq!(code.as_str(), "XYZ789");
        assert!(serde_json::from_str::<RoomCode>("\"no way\"").is_err());
    }
}
