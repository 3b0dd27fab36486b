//! Room password value objects.
//!
//! The plaintext form only lives long enough to be hashed or verified; rooms
//! store the encoded hash.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

const MIN_PASSWORD_LENGTH: usize = 4;
const MAX_PASSWORD_LENGTH: usize = 50;

/// A plaintext room password as typed by the host (4..=50 characters).
#[derive(Clone, PartialEq, Eq)]
pub struct RoomPassword(String);

impl RoomPassword {
    pub fn new(password: impl Into<String>) -> Result<Self, DomainError> {
        let password = password.into();
        let length = password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(DomainError::validation(format!(
                "Room password must be between {} and {} characters",
                MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH
            )));
        }
        Ok(Self(password))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RoomPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoomPassword(***)")
    }
}

/// An encoded password hash (PHC string format).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_length_bounds() {
        assert!(RoomPassword::new("abc").is_err());
        assert!(RoomPassword::new("abcd").is_ok());
        assert!(RoomPassword::new("x".repeat(50)).is_ok());
        assert!(RoomPassword::new("x".repeat(51)).is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let password = RoomPassword::new("hunter22").unwrap();
        assert!(!format!("{:?}", password).contains("hunter22"));
    }
}
