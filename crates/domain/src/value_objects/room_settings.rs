//! Per-room game settings.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::DomainError;

/// Seconds a player has to answer a question.
pub const TIME_FOR_ANSWER_RANGE: RangeInclusive<u32> = 10..=120;
/// Seconds a player has to choose the next question.
pub const TIME_FOR_CHOICE_RANGE: RangeInclusive<u32> = 10..=180;

const DEFAULT_TIME_FOR_ANSWER: u32 = 30;
const DEFAULT_TIME_FOR_CHOICE: u32 = 60;

/// Game settings owned 1:1 by a room.
///
/// # Invariants
///
/// - `time_for_answer` is within 10..=120 seconds
/// - `time_for_choice` is within 10..=180 seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    time_for_answer: u32,
    time_for_choice: u32,
    allow_wrong_answer: bool,
    show_right_answer: bool,
}

impl RoomSettings {
    /// Create validated settings.
    pub fn new(
        time_for_answer: u32,
        time_for_choice: u32,
        allow_wrong_answer: bool,
        show_right_answer: bool,
    ) -> Result<Self, DomainError> {
        if !TIME_FOR_ANSWER_RANGE.contains(&time_for_answer) {
            return Err(DomainError::validation(format!(
                "timeForAnswer must be between {} and {} seconds",
                TIME_FOR_ANSWER_RANGE.start(),
                TIME_FOR_ANSWER_RANGE.end()
            )));
        }
        if !TIME_FOR_CHOICE_RANGE.contains(&time_for_choice) {
            return Err(DomainError::validation(format!(
                "timeForChoice must be between {} and {} seconds",
                TIME_FOR_CHOICE_RANGE.start(),
                TIME_FOR_CHOICE_RANGE.end()
            )));
        }
        Ok(Self {
            time_for_answer,
            time_for_choice,
            allow_wrong_answer,
            show_right_answer,
        })
    }

    #[inline]
    pub fn time_for_answer(&self) -> u32 {
        self.time_for_answer
    }

    #[inline]
    pub fn time_for_choice(&self) -> u32 {
        self.time_for_choice
    }

    #[inline]
    pub fn allow_wrong_answer(&self) -> bool {
        self.allow_wrong_answer
    }

    #[inline]
    pub fn show_right_answer(&self) -> bool {
        self.show_right_answer
    }

    /// Merge the provided fields over these settings and validate the result.
    ///
    /// Fields left as `None` keep their current value.
    pub fn merge(&self, patch: &SettingsPatch) -> Result<Self, DomainError> {
        Self::new(
            patch.time_for_answer.unwrap_or(self.time_for_answer),
            patch.time_for_choice.unwrap_or(self.time_for_choice),
            patch.allow_wrong_answer.unwrap_or(self.allow_wrong_answer),
            patch.show_right_answer.unwrap_or(self.show_right_answer),
        )
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            time_for_answer: DEFAULT_TIME_FOR_ANSWER,
            time_for_choice: DEFAULT_TIME_FOR_CHOICE,
            allow_wrong_answer: true,
            show_right_answer: true,
        }
    }
}

/// Partial settings update. Only the `Some` fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub time_for_answer: Option<u32>,
    #[serde(default)]
    pub time_for_choice: Option<u32>,
    #[serde(default)]
    pub allow_wrong_answer: Option<bool>,
    #[serde(default)]
    pub show_right_answer: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.time_for_answer.is_none()
            && self.time_for_choice.is_none()
            && self.allow_wrong_answer.is_none()
            && self.show_right_answer.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_lobby_defaults() {
        let settings = RoomSettings::default();
        assert_eq!(settings.time_for_answer(), 30);
        assert_eq!(settings.time_for_choice(), 60);
        assert!(settings.allow_wrong_answer());
        assert!(settings.show_right_answer());
    }

    #[test]
    fn merge_keeps_unset_fields() {
        let patch = SettingsPatch {
            time_for_answer: Some(45),
            ..Default::default()
        };
        let merged = RoomSettings::default().merge(&patch).unwrap();
        assert_eq!(merged.time_for_answer(), 45);
        assert_eq!(merged.time_for_choice(), 60);
    }

    #[test]
    fn merge_rejects_out_of_range_values() {
        let patch = SettingsPatch {
            time_for_choice: Some(181),
            ..Default::default()
        };
        let err = RoomSettings::default().merge(&patch).unwrap_err();
        assert!(err.is_validation());

        assert!(RoomSettings::new(9, 60, true, true).is_err());
        assert!(RoomSettings::new(120, 10, false, false).is_ok());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(RoomSettings::default()).unwrap();
        assert_eq!(json["timeForAnswer"], 30);
        assert_eq!(json["showRightAnswer"], true);
    }
}
