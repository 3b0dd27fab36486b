//! Room join-code allocation.

use std::sync::Arc;

use quizlobby_domain::RoomCode;

use super::error::{ConflictReason, LobbyError};
use crate::infrastructure::ports::RandomPort;
use crate::repositories::RoomRepository;

pub struct RoomCodeGenerator {
    random: Arc<dyn RandomPort>,
    rooms: Arc<RoomRepository>,
    charset: Vec<char>,
    length: usize,
    max_attempts: u32,
}

impl RoomCodeGenerator {
    pub fn new(
        random: Arc<dyn RandomPort>,
        rooms: Arc<RoomRepository>,
        charset: &str,
        length: usize,
        max_attempts: u32,
    ) -> Self {
        Self {
            random,
            rooms,
            charset: charset.chars().collect(),
            length,
            max_attempts,
        }
    }

    /// A code no open room currently holds.
    ///
    /// The durable store's unique index is the final arbiter; a code taken
    /// between this check and the insert surfaces as a conflict on create.
    pub async fn generate_unique_code(&self) -> Result<RoomCode, LobbyError> {
        if self.charset.is_empty() || self.length == 0 {
            tracing::error!(
                length = self.length,
                charset_len = self.charset.len(),
                "Room code generator is misconfigured"
            );
            return Err(LobbyError::Conflict(ConflictReason::CodeSpaceExhausted));
        }

        for attempt in 1..=self.max_attempts {
            let code = RoomCode::new(self.random_code())?;
            if self.rooms.find_open_by_code(&code).await?.is_none() {
                if attempt > 1 {
                    tracing::debug!(attempt, code = %code, "Room code allocated after collisions");
                }
                return Ok(code);
            }
        }

        tracing::error!(
            attempts = self.max_attempts,
            length = self.length,
            charset_len = self.charset.len(),
            "Could not allocate a free room code; widen the code length or charset"
        );
        Err(LobbyError::Conflict(ConflictReason::CodeSpaceExhausted))
    }

    fn random_code(&self) -> String {
        let last = self.charset.len() as i32 - 1;
        (0..self.length)
            .map(|_| {
                let index = self.random.gen_range(0, last).clamp(0, last) as usize;
                self.charset[index]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::{SequenceRandom, SystemRandom};
    use crate::test_fixtures::lobby::LobbyHarness;
    use quizlobby_domain::{DEFAULT_CODE_CHARSET, DEFAULT_CODE_LENGTH};
    use std::collections::HashSet;

    #[tokio::test]
    async fn thousand_codes_are_unique_and_well_formed() {
        let harness = LobbyHarness::new().await;
        let generator = RoomCodeGenerator::new(
            Arc::new(SystemRandom::new()),
            harness.repositories.rooms.clone(),
            DEFAULT_CODE_CHARSET,
            DEFAULT_CODE_LENGTH,
            100,
        );

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let code = generator.generate_unique_code().await.unwrap();
            assert_eq!(code.len(), DEFAULT_CODE_LENGTH);
            assert!(code.as_str().chars().all(|c| DEFAULT_CODE_CHARSET.contains(c)));
            seen.insert(code);
        }
        // 36^6 codes; a duplicate in 1000 draws is vanishingly unlikely.
        assert!(seen.len() >= 999);
    }

    #[tokio::test]
    async fn retries_past_codes_held_by_open_rooms() {
        let harness = LobbyHarness::new().await;
        let taken = harness.create_room_as(&harness.host).await;

        // First draw collides with the open room, second draw is "BBBBBB".
        let first: Vec<i32> = taken
            .room
            .code()
            .as_str()
            .chars()
            .map(|c| DEFAULT_CODE_CHARSET.find(c).unwrap() as i32)
            .collect();
        let mut sequence = first.clone();
        sequence.extend([1, 1, 1, 1, 1, 1]);

        let generator = RoomCodeGenerator::new(
            Arc::new(SequenceRandom::new(sequence)),
            harness.repositories.rooms.clone(),
            DEFAULT_CODE_CHARSET,
            DEFAULT_CODE_LENGTH,
            100,
        );

        let code = generator.generate_unique_code().await.unwrap();
        assert_eq!(code.as_str(), "BBBBBB");
    }

    #[tokio::test]
    async fn exhaustion_is_a_conflict() {
        let harness = LobbyHarness::new().await;
        let taken = harness.create_room_as(&harness.host).await;
        let indices: Vec<i32> = taken
            .room
            .code()
            .as_str()
            .chars()
            .map(|c| DEFAULT_CODE_CHARSET.find(c).unwrap() as i32)
            .collect();

        // Replays the taken code on every attempt.
        let replay: Vec<i32> = indices.into_iter().cycle().take(6 * 5).collect();
        let generator = RoomCodeGenerator::new(
            Arc::new(SequenceRandom::new(replay)),
            harness.repositories.rooms.clone(),
            DEFAULT_CODE_CHARSET,
            DEFAULT_CODE_LENGTH,
            5,
        );

        let err = generator.generate_unique_code().await.unwrap_err();
        assert!(matches!(
            err,
            LobbyError::Conflict(ConflictReason::CodeSpaceExhausted)
        ));
    }
}
