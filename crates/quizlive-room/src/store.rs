//! The write-behind persistence boundary.
//!
//! The engine does not implement durable storage — it writes to whatever
//! implements [`GameStore`] and carries on. Answer writes are awaited
//! inside the room's turn (one retry; on a second failure the turn rolls
//! back and reports to the submitter). Player-stat and finalization
//! writes are best-effort: spawned, retried once, logged on failure.

use quizlive_protocol::{LeaderboardRow, PlayerId, QuestionId, RoomId};
use serde::{Deserialize, Serialize};

use crate::player::Player;

/// Errors surfaced by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store write failed: {0}")]
    Write(String),
}

/// One immutable answer row. Created exactly once per (player, question),
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub player_id: PlayerId,
    pub question_id: QuestionId,
    pub correct: bool,
    pub points: u32,
    pub response_time_ms: u64,
}

/// Snapshot of a player's stats for the write-behind store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub user_id: Option<String>,
    pub display_name: String,
    pub score: u32,
    pub streak: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub average_response_ms: f64,
}

impl PlayerRecord {
    pub fn of(player: &Player) -> Self {
        Self {
            id: player.id,
            user_id: player.user_id.clone(),
            display_name: player.display_name.clone(),
            score: player.score,
            streak: player.streak,
            correct_count: player.correct_count,
            incorrect_count: player.incorrect_count,
            average_response_ms: player.average_response_ms,
        }
    }
}

/// Final state of a room, written when it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    pub room_id: RoomId,
    /// `false` when the session was cancelled before it started.
    pub completed: bool,
    pub question_count: usize,
    pub leaderboard: Vec<LeaderboardRow>,
}

/// The durable-storage collaborator. The engine writes through this
/// trait and never implements storage itself.
pub trait GameStore: Send + Sync + 'static {
    /// Persists one answer. Called inside the room's serialized turn.
    fn record_answer(
        &self,
        room_id: RoomId,
        answer: AnswerRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Persists a player's updated stats. Best-effort.
    fn update_player(
        &self,
        room_id: RoomId,
        player: PlayerRecord,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Persists the final state of a terminal room.
    fn finalize_game(
        &self,
        summary: GameSummary,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}

/// A store that accepts every write and keeps nothing. The default for
/// demos and tests that don't care about persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl GameStore for NullStore {
    async fn record_answer(&self, _: RoomId, _: AnswerRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn update_player(&self, _: RoomId, _: PlayerRecord) -> Result<(), StoreError> {
        Ok(())
    }

    async fn finalize_game(&self, _: GameSummary) -> Result<(), StoreError> {
        Ok(())
    }
}
