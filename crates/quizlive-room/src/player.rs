//! The player model. All mutation happens inside the owning room actor.

use std::time::Instant;

use quizlive_protocol::{PlayerId, PlayerSummary};

use crate::score::ScoreOutcome;

/// Participation state of a player within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Joined a waiting room.
    Joined,
    /// In a waiting room, ready for the game to start.
    Ready,
    /// Actively playing (the game is in progress or paused).
    Playing,
    /// Connection dropped. The player keeps their score and their place
    /// on the leaderboard; this is a status, not a removal.
    Disconnected,
    /// The game ended while this player was part of it.
    Finished,
}

/// One player's authoritative in-room record.
///
/// `score` is monotonically non-decreasing and only ever changes via
/// [`Player::apply_score`], called by the room actor after a scoring run.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    /// Stable identity, when the player authenticated with one. Used to
    /// re-attach a returning connection to this record.
    pub user_id: Option<String>,
    /// Unique within the room.
    pub display_name: String,
    pub score: u32,
    pub streak: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    /// Running mean over every scored answer.
    pub average_response_ms: f64,
    pub status: PlayerStatus,
    pub last_seen: Instant,
    /// Per-room monotonic join ordinal; the final leaderboard tie-break.
    pub join_order: u64,
}

impl Player {
    pub fn new(
        id: PlayerId,
        user_id: Option<String>,
        display_name: String,
        join_order: u64,
        status: PlayerStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            display_name,
            score: 0,
            streak: 0,
            correct_count: 0,
            incorrect_count: 0,
            average_response_ms: 0.0,
            status,
            last_seen: Instant::now(),
            join_order,
        }
    }

    /// Folds one scoring outcome into the record.
    pub fn apply_score(&mut self, outcome: &ScoreOutcome, response_time_ms: u64) {
        if outcome.correct {
            self.score += outcome.points;
            self.streak = outcome.new_streak;
            self.correct_count += 1;
        } else {
            self.streak = 0;
            self.incorrect_count += 1;
        }

        // Running mean: avg_n = avg_{n-1} + (x - avg_{n-1}) / n.
        let n = f64::from(self.correct_count + self.incorrect_count);
        self.average_response_ms += (response_time_ms as f64 - self.average_response_ms) / n;
        self.last_seen = Instant::now();
    }

    /// Marks activity from this player's connection.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Wire summary for `player_joined`.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            score: self.score,
        }
    }
}
