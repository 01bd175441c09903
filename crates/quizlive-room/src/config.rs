//! Room configuration and the lifecycle state machine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum players allowed in the room.
    pub max_players: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self { max_players: 50 }
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting → InProgress ⇄ Paused → Finished
/// Waiting | InProgress | Paused → Cancelled
/// ```
///
/// - **Waiting**: room exists, players are joining, nothing started.
/// - **InProgress**: a question is live, the timer is counting down.
/// - **Paused**: host froze the game; the timer holds its remainder.
/// - **Finished**: the quiz ran to its end (or the host ended a running
///   game). Final leaderboard has been broadcast.
/// - **Cancelled**: the host ended a game that never started.
///
/// Finished and Cancelled are terminal; the registry drops the room once
/// its terminal event has gone out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Paused,
    Finished,
    Cancelled,
}

impl RoomStatus {
    /// Returns `true` if new players may join (or re-attach).
    ///
    /// Unlike lobby-style games, a quiz accepts joins mid-game — a late
    /// player simply starts scoring from the current question.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting | Self::InProgress | Self::Paused)
    }

    /// Returns `true` once the room can never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        use RoomStatus::*;
        matches!(
            (self, target),
            (Waiting, InProgress)
                | (InProgress, Paused)
                | (Paused, InProgress)
                | (InProgress, Finished)
                | (Paused, Finished)
                | (Waiting, Cancelled)
                | (InProgress, Cancelled)
                | (Paused, Cancelled)
        )
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Paused => write!(f, "Paused"),
            Self::Finished => write!(f, "Finished"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_status_transition_matrix() {
        use RoomStatus::*;
        assert!(Waiting.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Paused));
        assert!(Paused.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Finished));
        assert!(Paused.can_transition_to(Finished));
        assert!(Waiting.can_transition_to(Cancelled));

        // No skipping, no resurrection.
        assert!(!Waiting.can_transition_to(Paused));
        assert!(!Waiting.can_transition_to(Finished));
        assert!(!Finished.can_transition_to(InProgress));
        assert!(!Cancelled.can_transition_to(Waiting));
        assert!(!Finished.can_transition_to(Cancelled));
    }

    #[test]
    fn test_room_status_is_joinable_through_pause() {
        assert!(RoomStatus::Waiting.is_joinable());
        assert!(RoomStatus::InProgress.is_joinable());
        assert!(RoomStatus::Paused.is_joinable());
        assert!(!RoomStatus::Finished.is_joinable());
        assert!(!RoomStatus::Cancelled.is_joinable());
    }

    #[test]
    fn test_room_status_terminal_states() {
        assert!(RoomStatus::Finished.is_terminal());
        assert!(RoomStatus::Cancelled.is_terminal());
        assert!(!RoomStatus::Paused.is_terminal());
    }

    #[test]
    fn test_room_config_default() {
        assert_eq!(RoomConfig::default().max_players, 50);
    }
}
