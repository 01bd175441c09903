//! Error types for the room layer.
//!
//! Every variant maps to exactly one connection: the one that issued the
//! offending command. Room errors are never broadcast and never disturb
//! other players' state.

use quizlive_protocol::{PlayerId, RoomId};

use crate::StoreError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room (or join code) does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The player has no record in this room.
    #[error("player {0} is not in this room")]
    UnknownPlayer(PlayerId),

    /// No room matches the given join code.
    #[error("no game found for code {0:?}")]
    UnknownCode(String),

    /// The room is at its player limit.
    #[error("room {0} is full")]
    Capacity(RoomId),

    /// Another player in this room already uses the display name.
    #[error("display name {0:?} is already taken")]
    NameTaken(String),

    /// An answer for this (player, question) pair is already recorded.
    #[error("answer already recorded for this question")]
    DuplicateAnswer,

    /// The command is invalid for the room's current status — starting a
    /// game twice, answering after the question ended, and so on.
    #[error("invalid room state: {0}")]
    State(String),

    /// A host-only command came from someone else.
    #[error("only the host can {0}")]
    Permission(&'static str),

    /// A session must contain at least one question.
    #[error("quiz has no questions")]
    EmptyQuiz,

    /// Join-code generation exhausted its retry budget.
    #[error("no free join code available")]
    CodeSpaceExhausted,

    /// The room's command channel is closed — the actor is gone.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The write-behind store rejected a critical write twice; the
    /// in-memory mutation was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RoomError {
    /// HTTP-style code used in the wire `error` event.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::UnknownCode(_) | Self::UnknownPlayer(_) => 404,
            Self::Capacity(_) => 429,
            Self::NameTaken(_) | Self::DuplicateAnswer | Self::CodeSpaceExhausted => 409,
            Self::State(_) | Self::EmptyQuiz => 422,
            Self::Permission(_) => 403,
            Self::Unavailable(_) | Self::Store(_) => 503,
        }
    }
}
