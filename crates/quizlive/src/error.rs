//! Unified error type for the Quizlive server.

use quizlive_protocol::ProtocolError;
use quizlive_room::RoomError;
use quizlive_session::SessionError;
use quizlive_transport::TransportError;

use crate::SourceError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` conversions let the `?` operator lift sub-crate errors
/// anywhere in the server and handler code.
#[derive(Debug, thiserror::Error)]
pub enum QuizliveError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (authentication, duplicate session).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, invalid state, ...).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A quiz-source error (unknown quiz, storage failure).
    #[error(transparent)]
    Source(#[from] SourceError),
}
