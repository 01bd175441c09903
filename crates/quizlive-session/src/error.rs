//! Error types for the session layer.

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Authentication failed — the token was invalid, expired, or rejected
    /// by the [`Authenticator`](crate::Authenticator).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// No session exists for the given player.
    #[error("session not found for player {0}")]
    NotFound(quizlive_protocol::PlayerId),

    /// The player already has an open connection. One connection per
    /// player id.
    #[error("player {0} already has an active session")]
    AlreadyConnected(quizlive_protocol::PlayerId),
}
