//! # Quizlive
//!
//! A live, multi-player quiz session server: independent rooms drive a
//! shared question through synchronized countdowns while players submit
//! answers concurrently and the host monitors without playing.
//!
//! The server is assembled from the layer crates — transport, protocol,
//! session, timer, room — and exposes one builder:
//!
//! ```rust,no_run
//! use quizlive::prelude::*;
//!
//! # async fn run(source: FixtureSource) -> Result<(), QuizliveError> {
//! let server = ServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build_without_store(GuestAuthenticator, source)
//!     .await?;
//! server.run().await
//! # }
//! ```
//!
//! Plug in your own [`Authenticator`](quizlive_session::Authenticator),
//! [`QuestionSource`], and [`GameStore`](quizlive_room::GameStore) to
//! connect real identity, quiz content, and persistence.

mod error;
mod handler;
mod server;
mod source;

pub use error::QuizliveError;
pub use server::{PROTOCOL_VERSION, Server, ServerBuilder};
pub use source::{FixtureSource, QuestionSource, SourceError};

/// The common imports for building and running a server.
pub mod prelude {
    pub use crate::{
        FixtureSource, PROTOCOL_VERSION, QuestionSource, QuizliveError, Server, ServerBuilder,
        SourceError,
    };
    pub use quizlive_protocol::{
        AnswerPayload, ClientCommand, ControlAction, CorrectAnswer, Envelope, LeaderboardRow,
        Payload, PlayerId, QuestionId, QuestionKind, QuestionPublic, RoomId, ServerEvent,
        SystemMessage,
    };
    pub use quizlive_room::{
        AnswerKey, GameStore, NullStore, Question, RoomConfig, RoomError, RoomStatus,
    };
    pub use quizlive_session::{Authenticator, GuestAuthenticator, Identity, SessionError};
}
