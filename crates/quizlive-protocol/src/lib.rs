//! Wire protocol for Quizlive.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`ClientCommand`], [`ServerEvent`], ...) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer sits between transport (raw frames) and the engine
//! (rooms, players). It knows nothing about connections or game rules —
//! only message shapes.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Gateway (routing) → Room actor
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AnswerPayload, ClientCommand, ControlAction, CorrectAnswer, Envelope, LeaderboardRow, Payload,
    PlayerId, PlayerSummary, QuestionId, QuestionKind, QuestionPublic, RoomId, ServerEvent,
    SystemMessage,
};
