//! Core wire types for the Quizlive protocol.
//!
//! Everything in this module travels on the wire: these structures are
//! serialized to bytes, sent over the socket, and deserialized on the other
//! side. The client SDK depends on the exact JSON shapes produced here, so
//! the serde attributes are part of the contract, not decoration.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Unique identifier for a player.
///
/// Newtype over `u64` so a `PlayerId` can never be passed where a `RoomId`
/// is expected. `#[serde(transparent)]` keeps the JSON representation a
/// plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Unique identifier for a room (one live quiz session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// Unique identifier for a question within a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Question wire shapes
// ---------------------------------------------------------------------------

/// The shape of a question, as shown to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultiSelect,
    TrueFalse,
    ShortText,
}

/// A question as broadcast to players when it starts.
///
/// This is a projection: it carries everything a player needs to answer and
/// nothing that reveals which answer is correct. The full question (with its
/// answer key) never leaves the room actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionPublic {
    pub id: QuestionId,
    /// 0-based position in the quiz.
    pub index: usize,
    pub text: String,
    pub kind: QuestionKind,
    /// Option texts for choice questions; empty for true/false and text.
    pub options: Vec<String>,
    pub point_value: u32,
    pub time_limit_secs: u32,
}

/// A player's submitted answer.
///
/// The variant must match the question kind: `Choice` for single-choice,
/// `Choices` for multi-select, `Bool` for true/false, `Text` for short-text.
/// A mismatched shape is simply scored as incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AnswerPayload {
    Choice { selected: u32 },
    Choices { selected: BTreeSet<u32> },
    Bool { value: bool },
    Text { value: String },
}

/// The correct answer, revealed in `question_ended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CorrectAnswer {
    /// Correct option indexes (one for single-choice, the full set for
    /// multi-select).
    Options { indexes: Vec<u32> },
    Bool { value: bool },
    /// Every accepted spelling for a short-text question.
    Text { accepted: Vec<String> },
}

// ---------------------------------------------------------------------------
// Player and leaderboard wire shapes
// ---------------------------------------------------------------------------

/// Player info carried in `player_joined`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub display_name: String,
    pub score: u32,
}

/// One row of a ranked leaderboard.
///
/// Rows arrive already sorted; `rank` is 1-based and sequential (ties share
/// adjacent but distinct ranks).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: u32,
    pub player_id: PlayerId,
    pub display_name: String,
    pub score: u32,
    pub streak: u32,
    pub correct_count: u32,
    pub average_response_ms: f64,
}

// ---------------------------------------------------------------------------
// Commands (client → server)
// ---------------------------------------------------------------------------

/// Host control actions for a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Pause,
    Resume,
    End,
}

/// Commands a connected client can issue after the handshake.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "JoinGame", "code": "482913", "display_name": "ada" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Create a new room from a stored quiz. The issuer becomes the host.
    CreateGame {
        quiz_id: String,
        max_players: Option<usize>,
    },

    /// Join a room by its short numeric code.
    JoinGame { code: String, display_name: String },

    /// Start the game. Host only, room must still be waiting.
    StartGame { room_id: RoomId },

    /// Answer the current question.
    SubmitAnswer {
        room_id: RoomId,
        question_id: QuestionId,
        answer: AnswerPayload,
        response_time_ms: u64,
    },

    /// Skip ahead to the next question. Host only.
    NextQuestion { room_id: RoomId },

    /// Pause, resume, or end the game. Host only.
    GameControl {
        room_id: RoomId,
        action: ControlAction,
    },

    /// Subscribe to the room's monitor channel. Host only.
    JoinMonitor { room_id: RoomId },
}

// ---------------------------------------------------------------------------
// Events (server → client)
// ---------------------------------------------------------------------------

/// Events the engine emits to connections.
///
/// Delivery scope is decided by the room actor: most events go to the room
/// channel and the monitor channel; `AnswerResult` and `Error` go only to
/// the connection they concern and are never broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Sent to the creating host only.
    GameCreated { room_id: RoomId, join_code: String },

    PlayerJoined {
        room_id: RoomId,
        player: PlayerSummary,
        player_count: usize,
    },

    GameStarted { question_count: usize },

    /// The question payload never includes the correct answer.
    QuestionStarted { question: QuestionPublic },

    TimerTick {
        question_id: QuestionId,
        elapsed_secs: u32,
        remaining_secs: u32,
    },

    /// Fires once per question, when 10 seconds remain.
    TimerWarning {
        question_id: QuestionId,
        remaining_secs: u32,
    },

    /// Progress signal: how many players have answered so far.
    PlayerAnswered {
        player_id: PlayerId,
        answered: usize,
        player_count: usize,
    },

    /// Sent to the submitting connection only.
    AnswerResult {
        question_id: QuestionId,
        correct: bool,
        points: u32,
        speed_multiplier: f64,
        streak_multiplier: f64,
        streak: u32,
        score: u32,
    },

    LeaderboardUpdated { entries: Vec<LeaderboardRow> },

    /// Reveals the correct answer and the optional explanation.
    QuestionEnded {
        question_id: QuestionId,
        correct: CorrectAnswer,
        explanation: Option<String>,
        answered: usize,
    },

    GamePaused { remaining_secs: u32 },
    GameResumed { remaining_secs: u32 },

    GameEnded { leaderboard: Vec<LeaderboardRow> },

    /// Sent to the connection that issued the offending command, never
    /// broadcast. `code` follows HTTP conventions (403, 404, 409, ...).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// System messages — connection plumbing
// ---------------------------------------------------------------------------

/// Framework-level messages: handshake, keep-alive, disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server, first message on every connection. `token` is the
    /// opaque credential handed to the [`Authenticator`]; `None` means a
    /// guest connection.
    ///
    /// [`Authenticator`]: https://docs.rs/quizlive-session
    Handshake { version: u32, token: Option<String> },

    /// Server → Client: authenticated, here is your identity.
    HandshakeAck {
        player_id: PlayerId,
        server_time: u64,
    },

    /// Client → Server keep-alive, echoed back as `HeartbeatAck`.
    Heartbeat { client_time: u64 },

    HeartbeatAck {
        client_time: u64,
        server_time: u64,
    },

    /// Either direction: the sender is going away.
    Disconnect { reason: String },
}

// ---------------------------------------------------------------------------
// Envelope — the top-level wire format
// ---------------------------------------------------------------------------

/// The content of an envelope.
///
/// Adjacently tagged: `{ "type": "Command", "data": { ... } }`. The first
/// level tells the gateway whether to handle the frame itself (`System`),
/// route it to a room (`Command`), or — on the client — hand it to the UI
/// (`Event`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Command(ClientCommand),
    Event(ServerEvent),
}

/// The top-level message wrapper. Every frame on the wire is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-direction sequence number, assigned by the sender.
    pub seq: u64,
    /// Milliseconds since the sender's epoch (connection start on the
    /// server side). Timing and debugging only.
    pub timestamp: u64,
    pub payload: Payload,
}

// =========================================================================
// Tests
// =========================================================================
