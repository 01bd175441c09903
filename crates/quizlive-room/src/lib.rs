//! The Quizlive game engine: room actors, scoring, ranking, and the
//! process-wide room registry.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! players, answers, question index, and countdown timer, and processes
//! commands one at a time in arrival order.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates rooms, resolves join codes, removes
//!   terminal rooms
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`Question`] / [`AnswerKey`] — the quiz content model
//! - [`score`] / [`rank`] — the pure scoring engine and leaderboard ranker
//! - [`GameStore`] — the write-behind persistence boundary

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod player;
mod question;
mod registry;
mod room;
mod store;

pub mod rank;
pub mod score;

pub use config::{RoomConfig, RoomStatus};
pub use error::RoomError;
pub use player::{Player, PlayerStatus};
pub use question::{AnswerKey, Question};
pub use registry::RoomRegistry;
pub use room::{EventSender, RoomHandle, RoomInfo};
pub use store::{AnswerRecord, GameStore, GameSummary, NullStore, PlayerRecord, StoreError};
