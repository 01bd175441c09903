//! Player identity and session tracking for Quizlive.
//!
//! 1. **Authentication** — resolving a handshake token to an [`Identity`]
//!    ([`Authenticator`] trait; the engine never sees raw credentials).
//! 2. **Session tracking** — knowing who is connected ([`SessionManager`]).
//!
//! There is deliberately no session resume: a dropped connection marks the
//! player inactive, and rejoining a room with the same stable user id
//! re-attaches to the existing player record at the room layer.
//!
//! ```text
//! Gateway (above)  ← authenticates connections, tracks sessions
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below)  ← provides PlayerId
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod manager;
mod session;

pub use auth::{Authenticator, GuestAuthenticator, Identity};
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};
