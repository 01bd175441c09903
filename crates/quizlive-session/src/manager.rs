//! The session manager: tracks every authenticated player session.
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself — it uses a plain
//! `HashMap`. The gateway owns it behind a single `tokio::sync::Mutex`;
//! keeping the locking at that one place avoids hidden contention here.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use quizlive_protocol::PlayerId;

use crate::{Identity, Session, SessionConfig, SessionError, SessionState};

/// Registry of every player currently connected (or recently disconnected).
///
/// ```text
/// authenticate() ──→ create() ──→ disconnect()
///                       │              │
///                       ▼              ▼ (after stale_after_secs)
///                   [Connected]   sweep_stale() removes the record
/// ```
pub struct SessionManager {
    /// All sessions, keyed by player id. One session per player.
    sessions: HashMap<PlayerId, Session>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    /// Registers a session for a freshly authenticated identity.
    ///
    /// A leftover disconnected session for the same player id is replaced.
    ///
    /// # Errors
    /// [`SessionError::AlreadyConnected`] if the player still has an open
    /// connection.
    pub fn create(&mut self, identity: Identity) -> Result<&Session, SessionError> {
        let player_id = identity.player_id;
        if let Some(existing) = self.sessions.get(&player_id) {
            if existing.is_connected() {
                return Err(SessionError::AlreadyConnected(player_id));
            }
        }

        let session = Session {
            identity,
            state: SessionState::Connected,
            connected_at: Instant::now(),
        };
        self.sessions.insert(player_id, session);

        tracing::info!(%player_id, "session created");
        Ok(self.sessions.get(&player_id).expect("just inserted"))
    }

    /// Marks a player as disconnected.
    ///
    /// The record stays until [`sweep_stale`](Self::sweep_stale) removes it,
    /// so the engine can still resolve the identity while the player's room
    /// is live.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };

        tracing::info!(%player_id, "session disconnected");
        Ok(())
    }

    /// Removes sessions that have been disconnected longer than the
    /// configured threshold. Returns the removed player ids.
    ///
    /// Call periodically from the gateway's housekeeping task.
    pub fn sweep_stale(&mut self) -> Vec<PlayerId> {
        let threshold = Duration::from_secs(self.config.stale_after_secs);
        let mut removed = Vec::new();

        self.sessions.retain(|player_id, session| {
            if let SessionState::Disconnected { since } = session.state {
                if since.elapsed() > threshold {
                    removed.push(*player_id);
                    return false;
                }
            }
            true
        });

        for player_id in &removed {
            tracing::info!(%player_id, "stale session swept");
        }
        removed
    }

    /// Looks up a session by player id.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Returns the number of tracked sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
