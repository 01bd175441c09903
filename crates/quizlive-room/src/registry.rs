//! The room registry: the process-wide roomId→actor index.
//!
//! This index is the only resource touched by more than one room's logic,
//! so it lives behind a single `tokio::sync::Mutex` owned by the gateway —
//! everything else (players, answers, timers) is owned exclusively by one
//! room's actor. Exactly one live actor exists per room id: ids are minted
//! here, under that one lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use quizlive_protocol::{PlayerId, RoomId};
use rand::Rng;
use tokio::sync::mpsc;

use crate::room::spawn_room;
use crate::{GameStore, Question, RoomConfig, RoomError, RoomHandle};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Bounded retry budget for join-code generation.
const CODE_ATTEMPTS: usize = 32;

/// Tracks every live room and its join code.
pub struct RoomRegistry<S: GameStore> {
    /// Live rooms, keyed by room id.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Join code → room. Codes are unique among live rooms and freed on
    /// removal; kept in sync with `rooms`.
    codes: HashMap<String, RoomId>,

    store: Arc<S>,

    /// Handed to each actor so terminal rooms can announce themselves to
    /// the reaper.
    done_tx: mpsc::UnboundedSender<RoomId>,
}

impl<S: GameStore> RoomRegistry<S> {
    /// Creates an empty registry.
    ///
    /// The returned receiver is the reaper feed: every room id that shows
    /// up on it has reached a terminal state (its terminal event already
    /// broadcast) and should be passed to [`remove`](Self::remove).
    pub fn new(store: Arc<S>) -> (Self, mpsc::UnboundedReceiver<RoomId>) {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        (
            Self {
                rooms: HashMap::new(),
                codes: HashMap::new(),
                store,
                done_tx,
            },
            done_rx,
        )
    }

    /// Creates a room for the given host and question list, spawning its
    /// actor. Returns the handle (which carries the id and join code).
    ///
    /// # Errors
    /// - [`RoomError::EmptyQuiz`] — a session needs at least one question.
    /// - [`RoomError::CodeSpaceExhausted`] — join-code retries ran out.
    pub fn create(
        &mut self,
        host_id: PlayerId,
        questions: Vec<Question>,
        config: RoomConfig,
    ) -> Result<RoomHandle, RoomError> {
        if questions.is_empty() {
            return Err(RoomError::EmptyQuiz);
        }

        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let join_code = self.generate_code()?;

        let handle = spawn_room(
            room_id,
            join_code.clone(),
            host_id,
            questions,
            config,
            Arc::clone(&self.store),
            self.done_tx.clone(),
            DEFAULT_CHANNEL_SIZE,
        );

        self.codes.insert(join_code, room_id);
        self.rooms.insert(room_id, handle.clone());
        tracing::info!(%room_id, code = handle.join_code(), "room created");
        Ok(handle)
    }

    /// Looks up a room by id.
    pub fn get(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms.get(&room_id).cloned()
    }

    /// Looks up a room by its join code.
    pub fn by_code(&self, code: &str) -> Option<RoomHandle> {
        self.codes
            .get(code)
            .and_then(|room_id| self.rooms.get(room_id))
            .cloned()
    }

    /// Drops a room from the index, freeing its join code. Idempotent.
    ///
    /// The actor itself is not told anything — this is the reaper path,
    /// called after the actor announced it is already done. For a
    /// server-driven teardown, call [`RoomHandle::shutdown`] first.
    pub fn remove(&mut self, room_id: RoomId) -> Option<RoomHandle> {
        let handle = self.rooms.remove(&room_id)?;
        self.codes.retain(|_, rid| *rid != room_id);
        tracing::info!(%room_id, "room removed from registry");
        Some(handle)
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all live room ids.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    /// Generates a 6-digit numeric code unique among live rooms, with a
    /// bounded number of retries on collision.
    fn generate_code(&self) -> Result<String, RoomError> {
        let mut rng = rand::rng();
        for _ in 0..CODE_ATTEMPTS {
            let code = format!("{:06}", rng.random_range(0..1_000_000u32));
            if !self.codes.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(RoomError::CodeSpaceExhausted)
    }
}
