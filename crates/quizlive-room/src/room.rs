//! The room actor: an isolated Tokio task that owns one quiz session.
//!
//! Each room runs in its own task and is the only writer of its state —
//! players, answers, the current question, the timer. The outside world
//! talks to it through an mpsc command channel, so commands (joins,
//! answers, host controls, timer firings) are processed strictly one at a
//! time, in arrival order. That single-writer discipline is what makes
//! "no duplicate answer", "monotonic score", and "deterministic
//! leaderboard" hold under concurrent submissions.
//!
//! Each turn separates decision from effect: the transition and its event
//! list are computed first, then persistence runs, then events broadcast.

use std::collections::HashMap;
use std::sync::Arc;

use quizlive_protocol::{AnswerPayload, ControlAction, PlayerId, QuestionId, RoomId, ServerEvent};
use quizlive_timer::{QuestionTimer, TimerEvent};
use tokio::sync::{mpsc, oneshot};

use crate::{
    AnswerRecord, GameStore, GameSummary, Player, PlayerRecord, PlayerStatus, Question, RoomConfig,
    RoomError, RoomStatus, rank, score,
};

/// Channel sender for delivering events to one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `oneshot::Sender` are request/reply: the gateway sends
/// the command and forwards an `Err` to the issuing connection as an
/// `error` event. Everything else the room says goes out through the
/// player/monitor event channels.
pub(crate) enum RoomCommand {
    Join {
        player_id: PlayerId,
        user_id: Option<String>,
        display_name: String,
        sender: EventSender,
        /// Replies with the *effective* player id: a returning user is
        /// re-attached to their original record, whose id may differ from
        /// the new connection's.
        reply: oneshot::Sender<Result<PlayerId, RoomError>>,
    },

    Start {
        requester: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    SubmitAnswer {
        player_id: PlayerId,
        question_id: QuestionId,
        answer: AnswerPayload,
        response_time_ms: u64,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Host-initiated skip to the next question.
    Advance {
        requester: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Control {
        requester: PlayerId,
        action: ControlAction,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    JoinMonitor {
        requester: PlayerId,
        sender: EventSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Connection loss. Fire-and-forget; never fails outward.
    Disconnect { player_id: PlayerId },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// Server-driven teardown (not the host's `end`).
    Shutdown,
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub join_code: String,
    pub host_id: PlayerId,
    pub status: RoomStatus,
    pub player_count: usize,
    pub max_players: usize,
    /// 0-based index of the live question; `None` before the game starts.
    pub current_question: Option<usize>,
    pub question_count: usize,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    join_code: String,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn join_code(&self) -> &str {
        &self.join_code
    }

    /// Joins (or re-attaches) a player. Returns the effective player id
    /// to use for this room in later commands.
    pub async fn join(
        &self,
        player_id: PlayerId,
        user_id: Option<String>,
        display_name: String,
        sender: EventSender,
    ) -> Result<PlayerId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player_id,
                user_id,
                display_name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    pub async fn start(&self, requester: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { requester, reply })
            .await
    }

    pub async fn submit_answer(
        &self,
        player_id: PlayerId,
        question_id: QuestionId,
        answer: AnswerPayload,
        response_time_ms: u64,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::SubmitAnswer {
            player_id,
            question_id,
            answer,
            response_time_ms,
            reply,
        })
        .await
    }

    pub async fn advance(&self, requester: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Advance { requester, reply })
            .await
    }

    pub async fn control(
        &self,
        requester: PlayerId,
        action: ControlAction,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Control {
            requester,
            action,
            reply,
        })
        .await
    }

    pub async fn join_monitor(
        &self,
        requester: PlayerId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::JoinMonitor {
            requester,
            sender,
            reply,
        })
        .await
    }

    /// Marks the player's connection as gone. Fire-and-forget.
    pub async fn disconnect(&self, player_id: PlayerId) {
        let _ = self
            .sender
            .send(RoomCommand::Disconnect { player_id })
            .await;
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), RoomError>>) -> RoomCommand,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }
}

// ---------------------------------------------------------------------------
// The actor
// ---------------------------------------------------------------------------

struct RoomActor<S: GameStore> {
    room_id: RoomId,
    join_code: String,
    host_id: PlayerId,
    config: RoomConfig,
    status: RoomStatus,
    /// Ordered, immutable; fixed at session creation. Never empty.
    questions: Vec<Question>,
    /// Index of the live question. Monotonically non-decreasing.
    current: usize,
    players: HashMap<PlayerId, Player>,
    /// Stable user id → player, for re-attaching returning users.
    by_user: HashMap<String, PlayerId>,
    /// Display name → player, for the uniqueness check.
    by_name: HashMap<String, PlayerId>,
    /// Per-player room-channel senders. A disconnected player has no entry.
    senders: HashMap<PlayerId, EventSender>,
    /// Monitor-channel senders (host connections).
    monitors: HashMap<PlayerId, EventSender>,
    /// The idempotency ledger: at most one record per (player, question).
    answers: HashMap<(PlayerId, QuestionId), AnswerRecord>,
    /// How many answers the live question has received.
    answered_current: usize,
    next_join_order: u64,
    timer: QuestionTimer,
    store: Arc<S>,
    receiver: mpsc::Receiver<RoomCommand>,
    /// Tells the registry reaper this room reached a terminal state.
    done_tx: mpsc::UnboundedSender<RoomId>,
}

impl<S: GameStore> RoomActor<S> {
    /// Runs the actor loop until the room is terminal or torn down.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, host = %self.host_id, "room actor started");

        loop {
            tokio::select! {
                maybe_cmd = self.receiver.recv() => {
                    match maybe_cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }
                event = self.timer.wait() => {
                    self.handle_timer(event).await;
                }
            }

            if self.status.is_terminal() {
                break;
            }
        }

        // The terminal event has been broadcast; let the registry drop us.
        let _ = self.done_tx.send(self.room_id);
        tracing::info!(room_id = %self.room_id, status = %self.status, "room actor stopped");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                player_id,
                user_id,
                display_name,
                sender,
                reply,
            } => {
                let result = self.handle_join(player_id, user_id, display_name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Start { requester, reply } => {
                let result = self.handle_start(requester);
                let _ = reply.send(result);
            }
            RoomCommand::SubmitAnswer {
                player_id,
                question_id,
                answer,
                response_time_ms,
                reply,
            } => {
                let result = self
                    .handle_submit(player_id, question_id, answer, response_time_ms)
                    .await;
                let _ = reply.send(result);
            }
            RoomCommand::Advance { requester, reply } => {
                let result = self.handle_advance(Some(requester)).await;
                let _ = reply.send(result);
            }
            RoomCommand::Control {
                requester,
                action,
                reply,
            } => {
                let result = self.handle_control(requester, action).await;
                let _ = reply.send(result);
            }
            RoomCommand::JoinMonitor {
                requester,
                sender,
                reply,
            } => {
                let result = self.handle_join_monitor(requester, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Disconnect { player_id } => {
                self.handle_disconnect(player_id);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room_id, "room shutting down");
                self.timer.cancel();
                self.status = RoomStatus::Cancelled;
            }
        }
    }

    /// A timer firing is a command like any other — processed in turn,
    /// and a failure inside it must never take the actor down.
    async fn handle_timer(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick {
                elapsed_secs,
                remaining_secs,
            } => {
                let question_id = self.questions[self.current].id;
                self.broadcast(ServerEvent::TimerTick {
                    question_id,
                    elapsed_secs,
                    remaining_secs,
                });
            }
            TimerEvent::Warning { remaining_secs } => {
                let question_id = self.questions[self.current].id;
                self.broadcast(ServerEvent::TimerWarning {
                    question_id,
                    remaining_secs,
                });
            }
            TimerEvent::Deadline => {
                // Automatic advancement when the time limit elapses.
                if let Err(e) = self.handle_advance(None).await {
                    tracing::error!(
                        room_id = %self.room_id,
                        error = %e,
                        "deadline advance failed"
                    );
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Join / disconnect
    // -----------------------------------------------------------------

    fn handle_join(
        &mut self,
        player_id: PlayerId,
        user_id: Option<String>,
        display_name: String,
        sender: EventSender,
    ) -> Result<PlayerId, RoomError> {
        if !self.status.is_joinable() {
            return Err(RoomError::State(format!(
                "cannot join a {} room",
                self.status
            )));
        }

        // A returning user re-attaches to their existing record — same
        // score, same streak, no duplicate player.
        let existing = user_id
            .as_deref()
            .filter(|u| !u.is_empty())
            .and_then(|u| self.by_user.get(u).copied())
            .or_else(|| self.players.contains_key(&player_id).then_some(player_id));
        if let Some(effective_id) = existing {
            let status = self.active_player_status();
            let player = self
                .players
                .get_mut(&effective_id)
                .expect("indexes only reference live players");
            player.status = status;
            player.touch();
            self.senders.insert(effective_id, sender);

            tracing::info!(
                room_id = %self.room_id,
                player = %effective_id,
                "player re-attached"
            );
            self.announce_join(effective_id);
            return Ok(effective_id);
        }

        if let Some(holder) = self.by_name.get(&display_name) {
            if *holder != player_id {
                return Err(RoomError::NameTaken(display_name));
            }
        }
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::Capacity(self.room_id));
        }

        let player = Player::new(
            player_id,
            user_id.clone(),
            display_name.clone(),
            self.next_join_order,
            self.active_player_status(),
        );
        self.next_join_order += 1;

        if let Some(user) = user_id {
            self.by_user.insert(user, player_id);
        }
        self.by_name.insert(display_name, player_id);
        self.persist_player_best_effort(&player);
        self.players.insert(player_id, player);
        self.senders.insert(player_id, sender);

        tracing::info!(
            room_id = %self.room_id,
            player = %player_id,
            players = self.players.len(),
            "player joined"
        );
        self.announce_join(player_id);
        Ok(player_id)
    }

    /// Status a (re)joining player gets, given the room's current status.
    fn active_player_status(&self) -> PlayerStatus {
        match self.status {
            RoomStatus::Waiting => PlayerStatus::Ready,
            _ => PlayerStatus::Playing,
        }
    }

    /// Broadcasts the join and, mid-game, hands the newcomer the live
    /// question so they can participate immediately.
    fn announce_join(&mut self, player_id: PlayerId) {
        let summary = self.players[&player_id].summary();
        self.broadcast(ServerEvent::PlayerJoined {
            room_id: self.room_id,
            player: summary,
            player_count: self.players.len(),
        });

        if matches!(self.status, RoomStatus::InProgress | RoomStatus::Paused) {
            let question = self.questions[self.current].public();
            self.send_to(player_id, ServerEvent::QuestionStarted { question });
        }
    }

    fn handle_disconnect(&mut self, player_id: PlayerId) {
        self.monitors.remove(&player_id);
        self.senders.remove(&player_id);

        if let Some(player) = self.players.get_mut(&player_id) {
            player.status = PlayerStatus::Disconnected;
            player.touch();
            tracing::info!(
                room_id = %self.room_id,
                player = %player_id,
                "player disconnected"
            );
        }
        // Disconnection never changes room status, removes the player
        // from scoring, or cancels a timer — the room outlives its
        // connections until the host ends it.
    }

    // -----------------------------------------------------------------
    // Start / advance / control
    // -----------------------------------------------------------------

    fn handle_start(&mut self, requester: PlayerId) -> Result<(), RoomError> {
        if requester != self.host_id {
            return Err(RoomError::Permission("start the game"));
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::State(format!(
                "cannot start a {} room",
                self.status
            )));
        }
        if self.players.is_empty() {
            return Err(RoomError::State("no players have joined".into()));
        }

        self.status = RoomStatus::InProgress;
        for player in self.players.values_mut() {
            if player.status != PlayerStatus::Disconnected {
                player.status = PlayerStatus::Playing;
            }
        }
        tracing::info!(
            room_id = %self.room_id,
            players = self.players.len(),
            questions = self.questions.len(),
            "game started"
        );
        self.broadcast(ServerEvent::GameStarted {
            question_count: self.questions.len(),
        });
        self.begin_question(0);
        Ok(())
    }

    /// Ends the current question and moves on. `requester` is `None` for
    /// timer-driven advancement, `Some` for the host's manual skip.
    async fn handle_advance(&mut self, requester: Option<PlayerId>) -> Result<(), RoomError> {
        if let Some(requester) = requester {
            if requester != self.host_id {
                return Err(RoomError::Permission("advance the question"));
            }
        }
        if self.status != RoomStatus::InProgress {
            return Err(RoomError::State(format!(
                "cannot advance a {} room",
                self.status
            )));
        }

        self.end_current_question();

        if self.current + 1 < self.questions.len() {
            self.begin_question(self.current + 1);
        } else {
            self.finish_game(true).await;
        }
        Ok(())
    }

    async fn handle_control(
        &mut self,
        requester: PlayerId,
        action: ControlAction,
    ) -> Result<(), RoomError> {
        if requester != self.host_id {
            return Err(RoomError::Permission("control the game"));
        }

        match action {
            ControlAction::Pause => {
                if self.status != RoomStatus::InProgress {
                    return Err(RoomError::State(format!(
                        "cannot pause a {} room",
                        self.status
                    )));
                }
                // The timer holds its remainder; the question index and
                // every recorded answer stay put.
                let remaining = self.timer.pause().unwrap_or_default();
                self.status = RoomStatus::Paused;
                tracing::info!(room_id = %self.room_id, "game paused");
                self.broadcast(ServerEvent::GamePaused {
                    remaining_secs: remaining.as_secs() as u32,
                });
                Ok(())
            }
            ControlAction::Resume => {
                if self.status != RoomStatus::Paused {
                    return Err(RoomError::State(format!(
                        "cannot resume a {} room",
                        self.status
                    )));
                }
                // Rescheduled with the remaining time, not a fresh limit.
                let remaining = self.timer.resume().unwrap_or_default();
                self.status = RoomStatus::InProgress;
                tracing::info!(room_id = %self.room_id, "game resumed");
                self.broadcast(ServerEvent::GameResumed {
                    remaining_secs: remaining.as_secs() as u32,
                });
                Ok(())
            }
            ControlAction::End => {
                if self.status.is_terminal() {
                    return Err(RoomError::State("game already over".into()));
                }
                // A game that never started is cancelled, not finished.
                let completed = self.status != RoomStatus::Waiting;
                self.finish_game(completed).await;
                Ok(())
            }
        }
    }

    fn handle_join_monitor(
        &mut self,
        requester: PlayerId,
        sender: EventSender,
    ) -> Result<(), RoomError> {
        if requester != self.host_id {
            return Err(RoomError::Permission("monitor the game"));
        }

        // Bring the monitor up to date with the current standings.
        let _ = sender.send(ServerEvent::LeaderboardUpdated {
            entries: rank::rank_players(&self.players),
        });
        self.monitors.insert(requester, sender);
        tracing::debug!(room_id = %self.room_id, "monitor joined");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Answer submission
    // -----------------------------------------------------------------

    async fn handle_submit(
        &mut self,
        player_id: PlayerId,
        question_id: QuestionId,
        answer: AnswerPayload,
        response_time_ms: u64,
    ) -> Result<(), RoomError> {
        if self.status != RoomStatus::InProgress {
            return Err(RoomError::State(format!(
                "cannot answer while the game is {}",
                self.status
            )));
        }
        let question = &self.questions[self.current];
        if question.id != question_id {
            return Err(RoomError::State(
                "question is not the current one".into(),
            ));
        }
        if !self.players.contains_key(&player_id) {
            return Err(RoomError::UnknownPlayer(player_id));
        }
        // Idempotency: the check and the insert below happen in the same
        // serialized turn, so two racing submissions cannot both pass.
        if self.answers.contains_key(&(player_id, question_id)) {
            return Err(RoomError::DuplicateAnswer);
        }

        // Decision: score the submission (pure, no state touched yet).
        let current_streak = self.players[&player_id].streak;
        let outcome = score::score_answer(question, &answer, response_time_ms, current_streak);
        let record = AnswerRecord {
            player_id,
            question_id,
            correct: outcome.correct,
            points: outcome.points,
            response_time_ms,
        };

        // Effect 1: persist, before any in-memory mutation. One retry;
        // a second failure leaves the room exactly as it was.
        self.persist_answer(record.clone()).await?;

        // Effect 2: apply the mutation.
        self.answers.insert((player_id, question_id), record);
        self.answered_current += 1;
        let player = self
            .players
            .get_mut(&player_id)
            .expect("existence checked above");
        player.apply_score(&outcome, response_time_ms);
        player.status = PlayerStatus::Playing;
        let score_total = player.score;
        let snapshot = PlayerRecord::of(player);
        self.persist_player_snapshot_best_effort(snapshot);

        // Effect 3: events, in command order.
        self.send_to(
            player_id,
            ServerEvent::AnswerResult {
                question_id,
                correct: outcome.correct,
                points: outcome.points,
                speed_multiplier: outcome.speed_multiplier,
                streak_multiplier: outcome.streak_multiplier,
                streak: outcome.new_streak,
                score: score_total,
            },
        );
        self.broadcast(ServerEvent::PlayerAnswered {
            player_id,
            answered: self.answered_current,
            player_count: self.players.len(),
        });
        self.broadcast(ServerEvent::LeaderboardUpdated {
            entries: rank::rank_players(&self.players),
        });
        Ok(())
    }

    // -----------------------------------------------------------------
    // Question lifecycle
    // -----------------------------------------------------------------

    fn begin_question(&mut self, index: usize) {
        self.current = index;
        self.answered_current = 0;

        let question = &self.questions[index];
        // A fresh schedule for every question; the previous one was
        // cancelled by whatever transition got us here.
        self.timer.start(question.time_limit());
        tracing::info!(
            room_id = %self.room_id,
            question = %question.id,
            index,
            limit_secs = question.time_limit_secs,
            "question started"
        );
        self.broadcast(ServerEvent::QuestionStarted {
            question: question.public(),
        });
    }

    /// Cancels the timer and reveals the answer. Part of every transition
    /// out of "question active" — the cancel must happen in the same turn.
    fn end_current_question(&mut self) {
        self.timer.cancel();

        let question = &self.questions[self.current];
        self.broadcast(ServerEvent::QuestionEnded {
            question_id: question.id,
            correct: question.correct_answer(),
            explanation: question.explanation.clone(),
            answered: self.answered_current,
        });
        self.broadcast(ServerEvent::LeaderboardUpdated {
            entries: rank::rank_players(&self.players),
        });
    }

    /// Moves the room to its terminal state and broadcasts the final
    /// leaderboard. `completed` is false for a cancelled-before-start
    /// session.
    async fn finish_game(&mut self, completed: bool) {
        self.timer.cancel();
        self.status = if completed {
            RoomStatus::Finished
        } else {
            RoomStatus::Cancelled
        };
        for player in self.players.values_mut() {
            if player.status != PlayerStatus::Disconnected {
                player.status = PlayerStatus::Finished;
            }
        }

        let leaderboard = rank::rank_players(&self.players);
        let summary = GameSummary {
            room_id: self.room_id,
            completed,
            question_count: self.questions.len(),
            leaderboard: leaderboard.clone(),
        };

        // Finalization is retried once; the game still ends for the
        // players if the write is lost — the failure is logged, not
        // surfaced.
        if self.store.finalize_game(summary.clone()).await.is_err() {
            if let Err(e) = self.store.finalize_game(summary).await {
                tracing::warn!(
                    room_id = %self.room_id,
                    error = %e,
                    "finalize write failed after retry"
                );
            }
        }

        tracing::info!(room_id = %self.room_id, status = %self.status, "game over");
        self.broadcast(ServerEvent::GameEnded { leaderboard });
    }

    // -----------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------

    /// Awaited inside the turn: the next command for this room is not
    /// admitted until this write (or its retry) resolves.
    async fn persist_answer(&self, record: AnswerRecord) -> Result<(), RoomError> {
        if let Err(e) = self.store.record_answer(self.room_id, record.clone()).await {
            tracing::warn!(
                room_id = %self.room_id,
                error = %e,
                "answer write failed, retrying once"
            );
            self.store.record_answer(self.room_id, record).await?;
        }
        Ok(())
    }

    fn persist_player_best_effort(&self, player: &Player) {
        self.persist_player_snapshot_best_effort(PlayerRecord::of(player));
    }

    /// Best-effort write-behind: spawned off the turn, retried once,
    /// logged on failure.
    fn persist_player_snapshot_best_effort(&self, record: PlayerRecord) {
        let store = Arc::clone(&self.store);
        let room_id = self.room_id;
        tokio::spawn(async move {
            if store.update_player(room_id, record.clone()).await.is_err() {
                if let Err(e) = store.update_player(room_id, record).await {
                    tracing::warn!(%room_id, error = %e, "player write failed after retry");
                }
            }
        });
    }

    // -----------------------------------------------------------------
    // Event delivery
    // -----------------------------------------------------------------

    /// Sends to every player connection and every monitor, in the order
    /// the originating command was processed.
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
        for (monitor_id, sender) in &self.monitors {
            // A host playing along already received the room copy.
            if !self.senders.contains_key(monitor_id) {
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Sends to one player's connection. Silently drops if it is gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            join_code: self.join_code.clone(),
            host_id: self.host_id,
            status: self.status,
            player_count: self.players.len(),
            max_players: self.config.max_players,
            current_question: (self.status != RoomStatus::Waiting).then_some(self.current),
            question_count: self.questions.len(),
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue — senders wait when the room
/// is saturated, which is the engine's only backpressure point.
pub(crate) fn spawn_room<S: GameStore>(
    room_id: RoomId,
    join_code: String,
    host_id: PlayerId,
    questions: Vec<Question>,
    config: RoomConfig,
    store: Arc<S>,
    done_tx: mpsc::UnboundedSender<RoomId>,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room_id,
        join_code: join_code.clone(),
        host_id,
        config,
        status: RoomStatus::Waiting,
        questions,
        current: 0,
        players: HashMap::new(),
        by_user: HashMap::new(),
        by_name: HashMap::new(),
        senders: HashMap::new(),
        monitors: HashMap::new(),
        answers: HashMap::new(),
        answered_current: 0,
        next_join_order: 0,
        timer: QuestionTimer::idle(),
        store,
        receiver: rx,
        done_tx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        join_code,
        sender: tx,
    }
}
