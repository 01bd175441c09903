//! Per-question countdown timer for Quizlive rooms.
//!
//! One [`QuestionTimer`] per room actor. Starting a question schedules
//! three things as a single unit: a terminal deadline at `now + limit`, a
//! repeating 1-second countdown tick, and one warning when 10 seconds
//! remain. [`QuestionTimer::cancel`] clears all of them together — a timer
//! that outlives its question fires a duplicate or orphaned advancement,
//! which is the primary correctness hazard of this component.
//!
//! # Integration
//!
//! The timer is designed to sit inside a room actor's `tokio::select!`
//! loop. While idle or paused, [`QuestionTimer::wait`] pends forever, so
//! the command branch keeps the actor responsive:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         event = timer.wait() => { /* tick / warning / deadline */ }
//!     }
//! }
//! ```
//!
//! `wait` only mutates the schedule *after* its sleep resolves, so the
//! select! arm can be dropped and re-created every loop iteration without
//! skewing the countdown.

use std::time::Duration;

use tokio::time::{self, Instant as TokioInstant};
use tracing::debug;

/// Remaining time at which the single warning fires.
pub const WARNING_THRESHOLD: Duration = Duration::from_secs(10);

/// Interval between countdown ticks.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What fired, returned by [`QuestionTimer::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Periodic countdown tick (1 Hz while the question is active).
    Tick {
        elapsed_secs: u32,
        remaining_secs: u32,
    },

    /// Fires once per question, when the remaining time reaches
    /// [`WARNING_THRESHOLD`]. Questions whose limit does not exceed the
    /// threshold never fire it.
    Warning { remaining_secs: u32 },

    /// The time limit elapsed. The timer is idle afterwards; it cannot
    /// fire again until the next [`QuestionTimer::start`].
    Deadline,
}

// ---------------------------------------------------------------------------
// Internal schedule
// ---------------------------------------------------------------------------

/// The live schedule of a running question.
#[derive(Debug, Clone, Copy)]
struct Schedule {
    /// When the terminal deadline fires.
    deadline: TokioInstant,
    /// Full question limit, kept to compute elapsed time for ticks.
    limit: Duration,
    /// When the next countdown tick fires.
    next_tick: TokioInstant,
    /// When the warning fires; `None` once fired or not applicable.
    warn_at: Option<TokioInstant>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    /// No question active. `wait` pends forever.
    Idle,
    Running(Schedule),
    /// Paused mid-question. Only the remainder survives; the schedule is
    /// rebuilt from it on resume.
    Paused {
        remaining: Duration,
        limit: Duration,
        warn_pending: bool,
    },
}

// ---------------------------------------------------------------------------
// QuestionTimer
// ---------------------------------------------------------------------------

/// Cancellable deadline-plus-countdown scheduler for one room.
///
/// Owned exclusively by a room actor; never shared, never persisted, and
/// recreated (via [`start`](Self::start)) on every question transition.
#[derive(Debug)]
pub struct QuestionTimer {
    phase: Phase,
}

impl QuestionTimer {
    /// Creates an idle timer.
    pub fn idle() -> Self {
        Self { phase: Phase::Idle }
    }

    /// Starts the schedule for a new question, replacing any previous one.
    pub fn start(&mut self, limit: Duration) {
        let now = TokioInstant::now();
        let deadline = now + limit;
        let warn_at = (limit > WARNING_THRESHOLD).then(|| deadline - WARNING_THRESHOLD);

        self.phase = Phase::Running(Schedule {
            deadline,
            limit,
            next_tick: now + TICK_INTERVAL,
            warn_at,
        });
        debug!(limit_secs = limit.as_secs(), "question timer started");
    }

    /// Cancels the deadline, the countdown tick, and any pending warning
    /// as one unit. Idempotent.
    pub fn cancel(&mut self) {
        if !matches!(self.phase, Phase::Idle) {
            self.phase = Phase::Idle;
            debug!("question timer cancelled");
        }
    }

    /// Pauses the schedule, recording the remaining time.
    ///
    /// Returns the remainder, or `None` if the timer wasn't running.
    pub fn pause(&mut self) -> Option<Duration> {
        let Phase::Running(sched) = self.phase else {
            return None;
        };
        let remaining = sched.deadline.saturating_duration_since(TokioInstant::now());
        self.phase = Phase::Paused {
            remaining,
            limit: sched.limit,
            warn_pending: sched.warn_at.is_some(),
        };
        debug!(remaining_secs = remaining.as_secs(), "question timer paused");
        Some(remaining)
    }

    /// Resumes a paused schedule with the recorded remainder — not a
    /// fresh full duration.
    ///
    /// Returns the remainder, or `None` if the timer wasn't paused.
    pub fn resume(&mut self) -> Option<Duration> {
        let Phase::Paused {
            remaining,
            limit,
            warn_pending,
        } = self.phase
        else {
            return None;
        };

        let now = TokioInstant::now();
        let deadline = now + remaining;
        // A pending warning re-arms relative to the new deadline. If the
        // pause landed inside the warning window it fires on the next wait.
        let warn_at = warn_pending
            .then(|| deadline.checked_sub(WARNING_THRESHOLD).map_or(now, |t| t.max(now)));

        self.phase = Phase::Running(Schedule {
            deadline,
            limit,
            next_tick: now + TICK_INTERVAL,
            warn_at,
        });
        debug!(remaining_secs = remaining.as_secs(), "question timer resumed");
        Some(remaining)
    }

    /// Remaining time of the running or paused question.
    pub fn remaining(&self) -> Option<Duration> {
        match self.phase {
            Phase::Idle => None,
            Phase::Running(sched) => {
                Some(sched.deadline.saturating_duration_since(TokioInstant::now()))
            }
            Phase::Paused { remaining, .. } => Some(remaining),
        }
    }

    /// `true` while a question is actively counting down.
    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// `true` while paused with a recorded remainder.
    pub fn is_paused(&self) -> bool {
        matches!(self.phase, Phase::Paused { .. })
    }

    /// Waits for the next timer event.
    ///
    /// While idle or paused this future pends forever; `tokio::select!`
    /// still services its other branches. A deadline due at the same
    /// instant as a tick wins — the question ends, the tick is dropped.
    pub async fn wait(&mut self) -> TimerEvent {
        let Phase::Running(sched) = self.phase else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        // Pick the earliest due instant; deadline beats warning beats tick
        // on exact ties.
        enum Due {
            Deadline,
            Warning,
            Tick,
        }

        let mut target = sched.deadline;
        let mut due = Due::Deadline;
        if let Some(warn_at) = sched.warn_at {
            if warn_at < target {
                target = warn_at;
                due = Due::Warning;
            }
        }
        if sched.next_tick < target {
            target = sched.next_tick;
            due = Due::Tick;
        }

        time::sleep_until(target).await;

        // Mutate only after the sleep resolves, so a dropped wait() leaves
        // the schedule untouched.
        match due {
            Due::Deadline => {
                self.phase = Phase::Idle;
                TimerEvent::Deadline
            }
            Due::Warning => {
                let remaining = sched.deadline.saturating_duration_since(target);
                if let Phase::Running(live) = &mut self.phase {
                    live.warn_at = None;
                }
                TimerEvent::Warning {
                    remaining_secs: round_secs(remaining),
                }
            }
            Due::Tick => {
                let remaining = sched.deadline.saturating_duration_since(target);
                let elapsed = sched.limit.saturating_sub(remaining);
                if let Phase::Running(live) = &mut self.phase {
                    live.next_tick = target + TICK_INTERVAL;
                }
                TimerEvent::Tick {
                    elapsed_secs: round_secs(elapsed),
                    remaining_secs: round_secs(remaining),
                }
            }
        }
    }
}

impl Default for QuestionTimer {
    fn default() -> Self {
        Self::idle()
    }
}

/// Rounds a duration to whole seconds, absorbing scheduling float noise.
fn round_secs(d: Duration) -> u32 {
    d.as_secs_f64().round() as u32
}
