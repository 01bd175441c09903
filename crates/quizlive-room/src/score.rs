//! The scoring engine: pure functions, no shared state, one call per
//! submitted answer.
//!
//! Correctness dispatches over the closed [`AnswerKey`] enum — one
//! strategy per question type. Points combine the question's base value
//! with a speed multiplier (how fast, relative to the time limit) and a
//! streak multiplier (consecutive correct answers). The caller applies the
//! resulting streak to the player record; this module never mutates
//! anything.

use crate::question::{AnswerKey, Question};
use quizlive_protocol::AnswerPayload;

/// Speed tiers, evaluated in ascending order with inclusive thresholds:
/// a response at exactly 25% of the limit still earns the 2.00 tier.
const SPEED_TIERS: [(f64, f64); 3] = [(0.25, 2.00), (0.50, 1.50), (0.75, 1.25)];

/// The result of scoring one submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreOutcome {
    pub correct: bool,
    /// Points earned by this answer. Always 0 when incorrect.
    pub points: u32,
    /// Zeroed when incorrect — no tier applies.
    pub speed_multiplier: f64,
    pub streak_multiplier: f64,
    /// The streak the caller should store: `current + 1` on a correct
    /// answer, 0 otherwise.
    pub new_streak: u32,
}

/// Scores one submission against a question.
///
/// `current_streak` is the player's streak *before* this answer; the
/// streak multiplier is computed from the new streak, so the third
/// consecutive correct answer is already worth 1.25×.
pub fn score_answer(
    question: &Question,
    answer: &AnswerPayload,
    response_time_ms: u64,
    current_streak: u32,
) -> ScoreOutcome {
    if !is_correct(&question.key, answer) {
        return ScoreOutcome {
            correct: false,
            points: 0,
            speed_multiplier: 0.0,
            streak_multiplier: 0.0,
            new_streak: 0,
        };
    }

    let new_streak = current_streak + 1;
    let speed = speed_multiplier(response_time_ms, u64::from(question.time_limit_secs) * 1000);
    let streak = streak_multiplier(new_streak);
    let points = (f64::from(question.point_value) * speed * streak).floor() as u32;

    ScoreOutcome {
        correct: true,
        points,
        speed_multiplier: speed,
        streak_multiplier: streak,
        new_streak,
    }
}

// ---------------------------------------------------------------------------
// Correctness strategies, one per question type
// ---------------------------------------------------------------------------

/// Dispatches to the strategy matching the key. A payload whose shape
/// doesn't match the question type is incorrect, not an error — the
/// player simply answered the wrong kind of question.
fn is_correct(key: &AnswerKey, answer: &AnswerPayload) -> bool {
    match (key, answer) {
        (AnswerKey::SingleChoice { correct, .. }, AnswerPayload::Choice { selected }) => {
            selected == correct
        }
        (AnswerKey::MultiSelect { correct, .. }, AnswerPayload::Choices { selected }) => {
            // Exact set equality. Selecting a strict subset of the correct
            // options earns nothing.
            selected == correct
        }
        (AnswerKey::TrueFalse { correct }, AnswerPayload::Bool { value }) => value == correct,
        (
            AnswerKey::ShortText {
                accepted,
                case_sensitive,
            },
            AnswerPayload::Text { value },
        ) => text_matches(accepted, *case_sensitive, value),
        _ => false,
    }
}

/// Normalized membership test for short-text answers: trim surrounding
/// whitespace, case-fold unless the question is case-sensitive.
fn text_matches(accepted: &[String], case_sensitive: bool, value: &str) -> bool {
    let submitted = value.trim();
    if case_sensitive {
        accepted.iter().any(|a| a.trim() == submitted)
    } else {
        let submitted = submitted.to_lowercase();
        accepted.iter().any(|a| a.trim().to_lowercase() == submitted)
    }
}

// ---------------------------------------------------------------------------
// Multipliers
// ---------------------------------------------------------------------------

/// First matching tier wins; slower than 75% of the limit earns 1.00.
fn speed_multiplier(response_time_ms: u64, limit_ms: u64) -> f64 {
    if limit_ms == 0 {
        return 1.0;
    }
    let ratio = response_time_ms as f64 / limit_ms as f64;
    for (threshold, multiplier) in SPEED_TIERS {
        if ratio <= threshold {
            return multiplier;
        }
    }
    1.0
}

/// Streak tiers on the *new* streak: ≥10 → 2.00, ≥5 → 1.50, ≥3 → 1.25.
fn streak_multiplier(streak: u32) -> f64 {
    match streak {
        10.. => 2.00,
        5..=9 => 1.50,
        3..=4 => 1.25,
        _ => 1.00,
    }
}

// =========================================================================
// Tests
// =========================================================================
