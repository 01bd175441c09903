//! The question model, including answer keys.
//!
//! Questions come from the quiz-authoring collaborator as an ordered,
//! immutable list when a session is created; the engine never edits them.
//! The full [`Question`] (with its [`AnswerKey`]) stays inside the room
//! actor — players only ever see the [`QuestionPublic`] projection.

use std::collections::BTreeSet;
use std::time::Duration;

use quizlive_protocol::{CorrectAnswer, QuestionId, QuestionKind, QuestionPublic};
use serde::{Deserialize, Serialize};

/// The correct-answer key, one variant per question type.
///
/// Correctness checking dispatches over this closed enum — one pure
/// strategy per variant, in [`crate::score`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerKey {
    /// Exactly one option is correct.
    SingleChoice { options: Vec<String>, correct: u32 },

    /// The selected set must equal `correct` exactly. No partial credit.
    MultiSelect {
        options: Vec<String>,
        correct: BTreeSet<u32>,
    },

    TrueFalse { correct: bool },

    /// Free-text answer checked against every accepted spelling after
    /// trimming (and case-folding unless `case_sensitive`).
    ShortText {
        accepted: Vec<String>,
        case_sensitive: bool,
    },
}

impl AnswerKey {
    /// The wire-visible kind tag for this key.
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::SingleChoice { .. } => QuestionKind::SingleChoice,
            Self::MultiSelect { .. } => QuestionKind::MultiSelect,
            Self::TrueFalse { .. } => QuestionKind::TrueFalse,
            Self::ShortText { .. } => QuestionKind::ShortText,
        }
    }

    /// Option texts shown to players; empty for true/false and text.
    pub fn options(&self) -> &[String] {
        match self {
            Self::SingleChoice { options, .. } | Self::MultiSelect { options, .. } => options,
            Self::TrueFalse { .. } | Self::ShortText { .. } => &[],
        }
    }
}

/// One question of a quiz, as the engine holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    /// 0-based position in the quiz.
    pub index: usize,
    pub text: String,
    pub key: AnswerKey,
    pub point_value: u32,
    pub time_limit_secs: u32,
    /// Shown to everyone when the question ends.
    pub explanation: Option<String>,
}

impl Question {
    /// The player-facing projection: everything needed to answer, nothing
    /// that reveals correctness.
    pub fn public(&self) -> QuestionPublic {
        QuestionPublic {
            id: self.id,
            index: self.index,
            text: self.text.clone(),
            kind: self.key.kind(),
            options: self.key.options().to_vec(),
            point_value: self.point_value,
            time_limit_secs: self.time_limit_secs,
        }
    }

    /// The reveal payload for `question_ended`.
    pub fn correct_answer(&self) -> CorrectAnswer {
        match &self.key {
            AnswerKey::SingleChoice { correct, .. } => CorrectAnswer::Options {
                indexes: vec![*correct],
            },
            AnswerKey::MultiSelect { correct, .. } => CorrectAnswer::Options {
                indexes: correct.iter().copied().collect(),
            },
            AnswerKey::TrueFalse { correct } => CorrectAnswer::Bool { value: *correct },
            AnswerKey::ShortText { accepted, .. } => CorrectAnswer::Text {
                accepted: accepted.clone(),
            },
        }
    }

    /// The question's time limit as a [`Duration`].
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.time_limit_secs))
    }
}
