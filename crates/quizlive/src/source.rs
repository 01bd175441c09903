//! The quiz-authoring boundary.
//!
//! Quiz content lives elsewhere (an authoring service, a database, files
//! on disk). The engine only needs one thing from it: given a quiz id,
//! the ordered, immutable question list a new session will run. That is
//! the whole [`QuestionSource`] contract.

use std::collections::HashMap;

use quizlive_room::Question;

/// Errors from the quiz-content collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// No quiz exists under the given id.
    #[error("quiz {0:?} not found")]
    UnknownQuiz(String),

    /// The backing storage failed.
    #[error("quiz storage failed: {0}")]
    Storage(String),
}

impl SourceError {
    /// HTTP-style code used in the wire `error` event.
    pub fn code(&self) -> u16 {
        match self {
            Self::UnknownQuiz(_) => 404,
            Self::Storage(_) => 503,
        }
    }
}

/// Supplies the question list for a new session.
pub trait QuestionSource: Send + Sync + 'static {
    /// Loads the ordered question list for `quiz_id`.
    fn load(
        &self,
        quiz_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Question>, SourceError>> + Send;
}

/// An in-memory [`QuestionSource`] holding preloaded quizzes. Used by the
/// demo server and tests; production deployments implement the trait over
/// their quiz storage.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    quizzes: HashMap<String, Vec<Question>>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a quiz under the given id.
    pub fn with_quiz(mut self, quiz_id: impl Into<String>, questions: Vec<Question>) -> Self {
        self.quizzes.insert(quiz_id.into(), questions);
        self
    }
}

impl QuestionSource for FixtureSource {
    async fn load(&self, quiz_id: &str) -> Result<Vec<Question>, SourceError> {
        self.quizzes
            .get(quiz_id)
            .cloned()
            .ok_or_else(|| SourceError::UnknownQuiz(quiz_id.to_string()))
    }
}
