//! A runnable Quizlive server with a built-in trivia quiz.
//!
//! Start it, create a game with quiz id `trivia-night`, share the join
//! code, and play. Guests are accepted; pass a token to get a stable
//! identity that survives reconnects.

use std::collections::BTreeSet;

use quizlive::prelude::*;

fn trivia_night() -> Vec<Question> {
    vec![
        Question {
            id: QuestionId(1),
            index: 0,
            text: "Rust's mascot Ferris is a crab.".into(),
            key: AnswerKey::TrueFalse { correct: true },
            point_value: 500,
            time_limit_secs: 15,
            explanation: Some("Ferris the crab, hence 'rustaceans'.".into()),
        },
        Question {
            id: QuestionId(2),
            index: 1,
            text: "Which planet is closest to the sun?".into(),
            key: AnswerKey::SingleChoice {
                options: vec![
                    "Venus".into(),
                    "Mercury".into(),
                    "Mars".into(),
                    "Earth".into(),
                ],
                correct: 1,
            },
            point_value: 1000,
            time_limit_secs: 20,
            explanation: None,
        },
        Question {
            id: QuestionId(3),
            index: 2,
            text: "Select every prime number.".into(),
            key: AnswerKey::MultiSelect {
                options: vec!["2".into(), "6".into(), "7".into(), "9".into()],
                correct: BTreeSet::from([0, 2]),
            },
            point_value: 1500,
            time_limit_secs: 30,
            explanation: Some("2 and 7; 6 and 9 are composite.".into()),
        },
        Question {
            id: QuestionId(4),
            index: 3,
            text: "What is the chemical symbol for gold?".into(),
            key: AnswerKey::ShortText {
                accepted: vec!["Au".into()],
                case_sensitive: false,
            },
            point_value: 1000,
            time_limit_secs: 25,
            explanation: Some("From the Latin 'aurum'.".into()),
        },
    ]
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let source = FixtureSource::new().with_quiz("trivia-night", trivia_night());

    let server = ServerBuilder::new()
        .bind("0.0.0.0:8080")
        .build_without_store(GuestAuthenticator, source)
        .await?;

    eprintln!("trivia-night server on 0.0.0.0:8080 — quiz id: trivia-night");
    server.run().await?;
    Ok(())
}
