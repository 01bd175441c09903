//! End-to-end tests: a real WebSocket client against a full server.
//!
//! These cover the gateway path the unit suites can't: handshake over the
//! wire, command routing into room actors, event fan-out back to the
//! right connections, and error delivery to the issuer only.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quizlive::prelude::*;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Fixtures and helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const QUIZ_ID: &str = "pub-quiz";

fn fixture_quiz() -> Vec<Question> {
    vec![
        Question {
            id: QuestionId(1),
            index: 0,
            text: "The capital of Australia is Canberra.".into(),
            key: AnswerKey::TrueFalse { correct: true },
            point_value: 1000,
            time_limit_secs: 30,
            explanation: Some("Not Sydney.".into()),
        },
        Question {
            id: QuestionId(2),
            index: 1,
            text: "2 + 2?".into(),
            key: AnswerKey::SingleChoice {
                options: vec!["3".into(), "4".into(), "5".into()],
                correct: 1,
            },
            point_value: 500,
            time_limit_secs: 30,
            explanation: None,
        },
    ]
}

/// Starts a server on a random port and returns its address.
async fn start_server() -> String {
    let source = FixtureSource::new().with_quiz(QUIZ_ID, fixture_quiz());
    let server = ServerBuilder::new()
        .bind("127.0.0.1:0")
        .build_without_store(GuestAuthenticator, source)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn envelope(seq: u64, payload: Payload) -> Message {
    let envelope = Envelope {
        seq,
        timestamp: 0,
        payload,
    };
    Message::Binary(serde_json::to_vec(&envelope).expect("encode").into())
}

async fn send_command(ws: &mut ClientWs, seq: u64, cmd: ClientCommand) {
    ws.send(envelope(seq, Payload::Command(cmd)))
        .await
        .expect("send should succeed");
}

async fn recv_envelope(ws: &mut ClientWs) -> Envelope {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if msg.is_binary() || msg.is_text() {
            return serde_json::from_slice(&msg.into_data()).expect("decode envelope");
        }
    }
}

/// Receives the next engine event, skipping timer noise and system frames.
async fn next_event(ws: &mut ClientWs) -> ServerEvent {
    loop {
        match recv_envelope(ws).await.payload {
            Payload::Event(ServerEvent::TimerTick { .. })
            | Payload::Event(ServerEvent::TimerWarning { .. }) => continue,
            Payload::Event(event) => return event,
            Payload::System(_) => continue,
            Payload::Command(cmd) => panic!("server sent a client command: {cmd:?}"),
        }
    }
}

/// Performs the handshake and returns the assigned player id.
async fn handshake(ws: &mut ClientWs, token: Option<&str>) -> PlayerId {
    ws.send(envelope(
        0,
        Payload::System(SystemMessage::Handshake {
            version: PROTOCOL_VERSION,
            token: token.map(String::from),
        }),
    ))
    .await
    .expect("handshake send");

    match recv_envelope(ws).await.payload {
        Payload::System(SystemMessage::HandshakeAck { player_id, .. }) => player_id,
        other => panic!("expected HandshakeAck, got {other:?}"),
    }
}

/// Creates a game and returns (room_id, join_code).
async fn create_game(ws: &mut ClientWs, seq: u64) -> (RoomId, String) {
    send_command(
        ws,
        seq,
        ClientCommand::CreateGame {
            quiz_id: QUIZ_ID.into(),
            max_players: None,
        },
    )
    .await;
    match next_event(ws).await {
        ServerEvent::GameCreated { room_id, join_code } => (room_id, join_code),
        other => panic!("expected GameCreated, got {other:?}"),
    }
}

// =========================================================================
// Handshake
// =========================================================================

#[tokio::test]
async fn test_handshake_assigns_player_id() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    let player_id = handshake(&mut ws, None).await;
    assert!(player_id.0 > 0);
}

#[tokio::test]
async fn test_handshake_version_mismatch_is_rejected() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(envelope(
        0,
        Payload::System(SystemMessage::Handshake {
            version: PROTOCOL_VERSION + 1,
            token: None,
        }),
    ))
    .await
    .unwrap();

    match recv_envelope(&mut ws).await.payload {
        Payload::Event(ServerEvent::Error { code, message }) => {
            assert_eq!(code, 400);
            assert!(message.contains("version"));
        }
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_message_must_be_handshake() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(envelope(
        0,
        Payload::System(SystemMessage::Heartbeat { client_time: 1 }),
    ))
    .await
    .unwrap();

    match recv_envelope(&mut ws).await.payload {
        Payload::Event(ServerEvent::Error { code, .. }) => assert_eq!(code, 400),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_heartbeat_is_acked() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, None).await;

    ws.send(envelope(
        1,
        Payload::System(SystemMessage::Heartbeat { client_time: 777 }),
    ))
    .await
    .unwrap();

    match recv_envelope(&mut ws).await.payload {
        Payload::System(SystemMessage::HeartbeatAck { client_time, .. }) => {
            assert_eq!(client_time, 777);
        }
        other => panic!("expected HeartbeatAck, got {other:?}"),
    }
}

// =========================================================================
// Game creation and joining
// =========================================================================

#[tokio::test]
async fn test_create_game_returns_numeric_join_code() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, None).await;

    let (_room_id, join_code) = create_game(&mut ws, 1).await;

    assert_eq!(join_code.len(), 6);
    assert!(join_code.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_create_game_unknown_quiz_is_404() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, None).await;

    send_command(
        &mut ws,
        1,
        ClientCommand::CreateGame {
            quiz_id: "no-such-quiz".into(),
            max_players: None,
        },
    )
    .await;

    match next_event(&mut ws).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 404),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_with_bad_code_is_404() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    handshake(&mut ws, None).await;

    send_command(
        &mut ws,
        1,
        ClientCommand::JoinGame {
            code: "000000".into(),
            display_name: "ada".into(),
        },
    )
    .await;

    match next_event(&mut ws).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 404),
        other => panic!("expected Error, got {other:?}"),
    }
}

// =========================================================================
// Full game flow
// =========================================================================

#[tokio::test]
async fn test_full_game_flow_host_and_player() {
    let addr = start_server().await;

    // Host: create, then watch through the monitor channel.
    let mut host = connect(&addr).await;
    handshake(&mut host, None).await;
    let (room_id, join_code) = create_game(&mut host, 1).await;
    send_command(&mut host, 2, ClientCommand::JoinMonitor { room_id }).await;
    assert!(matches!(
        next_event(&mut host).await,
        ServerEvent::LeaderboardUpdated { .. }
    ));

    // Player: join by code.
    let mut player = connect(&addr).await;
    let player_id = handshake(&mut player, None).await;
    send_command(
        &mut player,
        1,
        ClientCommand::JoinGame {
            code: join_code,
            display_name: "ada".into(),
        },
    )
    .await;

    match next_event(&mut player).await {
        ServerEvent::PlayerJoined {
            room_id: joined_room,
            player: summary,
            player_count,
        } => {
            assert_eq!(joined_room, room_id);
            assert_eq!(summary.id, player_id);
            assert_eq!(player_count, 1);
        }
        other => panic!("expected PlayerJoined, got {other:?}"),
    }
    // The monitor mirrors the join.
    assert!(matches!(
        next_event(&mut host).await,
        ServerEvent::PlayerJoined { .. }
    ));

    // Host starts the game; both sides see it begin.
    send_command(&mut host, 3, ClientCommand::StartGame { room_id }).await;
    assert!(matches!(
        next_event(&mut player).await,
        ServerEvent::GameStarted { .. }
    ));
    let question = match next_event(&mut player).await {
        ServerEvent::QuestionStarted { question } => question,
        other => panic!("expected QuestionStarted, got {other:?}"),
    };
    assert_eq!(question.id, QuestionId(1));
    assert_eq!(question.kind, QuestionKind::TrueFalse);
    assert!(matches!(
        next_event(&mut host).await,
        ServerEvent::GameStarted { .. }
    ));
    assert!(matches!(
        next_event(&mut host).await,
        ServerEvent::QuestionStarted { .. }
    ));

    // Player answers fast and correctly: 1000 × 2.00 speed × 1.00 streak.
    send_command(
        &mut player,
        2,
        ClientCommand::SubmitAnswer {
            room_id,
            question_id: QuestionId(1),
            answer: AnswerPayload::Bool { value: true },
            response_time_ms: 5_000,
        },
    )
    .await;

    match next_event(&mut player).await {
        ServerEvent::AnswerResult {
            correct,
            points,
            streak,
            score,
            ..
        } => {
            assert!(correct);
            assert_eq!(points, 2000);
            assert_eq!(streak, 1);
            assert_eq!(score, 2000);
        }
        other => panic!("expected AnswerResult, got {other:?}"),
    }

    // The monitor sees the progress and the new standings; the player's
    // AnswerResult never reaches it.
    match next_event(&mut host).await {
        ServerEvent::PlayerAnswered {
            player_id: answered_by,
            answered,
            ..
        } => {
            assert_eq!(answered_by, player_id);
            assert_eq!(answered, 1);
        }
        other => panic!("expected PlayerAnswered, got {other:?}"),
    }
    match next_event(&mut host).await {
        ServerEvent::LeaderboardUpdated { entries } => {
            assert_eq!(entries[0].score, 2000);
        }
        other => panic!("expected LeaderboardUpdated, got {other:?}"),
    }

    // Host skips ahead: the reveal includes the correct answer.
    send_command(&mut host, 4, ClientCommand::NextQuestion { room_id }).await;
    loop {
        match next_event(&mut player).await {
            ServerEvent::QuestionEnded {
                question_id,
                correct,
                ..
            } => {
                assert_eq!(question_id, QuestionId(1));
                assert_eq!(correct, CorrectAnswer::Bool { value: true });
                break;
            }
            ServerEvent::PlayerAnswered { .. } | ServerEvent::LeaderboardUpdated { .. } => {
                continue;
            }
            other => panic!("expected QuestionEnded, got {other:?}"),
        }
    }

    // Host ends the game early: final leaderboard to everyone.
    send_command(
        &mut host,
        5,
        ClientCommand::GameControl {
            room_id,
            action: ControlAction::End,
        },
    )
    .await;
    loop {
        match next_event(&mut player).await {
            ServerEvent::GameEnded { leaderboard } => {
                assert_eq!(leaderboard.len(), 1);
                assert_eq!(leaderboard[0].score, 2000);
                assert_eq!(leaderboard[0].rank, 1);
                break;
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_non_host_start_gets_403_and_room_stays_waiting() {
    let addr = start_server().await;

    let mut host = connect(&addr).await;
    handshake(&mut host, None).await;
    let (room_id, join_code) = create_game(&mut host, 1).await;

    let mut player = connect(&addr).await;
    handshake(&mut player, None).await;
    send_command(
        &mut player,
        1,
        ClientCommand::JoinGame {
            code: join_code.clone(),
            display_name: "ada".into(),
        },
    )
    .await;
    assert!(matches!(
        next_event(&mut player).await,
        ServerEvent::PlayerJoined { .. }
    ));

    // The player tries to start the host's game.
    send_command(&mut player, 2, ClientCommand::StartGame { room_id }).await;
    match next_event(&mut player).await {
        ServerEvent::Error { code, .. } => assert_eq!(code, 403),
        other => panic!("expected Error, got {other:?}"),
    }

    // The room is untouched: a second join still works, which it would
    // not if the game had started and finished.
    let mut second = connect(&addr).await;
    handshake(&mut second, None).await;
    send_command(
        &mut second,
        1,
        ClientCommand::JoinGame {
            code: join_code,
            display_name: "grace".into(),
        },
    )
    .await;
    assert!(matches!(
        next_event(&mut second).await,
        ServerEvent::PlayerJoined { player_count: 2, .. }
    ));
}

#[tokio::test]
async fn test_duplicate_answer_over_wire_is_409() {
    let addr = start_server().await;

    let mut host = connect(&addr).await;
    handshake(&mut host, None).await;
    let (room_id, join_code) = create_game(&mut host, 1).await;

    let mut player = connect(&addr).await;
    handshake(&mut player, None).await;
    send_command(
        &mut player,
        1,
        ClientCommand::JoinGame {
            code: join_code,
            display_name: "ada".into(),
        },
    )
    .await;
    // Wait for the join to land before the host starts, then drain until
    // the question is live.
    assert!(matches!(
        next_event(&mut player).await,
        ServerEvent::PlayerJoined { .. }
    ));
    send_command(&mut host, 2, ClientCommand::StartGame { room_id }).await;
    loop {
        if let ServerEvent::QuestionStarted { .. } = next_event(&mut player).await {
            break;
        }
    }

    for attempt in 0..2u64 {
        send_command(
            &mut player,
            2 + attempt,
            ClientCommand::SubmitAnswer {
                room_id,
                question_id: QuestionId(1),
                answer: AnswerPayload::Bool { value: true },
                response_time_ms: 4_000,
            },
        )
        .await;
    }

    // First submission scores; the retry is rejected to this connection
    // only.
    assert!(matches!(
        next_event(&mut player).await,
        ServerEvent::AnswerResult { correct: true, .. }
    ));
    loop {
        match next_event(&mut player).await {
            ServerEvent::Error { code, .. } => {
                assert_eq!(code, 409);
                break;
            }
            ServerEvent::PlayerAnswered { .. } | ServerEvent::LeaderboardUpdated { .. } => {
                continue;
            }
            other => panic!("expected duplicate-answer Error, got {other:?}"),
        }
    }
}
