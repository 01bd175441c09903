//! Per-connection handler: handshake, auth, command routing, event pump.
//!
//! Each accepted connection gets its own Tokio task running this handler:
//!
//!   1. Receive `Handshake` → validate protocol version
//!   2. Authenticate the token → [`Identity`]
//!   3. Send `HandshakeAck` → the player is connected
//!   4. Spawn the outbound pump (room events → socket, in room order)
//!   5. Loop: receive envelopes → dispatch system messages and commands
//!
//! Command failures become `error` events to this connection only — they
//! are never broadcast and never disturb another player's state.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use quizlive_protocol::{
    ClientCommand, Codec, Envelope, Payload, PlayerId, RoomId, ServerEvent, SystemMessage,
};
use quizlive_room::{GameStore, RoomConfig, RoomError, RoomHandle};
use quizlive_session::{Authenticator, Identity};
use quizlive_transport::WsConnection;

use crate::server::{PROTOCOL_VERSION, ServerState};
use crate::{QuestionSource, QuizliveError};

/// How long a connection may stay silent (heartbeats included) before the
/// server drops it.
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// How long the client has to open with a handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, Q, S, C>(
    conn: WsConnection,
    state: Arc<ServerState<A, Q, S, C>>,
) -> Result<(), QuizliveError>
where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let start = Instant::now();
    let seq = Arc::new(AtomicU64::new(1));

    // --- Step 1: handshake + auth ---
    let identity = perform_handshake(&conn, &state, &seq, &start).await?;
    let player_id = identity.player_id;
    {
        let mut sessions = state.sessions.lock().await;
        sessions.create(identity.clone())?;
    }
    tracing::info!(%conn_id, %player_id, "player authenticated");

    // --- Step 2: outbound event pump ---
    // Room actors push events into this channel; one task drains it to
    // the socket, so per-room event order survives all the way out.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<ServerEvent>();
    let pump = tokio::spawn({
        let conn = Arc::clone(&conn);
        let codec = state.codec.clone();
        let seq = Arc::clone(&seq);
        async move {
            while let Some(event) = event_rx.recv().await {
                let envelope = Envelope {
                    seq: seq.fetch_add(1, Ordering::Relaxed),
                    timestamp: elapsed_ms(&start),
                    payload: Payload::Event(event),
                };
                let bytes = match codec.encode(&envelope) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode outbound event");
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
        }
    });

    // --- Step 3: command loop ---
    // Rooms this connection touched, with the effective per-room player
    // id (a re-attached user keeps their original record's id).
    let mut memberships: HashMap<RoomId, PlayerId> = HashMap::new();
    let result = command_loop(
        &conn,
        &state,
        &identity,
        &event_tx,
        &mut memberships,
        &seq,
        &start,
    )
    .await;

    // --- Step 4: teardown ---
    // Mark the player inactive everywhere. The rooms keep their record,
    // their score, and their place on the leaderboard.
    for (room_id, actor_id) in &memberships {
        let handle = state.registry.lock().await.get(*room_id);
        if let Some(handle) = handle {
            handle.disconnect(*actor_id).await;
        }
    }
    {
        let mut sessions = state.sessions.lock().await;
        let _ = sessions.disconnect(player_id);
    }
    pump.abort();
    tracing::info!(%conn_id, %player_id, "connection closed");
    result
}

/// Receives the handshake, validates the version, authenticates the token,
/// and acks.
async fn perform_handshake<A, Q, S, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, Q, S, C>>,
    seq: &AtomicU64,
    start: &Instant,
) -> Result<Identity, QuizliveError>
where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec + Clone,
{
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(invalid("connection closed before handshake"));
        }
        Ok(Err(e)) => return Err(QuizliveError::Transport(e)),
        Err(_) => return Err(invalid("handshake timed out")),
    };

    let envelope: Envelope = state.codec.decode(&data)?;
    let (version, token) = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version, token }) => (version, token),
        _ => {
            send_error(conn, &state.codec, seq, start, 400, "expected Handshake").await?;
            return Err(invalid("first message must be Handshake"));
        }
    };

    if version != PROTOCOL_VERSION {
        send_error(
            conn,
            &state.codec,
            seq,
            start,
            400,
            &format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(invalid("protocol version mismatch"));
    }

    let identity = match state.auth.authenticate(token.as_deref()).await {
        Ok(identity) => identity,
        Err(e) => {
            send_error(conn, &state.codec, seq, start, 401, "unauthorized").await?;
            return Err(QuizliveError::Session(e));
        }
    };

    send_system(
        conn,
        &state.codec,
        seq,
        start,
        SystemMessage::HandshakeAck {
            player_id: identity.player_id,
            server_time: elapsed_ms(start),
        },
    )
    .await?;

    Ok(identity)
}

/// The post-handshake receive loop. Returns when the connection closes,
/// idles out, or says goodbye.
async fn command_loop<A, Q, S, C>(
    conn: &WsConnection,
    state: &Arc<ServerState<A, Q, S, C>>,
    identity: &Identity,
    event_tx: &tokio::sync::mpsc::UnboundedSender<ServerEvent>,
    memberships: &mut HashMap<RoomId, PlayerId>,
    seq: &AtomicU64,
    start: &Instant,
) -> Result<(), QuizliveError>
where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec + Clone,
{
    let player_id = identity.player_id;

    loop {
        let data = match tokio::time::timeout(IDLE_TIMEOUT, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                return Ok(());
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                return Ok(());
            }
            Err(_) => {
                tracing::info!(%player_id, "connection idled out");
                return Ok(());
            }
        };

        let envelope: Envelope = match state.codec.decode(&data) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode envelope");
                continue;
            }
        };

        match envelope.payload {
            Payload::System(SystemMessage::Heartbeat { client_time }) => {
                send_system(
                    conn,
                    &state.codec,
                    seq,
                    start,
                    SystemMessage::HeartbeatAck {
                        client_time,
                        server_time: elapsed_ms(start),
                    },
                )
                .await?;
            }
            Payload::System(SystemMessage::Disconnect { reason }) => {
                tracing::info!(%player_id, %reason, "client said goodbye");
                return Ok(());
            }
            Payload::System(_) => {
                tracing::debug!(%player_id, "ignoring unexpected system message");
            }
            Payload::Command(cmd) => {
                handle_command(state, identity, event_tx, memberships, cmd).await;
            }
            Payload::Event(_) => {
                tracing::debug!(%player_id, "client sent a server event, ignoring");
            }
        }
    }
}

/// Routes one client command to the registry/room layer. Failures are
/// reported to this connection's event feed and nowhere else.
async fn handle_command<A, Q, S, C>(
    state: &Arc<ServerState<A, Q, S, C>>,
    identity: &Identity,
    event_tx: &tokio::sync::mpsc::UnboundedSender<ServerEvent>,
    memberships: &mut HashMap<RoomId, PlayerId>,
    cmd: ClientCommand,
) where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec + Clone,
{
    let player_id = identity.player_id;

    match cmd {
        ClientCommand::CreateGame {
            quiz_id,
            max_players,
        } => {
            let questions = match state.source.load(&quiz_id).await {
                Ok(questions) => questions,
                Err(e) => {
                    report(event_tx, e.code(), &e.to_string());
                    return;
                }
            };
            let config = RoomConfig {
                max_players: max_players.unwrap_or(RoomConfig::default().max_players),
            };

            let created = state.registry.lock().await.create(player_id, questions, config);
            match created {
                Ok(handle) => {
                    let _ = event_tx.send(ServerEvent::GameCreated {
                        room_id: handle.room_id(),
                        join_code: handle.join_code().to_string(),
                    });
                }
                Err(e) => report(event_tx, e.code(), &e.to_string()),
            }
        }

        ClientCommand::JoinGame { code, display_name } => {
            // Resolve under the registry lock, join outside it — the
            // actor turn must not run while the global index is held.
            let handle = state.registry.lock().await.by_code(&code);
            let Some(handle) = handle else {
                report(
                    event_tx,
                    404,
                    &RoomError::UnknownCode(code).to_string(),
                );
                return;
            };

            match handle
                .join(
                    player_id,
                    identity.user_id.clone(),
                    display_name,
                    event_tx.clone(),
                )
                .await
            {
                Ok(effective_id) => {
                    memberships.insert(handle.room_id(), effective_id);
                }
                Err(e) => report(event_tx, e.code(), &e.to_string()),
            }
        }

        ClientCommand::StartGame { room_id } => {
            if let Some(handle) = room(state, event_tx, room_id).await {
                if let Err(e) = handle.start(player_id).await {
                    report(event_tx, e.code(), &e.to_string());
                }
            }
        }

        ClientCommand::SubmitAnswer {
            room_id,
            question_id,
            answer,
            response_time_ms,
        } => {
            if let Some(handle) = room(state, event_tx, room_id).await {
                // The effective id: a re-attached user answers under
                // their original record.
                let actor_id = memberships.get(&room_id).copied().unwrap_or(player_id);
                if let Err(e) = handle
                    .submit_answer(actor_id, question_id, answer, response_time_ms)
                    .await
                {
                    report(event_tx, e.code(), &e.to_string());
                }
            }
        }

        ClientCommand::NextQuestion { room_id } => {
            if let Some(handle) = room(state, event_tx, room_id).await {
                if let Err(e) = handle.advance(player_id).await {
                    report(event_tx, e.code(), &e.to_string());
                }
            }
        }

        ClientCommand::GameControl { room_id, action } => {
            if let Some(handle) = room(state, event_tx, room_id).await {
                if let Err(e) = handle.control(player_id, action).await {
                    report(event_tx, e.code(), &e.to_string());
                }
            }
        }

        ClientCommand::JoinMonitor { room_id } => {
            if let Some(handle) = room(state, event_tx, room_id).await {
                match handle.join_monitor(player_id, event_tx.clone()).await {
                    Ok(()) => {
                        memberships.entry(room_id).or_insert(player_id);
                    }
                    Err(e) => report(event_tx, e.code(), &e.to_string()),
                }
            }
        }
    }
}

/// Looks up a room handle, reporting `404` to the issuer when it is gone.
async fn room<A, Q, S, C>(
    state: &Arc<ServerState<A, Q, S, C>>,
    event_tx: &tokio::sync::mpsc::UnboundedSender<ServerEvent>,
    room_id: RoomId,
) -> Option<RoomHandle>
where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec + Clone,
{
    let handle = state.registry.lock().await.get(room_id);
    if handle.is_none() {
        report(event_tx, 404, &RoomError::NotFound(room_id).to_string());
    }
    handle
}

/// Queues an `error` event for the issuing connection.
fn report(
    event_tx: &tokio::sync::mpsc::UnboundedSender<ServerEvent>,
    code: u16,
    message: &str,
) {
    let _ = event_tx.send(ServerEvent::Error {
        code,
        message: message.to_string(),
    });
}

/// Sends a system frame directly on the connection.
async fn send_system(
    conn: &WsConnection,
    codec: &impl Codec,
    seq: &AtomicU64,
    start: &Instant,
    msg: SystemMessage,
) -> Result<(), QuizliveError> {
    let envelope = Envelope {
        seq: seq.fetch_add(1, Ordering::Relaxed),
        timestamp: elapsed_ms(start),
        payload: Payload::System(msg),
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await.map_err(QuizliveError::Transport)
}

/// Sends an `error` event directly on the connection (pre-pump path).
async fn send_error(
    conn: &WsConnection,
    codec: &impl Codec,
    seq: &AtomicU64,
    start: &Instant,
    code: u16,
    message: &str,
) -> Result<(), QuizliveError> {
    let envelope = Envelope {
        seq: seq.fetch_add(1, Ordering::Relaxed),
        timestamp: elapsed_ms(start),
        payload: Payload::Event(ServerEvent::Error {
            code,
            message: message.to_string(),
        }),
    };
    let bytes = codec.encode(&envelope)?;
    conn.send(&bytes).await.map_err(QuizliveError::Transport)
}

fn invalid(message: &str) -> QuizliveError {
    QuizliveError::Protocol(quizlive_protocol::ProtocolError::InvalidMessage(
        message.into(),
    ))
}

fn elapsed_ms(start: &Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
