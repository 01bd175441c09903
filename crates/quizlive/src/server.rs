//! `Server` builder and accept loop.
//!
//! This is the entry point for running a Quizlive server. It ties the
//! layers together: transport → protocol → session → rooms, and runs the
//! reaper that drops terminal rooms out of the registry.

use std::sync::Arc;

use quizlive_protocol::{Codec, JsonCodec, RoomId};
use quizlive_room::{GameStore, NullStore, RoomRegistry};
use quizlive_session::{Authenticator, SessionConfig, SessionManager};
use quizlive_transport::WsListener;
use tokio::sync::{Mutex, mpsc};

use crate::handler::handle_connection;
use crate::{QuestionSource, QuizliveError};

/// The current protocol version. Clients must send it in their handshake
/// or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state handed to each connection handler task.
pub(crate) struct ServerState<A, Q, S, C>
where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec,
{
    pub(crate) sessions: Mutex<SessionManager>,
    /// The one cross-room shared resource: the roomId→actor index. One
    /// lock, held only for index operations, never across an actor turn.
    pub(crate) registry: Mutex<RoomRegistry<S>>,
    pub(crate) auth: A,
    pub(crate) source: Q,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Quizlive server.
///
/// ```rust,ignore
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build(GuestAuthenticator, my_source, NullStore)
///     .await?;
/// server.run().await
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Builds the server with the given authenticator, quiz source, and
    /// write-behind store. Uses `JsonCodec` — the codec the web client
    /// speaks.
    pub async fn build<A, Q, S>(
        self,
        auth: A,
        source: Q,
        store: S,
    ) -> Result<Server<A, Q, S, JsonCodec>, QuizliveError>
    where
        A: Authenticator,
        Q: QuestionSource,
        S: GameStore,
    {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let (registry, reaper_rx) = RoomRegistry::new(Arc::new(store));

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            registry: Mutex::new(registry),
            auth,
            source,
            codec: JsonCodec,
        });

        Ok(Server {
            listener,
            state,
            reaper_rx,
        })
    }

    /// Convenience for demos and tests: no persistence.
    pub async fn build_without_store<A, Q>(
        self,
        auth: A,
        source: Q,
    ) -> Result<Server<A, Q, NullStore, JsonCodec>, QuizliveError>
    where
        A: Authenticator,
        Q: QuestionSource,
    {
        self.build(auth, source, NullStore).await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Quizlive server. Call [`run`](Self::run) to start accepting
/// connections.
pub struct Server<A, Q, S, C>
where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec,
{
    listener: WsListener,
    state: Arc<ServerState<A, Q, S, C>>,
    reaper_rx: mpsc::UnboundedReceiver<RoomId>,
}

impl<A, Q, S, C> Server<A, Q, S, C>
where
    A: Authenticator,
    Q: QuestionSource,
    S: GameStore,
    C: Codec + Clone,
{
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process terminates.
    ///
    /// Every accepted connection gets its own handler task; terminal
    /// rooms are removed from the registry by the reaper task as their
    /// actors report done.
    pub async fn run(self) -> Result<(), QuizliveError> {
        tracing::info!("Quizlive server running");

        // The reaper: rooms announce themselves on this channel after
        // broadcasting their terminal event.
        let reaper_state = Arc::clone(&self.state);
        let mut reaper_rx = self.reaper_rx;
        tokio::spawn(async move {
            while let Some(room_id) = reaper_rx.recv().await {
                reaper_state.registry.lock().await.remove(room_id);
            }
        });

        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
