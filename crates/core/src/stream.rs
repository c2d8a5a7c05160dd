//! High-level stream facade.

use std::sync::Arc;

use kq_protocol::{ActiveMatch, EventKind, GameEvent, PlayerKill, PlayerNames};
use kq_runtime::{
    Connection, ConnectionState, Error, ListenerId, Pipeline, Replayer, Result, TrafficSink,
    Transcript,
};
use tokio::sync::Mutex;

/// Construction options for [`KqStream`].
#[derive(Default)]
pub struct KqStreamOptions {
    /// Optional sink every raw line is mirrored to. What it collects is a
    /// transcript [`read`](KqStream::read) can replay later.
    pub sink: Option<Box<dyn TrafficSink>>,
}

/// A typed client for one cabinet's event stream.
///
/// Exactly one source drives a stream: a live connection
/// ([`connect`](KqStream::connect)) or a replayed transcript
/// ([`read`](KqStream::read)). Subscriptions work the same either way.
pub struct KqStream {
    pipeline: Arc<Pipeline>,
    connection: Mutex<Option<Connection>>,
}

impl KqStream {
    pub fn new(options: KqStreamOptions) -> KqStream {
        KqStream {
            pipeline: Arc::new(Pipeline::new(options.sink)),
            connection: Mutex::new(None),
        }
    }

    /// The pipeline behind this stream, for collaborators that feed it
    /// directly.
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Connects to a live cabinet.
    ///
    /// Resolves after the WebSocket handshake; events then flow to
    /// subscribers until [`disconnect`](KqStream::disconnect). Fails with
    /// [`Error::AlreadyConnected`] when a connection is active, and with
    /// [`Error::ConnectionFailed`] when the handshake fails — there is no
    /// retry.
    pub async fn connect(&self, address: &str) -> Result<()> {
        let mut connection = self.connection.lock().await;
        if connection.is_some() {
            return Err(Error::AlreadyConnected);
        }
        *connection = Some(Connection::connect(address, Arc::clone(&self.pipeline)).await?);
        Ok(())
    }

    /// Tears down the live connection, if any.
    pub async fn disconnect(&self) {
        if let Some(connection) = self.connection.lock().await.take() {
            connection.disconnect().await;
        }
    }

    /// Current connection lifecycle state. Reports `Connecting` while a
    /// handshake is in flight and `Disconnected` when this stream has no
    /// live connection (e.g. replay mode).
    pub fn state(&self) -> ConnectionState {
        match self.connection.try_lock() {
            Ok(connection) => connection
                .as_ref()
                .map_or(ConnectionState::Disconnected, Connection::state),
            // `connect` holds the lock across the handshake.
            Err(_) => ConnectionState::Connecting,
        }
    }

    /// Parses a recorded transcript and schedules its replay through this
    /// stream at the original relative timing.
    ///
    /// Returns once everything is scheduled; replay reports no completion.
    /// Callers that need to wait it out can parse the [`Transcript`]
    /// themselves and bound the wait with its span.
    pub fn read(&self, transcript_text: &str) -> Result<()> {
        let transcript = Transcript::parse(transcript_text)?;
        self.replay(&transcript);
        Ok(())
    }

    /// Replays an already-parsed transcript.
    pub fn replay(&self, transcript: &Transcript) {
        Replayer::new(Arc::clone(&self.pipeline)).play(transcript);
    }

    /// Registers a callback for one event kind.
    pub fn on<F>(&self, kind: EventKind, callback: F) -> ListenerId
    where
        F: Fn(&GameEvent) + Send + Sync + 'static,
    {
        self.pipeline.dispatcher().subscribe(kind, callback)
    }

    /// Removes one listener. Returns true iff it existed.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.pipeline.dispatcher().unsubscribe(kind, id)
    }

    /// Removes every listener for a kind. Returns true iff any existed.
    pub fn off_all(&self, kind: EventKind) -> bool {
        self.pipeline.dispatcher().unsubscribe_all(kind)
    }

    /// Typed subscription to `playerKill`.
    pub fn on_player_kill<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&PlayerKill) + Send + Sync + 'static,
    {
        self.on(EventKind::PlayerKill, move |event| {
            if let GameEvent::PlayerKill(kill) = event {
                callback(kill);
            }
        })
    }

    /// Typed subscription to `currentmatch`.
    pub fn on_current_match<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&ActiveMatch) + Send + Sync + 'static,
    {
        self.on(EventKind::CurrentMatch, move |event| {
            if let GameEvent::CurrentMatch(state) = event {
                callback(state);
            }
        })
    }

    /// Typed subscription to `nextmatch`.
    pub fn on_next_match<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&ActiveMatch) + Send + Sync + 'static,
    {
        self.on(EventKind::NextMatch, move |event| {
            if let GameEvent::NextMatch(state) = event {
                callback(state);
            }
        })
    }

    /// Typed subscription to `playernames`.
    pub fn on_player_names<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&PlayerNames) + Send + Sync + 'static,
    {
        self.on(EventKind::PlayerNames, move |event| {
            if let GameEvent::PlayerNames(names) = event {
                callback(names);
            }
        })
    }
}

impl Default for KqStream {
    fn default() -> KqStream {
        KqStream::new(KqStreamOptions::default())
    }
}
