//! Live connection manager.
//!
//! Owns one WebSocket connection to a cabinet and drives a [`Pipeline`]
//! from it: a reader task pumps the socket, a dispatch task feeds each
//! inbound line to the pipeline, and a writer task drains the outbound
//! channel that carries keepalive replies.
//!
//! There is deliberately no reconnect or backoff logic here. A dropped
//! cabinet stays dropped until the caller connects again; anything smarter
//! has to be layered on top.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::transport::{TransportParts, WebSocketTransport};

/// Lifecycle of a cabinet connection.
///
/// Transitions are driven by transport events, never by application code
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
    Failed,
}

/// A live cabinet connection driving a [`Pipeline`].
pub struct Connection {
    state: Arc<Mutex<ConnectionState>>,
    outbound_tx: mpsc::UnboundedSender<String>,
    pipeline: Arc<Pipeline>,
    reader_task: JoinHandle<()>,
    writer_task: JoinHandle<()>,
    pump_task: JoinHandle<()>,
}

impl Connection {
    /// Connects to a cabinet and starts driving the pipeline.
    ///
    /// Resolves after the transport handshake; per-message progress is
    /// observed through subscriptions, not here. A handshake failure is
    /// returned as [`Error::ConnectionFailed`] and nothing is retried.
    ///
    /// [`Error::ConnectionFailed`]: crate::Error::ConnectionFailed
    pub async fn connect(address: &str, pipeline: Arc<Pipeline>) -> Result<Connection> {
        let parts = WebSocketTransport::connect(address).await?;
        Ok(Connection::from_parts(parts, pipeline))
    }

    /// Assembles a connection from already-connected transport halves.
    /// Tests use this with in-memory transports.
    pub fn from_parts(parts: TransportParts, pipeline: Arc<Pipeline>) -> Connection {
        let TransportParts {
            mut sender,
            receiver,
            mut message_rx,
        } = parts;

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        pipeline.attach_outbound(outbound_tx.clone());

        let state = Arc::new(Mutex::new(ConnectionState::Connected));

        let reader_state = Arc::clone(&state);
        let reader_task = tokio::spawn(async move {
            match receiver.run().await {
                Ok(()) => {
                    debug!("transport reader finished");
                    *reader_state.lock() = ConnectionState::Closed;
                }
                Err(error) => {
                    error!(%error, "transport read failed");
                    *reader_state.lock() = ConnectionState::Failed;
                }
            }
        });

        let writer_task = tokio::spawn(async move {
            while let Some(line) = outbound_rx.recv().await {
                if let Err(error) = sender.send(line).await {
                    error!(%error, "transport write failed");
                    break;
                }
            }
            let _ = sender.close().await;
        });

        let pump_pipeline = Arc::clone(&pipeline);
        let pump_task = tokio::spawn(async move {
            while let Some(message) = message_rx.recv().await {
                pump_pipeline.process_message(&message);
            }
        });

        Connection {
            state,
            outbound_tx,
            pipeline,
            reader_task,
            writer_task,
            pump_task,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Queues one raw frame line for sending.
    pub fn send_raw(&self, line: String) -> bool {
        self.outbound_tx.send(line).is_ok()
    }

    /// Tears the connection down: detaches from the pipeline, lets the
    /// writer drain and close the socket, then stops the reader.
    pub async fn disconnect(self) {
        self.pipeline.detach_outbound();
        let Connection {
            state,
            outbound_tx,
            reader_task,
            writer_task,
            pump_task,
            pipeline: _,
        } = self;
        drop(outbound_tx);
        let _ = writer_task.await;
        reader_task.abort();
        pump_task.abort();
        *state.lock() = ConnectionState::Closed;
    }
}
