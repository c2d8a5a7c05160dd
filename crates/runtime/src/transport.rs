//! Transport layer for cabinet connections.
//!
//! A connected transport is split three ways, which is the shape the
//! connection consumes: a boxed sender for outbound frames, a receiver
//! task that pumps inbound text into a channel, and the channel's
//! receiving half.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Boxed future returned by the transport traits.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Outbound half of a transport.
pub trait Transport: Send {
    /// Sends one frame line to the cabinet.
    fn send(&mut self, line: String) -> TransportFuture<'_, ()>;

    /// Closes the transport.
    fn close(&mut self) -> TransportFuture<'_, ()>;
}

/// Inbound half of a transport. `run` pumps messages into the channel
/// handed out at connect time until the peer closes or the read fails.
pub trait TransportReceiver: Send {
    fn run(self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>;
}

/// A connected transport, split into the pieces the connection owns.
pub struct TransportParts {
    pub sender: Box<dyn Transport>,
    pub receiver: Box<dyn TransportReceiver>,
    pub message_rx: mpsc::UnboundedReceiver<String>,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport speaking the cabinet's text-frame protocol.
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Opens a WebSocket to the cabinet. Resolves once the handshake
    /// completes; a failure here is the connect failure callers usually
    /// treat as fatal.
    pub async fn connect(address: &str) -> Result<TransportParts> {
        let (stream, _response) = connect_async(address)
            .await
            .map_err(|error| Error::ConnectionFailed(error.to_string()))?;
        let (sink, stream) = stream.split();
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        Ok(TransportParts {
            sender: Box::new(WebSocketTransportSender { sink }),
            receiver: Box::new(WebSocketTransportReceiver { stream, message_tx }),
            message_rx,
        })
    }
}

/// Outbound half of [`WebSocketTransport`].
pub struct WebSocketTransportSender {
    sink: SplitSink<WsStream, Message>,
}

impl Transport for WebSocketTransportSender {
    fn send(&mut self, line: String) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.sink
                .send(Message::Text(line))
                .await
                .map_err(|error| Error::TransportError(error.to_string()))
        })
    }

    fn close(&mut self) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            self.sink
                .close()
                .await
                .map_err(|error| Error::TransportError(error.to_string()))
        })
    }
}

/// Inbound half of [`WebSocketTransport`].
pub struct WebSocketTransportReceiver {
    stream: SplitStream<WsStream>,
    message_tx: mpsc::UnboundedSender<String>,
}

impl TransportReceiver for WebSocketTransportReceiver {
    fn run(mut self: Box<Self>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> {
        Box::pin(async move {
            while let Some(message) = self.stream.next().await {
                let message =
                    message.map_err(|error| Error::TransportError(error.to_string()))?;
                match message {
                    Message::Text(text) => {
                        // One frame per message; strip the line terminator
                        // some cabinet firmware appends.
                        let line = text.trim_end_matches(['\r', '\n']).to_string();
                        if self.message_tx.send(line).is_err() {
                            // Consumer is gone; orderly shutdown.
                            return Ok(());
                        }
                    }
                    Message::Close(_) => {
                        debug!("cabinet closed the connection");
                        return Ok(());
                    }
                    // tungstenite answers pings at the protocol level.
                    other => trace!(?other, "ignoring non-text message"),
                }
            }
            Ok(())
        })
    }
}
