//! Cabinet connection, dispatch, and replay.
//!
//! This crate provides the plumbing between raw cabinet traffic and typed
//! event subscribers:
//!
//! - **Transport**: WebSocket framing to and from the cabinet
//! - **Connection**: the live connection manager and its keepalive duty
//! - **Pipeline**: mirror → decode → registry lookup → dispatch
//! - **Dispatcher**: per-kind listener sets with stable ordering
//! - **Replay**: timing-faithful re-emission of recorded transcripts
//!
//! # Architecture
//!
//! ```text
//! WebSocket ──┐                           ┌─► stats aggregator
//!             ├─► Pipeline ─► Dispatcher ─┤
//! Transcript ─┘                           └─► match tracker
//! ```
//!
//! The live [`Connection`] and the [`Replayer`] are interchangeable
//! sources; exactly one of them drives a given [`Pipeline`].

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod replay;
pub mod sink;
pub mod transport;

pub use connection::{Connection, ConnectionState};
pub use dispatcher::{Dispatcher, EventCallback, ListenerId, next_listener_id};
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use replay::{ReplayRecord, Replayer, Transcript};
pub use sink::{TrafficSink, WriterSink};
pub use transport::{
    Transport, TransportParts, TransportReceiver, WebSocketTransport, WebSocketTransportReceiver,
    WebSocketTransportSender,
};
