//! Typed client for the Killer Queen cabinet event stream.
//!
//! Killer Queen cabinets broadcast a line-oriented event feed over a
//! WebSocket. This crate decodes that feed — live, or replayed from a
//! recorded transcript — into typed events and fans them out to
//! subscribers.
//!
//! # Example
//!
//! ```ignore
//! use kq::{KqStream, KqStreamOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = KqStream::new(KqStreamOptions::default());
//!
//!     stream.on_player_kill(|kill| {
//!         println!("{:?} killed {:?} at ({}, {})",
//!                  kill.by.character(), kill.killed.character(),
//!                  kill.pos.x, kill.pos.y);
//!     });
//!
//!     stream.connect("ws://kq.local:12749").await?;
//!     tokio::signal::ctrl_c().await?;
//!     stream.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! The wire layer lives in `kq-protocol` and the plumbing in `kq-runtime`;
//! both are re-exported here as needed.

pub mod match_state;
pub mod stats;
pub mod stream;

pub use kq_protocol::{
    ActiveMatch, Character, CharacterId, EventKind, GameEvent, PlayerKill, PlayerNames, Position,
};
pub use kq_runtime::{
    ConnectionState, Error, ListenerId, Result, TrafficSink, Transcript, WriterSink,
};
pub use match_state::{
    CabColor, CurrentTeams, Match, MatchEventKind, MatchNotification, MatchScore, MatchSettings,
    MatchState, MatchTeam, Scores,
};
pub use stats::{CharacterStats, GameStats, KqStat, Statistic};
pub use stream::{KqStream, KqStreamOptions};
