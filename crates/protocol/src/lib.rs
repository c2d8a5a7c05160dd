//! Wire types for the Killer Queen cabinet event stream.
//!
//! This crate contains the envelope codec and the payload types for the
//! cabinet's line-oriented feed. Types in this crate are:
//!
//! - **Pure data**: no I/O, no scheduling — decoding a line never blocks
//! - **Total**: payload parsers never fail; numeric fields that do not
//!   parse become NaN, a cabinet-firmware quirk that is preserved rather
//!   than papered over
//! - **Closed**: the set of event kinds is fixed at build time
//!
//! Plumbing (transport, dispatch, replay) lives in `kq-runtime`.

pub mod active_match;
pub mod character;
pub mod events;
pub mod frame;
pub mod player_kill;

pub use active_match::{ActiveMatch, parse_active_match};
pub use character::{Character, CharacterId, UnknownCharacter};
pub use events::{EventKind, EventRegistry, GameEvent, PlayerNames};
pub use frame::{
    Frame, KEEPALIVE_KEY, KEEPALIVE_REPLY_KEY, MalformedFrame, decode, encode, keepalive_reply,
};
pub use player_kill::{PlayerKill, Position, parse_player_kill};
