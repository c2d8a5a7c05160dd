//! Event kinds, the tagged payload union, and the parser table.
//!
//! Adding a subscribable event kind means adding a payload type, a parser
//! function, and one table row here; the codec, dispatcher, and connection
//! code stay untouched.

use serde::{Deserialize, Serialize};

use crate::active_match::{ActiveMatch, parse_active_match};
use crate::player_kill::{PlayerKill, parse_player_kill};

/// Discriminator for the subscribable event kinds.
///
/// The `alive` keepalive is deliberately absent: it is answered at the
/// connection layer and never reaches subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    PlayerNames,
    PlayerKill,
    CurrentMatch,
    NextMatch,
}

impl EventKind {
    /// The key this kind uses on the wire.
    pub fn key(self) -> &'static str {
        match self {
            EventKind::PlayerNames => "playernames",
            EventKind::PlayerKill => "playerKill",
            EventKind::CurrentMatch => "currentmatch",
            EventKind::NextMatch => "nextmatch",
        }
    }
}

/// Roster broadcast. What the values mean is not understood upstream, so
/// the payload stays empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerNames {}

/// One decoded, typed event.
///
/// `currentmatch` and `nextmatch` share the [`ActiveMatch`] payload shape
/// but stay distinct kinds, so a listener can tell which cabinet slot the
/// bracket update refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PlayerNames(PlayerNames),
    PlayerKill(PlayerKill),
    CurrentMatch(ActiveMatch),
    NextMatch(ActiveMatch),
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::PlayerNames(_) => EventKind::PlayerNames,
            GameEvent::PlayerKill(_) => EventKind::PlayerKill,
            GameEvent::CurrentMatch(_) => EventKind::CurrentMatch,
            GameEvent::NextMatch(_) => EventKind::NextMatch,
        }
    }
}

type ParserFn = fn(&str) -> GameEvent;

fn player_names_event(_raw: &str) -> GameEvent {
    GameEvent::PlayerNames(PlayerNames {})
}

fn player_kill_event(raw: &str) -> GameEvent {
    GameEvent::PlayerKill(parse_player_kill(raw))
}

fn current_match_event(raw: &str) -> GameEvent {
    GameEvent::CurrentMatch(parse_active_match(raw))
}

fn next_match_event(raw: &str) -> GameEvent {
    GameEvent::NextMatch(parse_active_match(raw))
}

static BUILTIN: &[(&str, ParserFn)] = &[
    ("playernames", player_names_event),
    ("playerKill", player_kill_event),
    ("currentmatch", current_match_event),
    ("nextmatch", next_match_event),
];

/// The fixed table mapping wire keys to parsers, assembled at build time.
///
/// Lookup is by exact key match against a decoded frame's key. Keys the
/// table does not know are the designed extension point for traffic the
/// client chooses not to support.
#[derive(Debug, Clone, Copy)]
pub struct EventRegistry {
    entries: &'static [(&'static str, ParserFn)],
}

impl EventRegistry {
    /// The registry with every built-in kind.
    pub const fn builtin() -> EventRegistry {
        EventRegistry { entries: BUILTIN }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Parses a frame's raw value into a typed event, or `None` when the
    /// key is unknown.
    pub fn parse(&self, key: &str, raw_value: &str) -> Option<GameEvent> {
        let (_, parser) = self.entries.iter().find(|(k, _)| *k == key)?;
        Some(parser(raw_value))
    }

    /// Wire keys in table order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(k, _)| *k)
    }
}

impl Default for EventRegistry {
    fn default() -> EventRegistry {
        EventRegistry::builtin()
    }
}
