//! `playerKill` payload.

use serde::{Deserialize, Serialize};

use crate::character::CharacterId;

/// Where on the map a kill happened, in cabinet screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One kill, as broadcast by the cabinet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerKill {
    pub pos: Position,
    pub killed: CharacterId,
    pub by: CharacterId,
}

/// Parses the 4-field comma list `x,y,by,killed`.
///
/// The killer comes third on the wire and the victim fourth; the payload
/// names them the other way around. Missing or non-numeric fields become
/// NaN — the parser never fails.
pub fn parse_player_kill(raw: &str) -> PlayerKill {
    let mut fields = raw.split(',');
    let mut next = || fields.next().unwrap_or("");
    let x = parse_coordinate(next());
    let y = parse_coordinate(next());
    let by = CharacterId::parse(next());
    let killed = CharacterId::parse(next());
    PlayerKill {
        pos: Position { x, y },
        killed,
        by,
    }
}

fn parse_coordinate(field: &str) -> f64 {
    field.trim().parse().unwrap_or(f64::NAN)
}
