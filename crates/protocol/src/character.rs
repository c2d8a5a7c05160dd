//! Character roster and wire identifiers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The ten playable character slots, numbered the way the cabinet numbers
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Character {
    GoldQueen = 1,
    BlueQueen = 2,
    GoldStripes = 3,
    BlueStripes = 4,
    GoldAbs = 5,
    BlueAbs = 6,
    GoldSkulls = 7,
    BlueSkulls = 8,
    GoldChecks = 9,
    BlueChecks = 10,
}

/// Wire id does not name a roster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown character id {0}")]
pub struct UnknownCharacter(pub u8);

impl Character {
    /// Every slot, in wire-id order.
    pub const ALL: [Character; 10] = [
        Character::GoldQueen,
        Character::BlueQueen,
        Character::GoldStripes,
        Character::BlueStripes,
        Character::GoldAbs,
        Character::BlueAbs,
        Character::GoldSkulls,
        Character::BlueSkulls,
        Character::GoldChecks,
        Character::BlueChecks,
    ];

    /// Cabinet wire id (1-10).
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Queens earn their killer a queen-kill credit.
    pub fn is_queen(self) -> bool {
        matches!(self, Character::GoldQueen | Character::BlueQueen)
    }
}

impl From<Character> for u8 {
    fn from(character: Character) -> u8 {
        character as u8
    }
}

impl TryFrom<u8> for Character {
    type Error = UnknownCharacter;

    fn try_from(id: u8) -> Result<Character, UnknownCharacter> {
        Character::ALL
            .into_iter()
            .find(|character| character.id() == id)
            .ok_or(UnknownCharacter(id))
    }
}

/// Raw character identifier as it appears on the wire.
///
/// The cabinet sends numeric slot ids, but fields that fail numeric parsing
/// become a NaN sentinel rather than a decode error, so the raw value is
/// kept as a float. Use [`CharacterId::character`] to resolve a roster
/// slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterId(f64);

impl CharacterId {
    /// The sentinel produced when a wire field fails to parse.
    pub const NAN: CharacterId = CharacterId(f64::NAN);

    pub fn new(id: f64) -> CharacterId {
        CharacterId(id)
    }

    /// Parses one wire field, yielding the NaN sentinel on failure.
    pub fn parse(field: &str) -> CharacterId {
        CharacterId(field.trim().parse().unwrap_or(f64::NAN))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_nan(self) -> bool {
        self.0.is_nan()
    }

    /// Resolves the id to a roster slot, if it names one.
    pub fn character(self) -> Option<Character> {
        if !self.0.is_finite() || self.0.fract() != 0.0 || !(1.0..=10.0).contains(&self.0) {
            return None;
        }
        Character::try_from(self.0 as u8).ok()
    }
}

impl From<Character> for CharacterId {
    fn from(character: Character) -> CharacterId {
        CharacterId(f64::from(character.id()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_round_trip() {
        for character in Character::ALL {
            assert_eq!(Character::try_from(character.id()).unwrap(), character);
        }
        assert_eq!(Character::try_from(0), Err(UnknownCharacter(0)));
        assert_eq!(Character::try_from(11), Err(UnknownCharacter(11)));
    }

    #[test]
    fn only_queens_are_queens() {
        let queens: Vec<_> = Character::ALL.into_iter().filter(|c| c.is_queen()).collect();
        assert_eq!(queens, vec![Character::GoldQueen, Character::BlueQueen]);
    }

    #[test]
    fn parse_failure_is_the_nan_sentinel() {
        assert!(CharacterId::parse("bee").is_nan());
        assert!(CharacterId::parse("").is_nan());
        assert!(!CharacterId::parse("2").is_nan());
    }

    #[test]
    fn resolution_rejects_out_of_roster_ids() {
        assert_eq!(CharacterId::parse("2").character(), Some(Character::BlueQueen));
        assert_eq!(CharacterId::parse("0").character(), None);
        assert_eq!(CharacterId::parse("11").character(), None);
        assert_eq!(CharacterId::parse("2.5").character(), None);
        assert_eq!(CharacterId::NAN.character(), None);
    }
}
