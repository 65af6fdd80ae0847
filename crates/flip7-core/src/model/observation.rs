use crate::model::deck::copies;
use crate::model::face::Face;
use crate::model::hand::Hand;
use crate::model::modifiers::Modifiers;
use crate::model::revealed::RevealedCounts;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything the advisor needs to know about the table, captured at one
/// instant. The engine never mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub hand: Hand,
    #[serde(default)]
    pub revealed: RevealedCounts,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl Observation {
    pub fn new(hand: Hand, revealed: RevealedCounts, modifiers: Modifiers) -> Self {
        Self {
            hand,
            revealed,
            modifiers,
        }
    }

    /// Reports the first broken table invariant, if any.
    pub fn check(&self) -> Result<(), ObservationError> {
        for face in Face::ALL {
            let seen = self.revealed.get(face);
            if seen > copies(face) {
                return Err(ObservationError::OverRevealed {
                    face,
                    revealed: seen,
                    copies: copies(face),
                });
            }
            let held = self.hand.count(face);
            if held > seen {
                return Err(ObservationError::HeldNotRevealed {
                    face,
                    held,
                    revealed: seen,
                });
            }
        }
        if self.hand.has_duplicate() && !self.modifiers.second_chance {
            return Err(ObservationError::AlreadyBusted);
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservationError {
    #[error("face {face} revealed {revealed} times but the deck holds {copies}")]
    OverRevealed { face: Face, revealed: u8, copies: u8 },
    #[error("face {face} held {held} times but only revealed {revealed}")]
    HeldNotRevealed { face: Face, held: u8, revealed: u8 },
    #[error("hand holds a duplicate without second chance")]
    AlreadyBusted,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(values: &[u8]) -> Observation {
        let hand = Hand::from_values(values).unwrap();
        let revealed = RevealedCounts::from_hand(&hand);
        Observation::new(hand, revealed, Modifiers::NONE)
    }

    #[test]
    fn consistent_snapshot_passes_check() {
        assert_eq!(observation(&[3, 7, 12]).check(), Ok(()));
    }

    #[test]
    fn held_card_must_be_revealed() {
        let mut obs = observation(&[3]);
        obs.revealed.clear();
        assert!(matches!(
            obs.check(),
            Err(ObservationError::HeldNotRevealed { held: 1, revealed: 0, .. })
        ));
    }

    #[test]
    fn over_revealed_face_is_reported() {
        let mut obs = observation(&[]);
        obs.revealed.set(Face::ALL[2], 3);
        assert!(matches!(
            obs.check(),
            Err(ObservationError::OverRevealed { copies: 2, .. })
        ));
    }

    #[test]
    fn duplicate_without_second_chance_is_busted() {
        let obs = observation(&[6, 6]);
        assert_eq!(obs.check(), Err(ObservationError::AlreadyBusted));
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let mut obs = observation(&[1, 9]);
        obs.modifiers.times_two = true;
        let json = obs.to_json().unwrap();
        assert!(json.contains("\"times_two\": true"));
        assert_eq!(Observation::from_json(&json).unwrap(), obs);
    }

    #[test]
    fn empty_json_object_is_an_empty_table() {
        let obs = Observation::from_json("{}").unwrap();
        assert!(obs.hand.is_empty());
        assert_eq!(obs.revealed.total(), 0);
    }
}
