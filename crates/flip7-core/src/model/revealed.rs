use crate::model::deck::copies;
use crate::model::face::Face;
use crate::model::hand::Hand;
use serde::{Deserialize, Serialize};

/// Copies of each face seen face-up so far, the player's own cards included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevealedCounts {
    counts: [u8; Face::COUNT],
}

impl RevealedCounts {
    pub const fn new() -> Self {
        Self {
            counts: [0; Face::COUNT],
        }
    }

    /// Accepts raw counts as reported upstream, without capping them.
    pub const fn from_counts(counts: [u8; Face::COUNT]) -> Self {
        Self { counts }
    }

    /// Counts every card of `hand` as revealed.
    pub fn from_hand(hand: &Hand) -> Self {
        let mut revealed = Self::new();
        for face in hand.iter() {
            revealed.increment(face);
        }
        revealed
    }

    pub const fn get(&self, face: Face) -> u8 {
        self.counts[face.index()]
    }

    pub fn set(&mut self, face: Face, count: u8) {
        self.counts[face.index()] = count;
    }

    /// Records one more sighting; refuses to exceed the copies in the deck.
    pub fn increment(&mut self, face: Face) -> bool {
        let slot = &mut self.counts[face.index()];
        if *slot >= copies(face) {
            return false;
        }
        *slot += 1;
        true
    }

    pub fn decrement(&mut self, face: Face) -> bool {
        let slot = &mut self.counts[face.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub const fn counts(&self) -> &[u8; Face::COUNT] {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|&count| u32::from(count)).sum()
    }

    pub fn clear(&mut self) {
        self.counts = [0; Face::COUNT];
    }
}
