use crate::model::deck::DECK_COMPOSITION;
use crate::model::face::Face;
use crate::model::revealed::RevealedCounts;
use serde::{Deserialize, Serialize};

/// Unseen copies of each face plus their sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnknownPool {
    remaining: [u8; Face::COUNT],
    total: u32,
}

impl UnknownPool {
    /// Over-revealed faces clamp to zero instead of going negative.
    pub fn from_revealed(revealed: &RevealedCounts) -> Self {
        let mut remaining = [0u8; Face::COUNT];
        for face in Face::ALL {
            remaining[face.index()] = DECK_COMPOSITION[face.index()].saturating_sub(revealed.get(face));
        }
        let total = remaining.iter().map(|&count| u32::from(count)).sum();
        Self { remaining, total }
    }

    /// The untouched deck.
    pub fn full() -> Self {
        Self::from_revealed(&RevealedCounts::new())
    }

    pub const fn remaining(&self, face: Face) -> u8 {
        self.remaining[face.index()]
    }

    pub const fn total(&self) -> u32 {
        self.total
    }

    pub const fn is_exhausted(&self) -> bool {
        self.total == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Face, u8)> + '_ {
        Face::ALL
            .iter()
            .copied()
            .map(move |face| (face, self.remaining(face)))
    }
}

pub fn unknown_pool(revealed: &RevealedCounts) -> UnknownPool {
    UnknownPool::from_revealed(revealed)
}
