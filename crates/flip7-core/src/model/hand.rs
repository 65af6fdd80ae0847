use crate::model::face::{Face, FaceError};
use serde::{Deserialize, Serialize};

/// Faces currently held by the player.
///
/// Stored as per-face counts so the multiset variant of the table can be
/// represented; a legal hand never holds a face twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Face>", into = "Vec<Face>")]
pub struct Hand {
    counts: [u8; Face::COUNT],
}

impl Hand {
    pub fn new() -> Self {
        Self {
            counts: [0; Face::COUNT],
        }
    }

    pub fn with_faces<I>(faces: I) -> Self
    where
        I: IntoIterator<Item = Face>,
    {
        let mut hand = Self::new();
        for face in faces {
            hand.add(face);
        }
        hand
    }

    /// Builds a hand from raw face values; the first value outside `0..=12`
    /// is returned as the error.
    pub fn from_values(values: &[u8]) -> Result<Self, FaceError> {
        let faces = values
            .iter()
            .copied()
            .map(Face::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_faces(faces))
    }

    pub fn add(&mut self, face: Face) {
        self.counts[face.index()] = self.counts[face.index()].saturating_add(1);
    }

    pub fn remove(&mut self, face: Face) -> bool {
        let slot = &mut self.counts[face.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn contains(&self, face: Face) -> bool {
        self.counts[face.index()] > 0
    }

    pub fn count(&self, face: Face) -> u8 {
        self.counts[face.index()]
    }

    /// Number of distinct faces held.
    pub fn unique_len(&self) -> usize {
        self.counts.iter().filter(|&&count| count > 0).count()
    }

    /// Number of cards held, duplicates included.
    pub fn len(&self) -> usize {
        self.counts.iter().map(|&count| count as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }

    pub fn has_duplicate(&self) -> bool {
        self.counts.iter().any(|&count| count > 1)
    }

    /// Distinct held faces in ascending order.
    pub fn faces(&self) -> impl Iterator<Item = Face> + '_ {
        Face::ALL
            .iter()
            .copied()
            .filter(move |face| self.contains(*face))
    }

    /// Every held card in ascending order, duplicates repeated.
    pub fn iter(&self) -> impl Iterator<Item = Face> + '_ {
        Face::ALL
            .iter()
            .copied()
            .flat_map(move |face| std::iter::repeat_n(face, self.count(face) as usize))
    }

    /// Face-value sum before any multiplier.
    pub fn points(&self) -> u32 {
        self.iter().map(Face::points).sum()
    }
}

impl From<Vec<Face>> for Hand {
    fn from(faces: Vec<Face>) -> Self {
        Hand::with_faces(faces)
    }
}

impl From<Hand> for Vec<Face> {
    fn from(hand: Hand) -> Self {
        hand.iter().collect()
    }
}
