use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Printed number on a number card, always within `0..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Face(u8);

impl Face {
    pub const COUNT: usize = 13;
    pub const MAX: u8 = 12;

    pub const ALL: [Face; Face::COUNT] = [
        Face(0),
        Face(1),
        Face(2),
        Face(3),
        Face(4),
        Face(5),
        Face(6),
        Face(7),
        Face(8),
        Face(9),
        Face(10),
        Face(11),
        Face(12),
    ];

    pub const fn from_value(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Face(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn points(self) -> u32 {
        self.0 as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("face value {0} is outside 0..=12")]
pub struct FaceError(pub u8);

impl TryFrom<u8> for Face {
    type Error = FaceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Face::from_value(value).ok_or(FaceError(value))
    }
}

impl From<Face> for u8 {
    fn from(face: Face) -> Self {
        face.value()
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
