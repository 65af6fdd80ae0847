use crate::model::face::Face;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A physical card in the draw pile.
///
/// Only number cards take part in the odds; the two modifier cards exist so a
/// simulated round can grant second chance or ×2 the way the table does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Card {
    Number(Face),
    SecondChance,
    TimesTwo,
}

impl Card {
    pub const fn number(self) -> Option<Face> {
        match self {
            Card::Number(face) => Some(face),
            _ => None,
        }
    }

    pub const fn is_modifier(self) -> bool {
        !matches!(self, Card::Number(_))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Card::Number(face) => write!(f, "{face}"),
            Card::SecondChance => f.write_str("SC"),
            Card::TimesTwo => f.write_str("x2"),
        }
    }
}
