use crate::model::face::Face;
use crate::odds::UnknownPool;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "HIT")]
    Hit,
    #[serde(rename = "STAY")]
    Stay,
    #[serde(rename = "TOSS-UP")]
    TossUp,
}

impl Recommendation {
    /// Exact float comparison; equal values are a toss-up.
    pub fn compare(ev_hit: f64, ev_stay: f64) -> Self {
        if ev_hit > ev_stay {
            Recommendation::Hit
        } else if ev_hit < ev_stay {
            Recommendation::Stay
        } else {
            Recommendation::TossUp
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Recommendation::Hit => "HIT",
            Recommendation::Stay => "STAY",
            Recommendation::TossUp => "TOSS-UP",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub recommendation: Recommendation,
    pub bust_probability: f64,
    /// Bust probability after second chance, equal to `bust_probability`
    /// without it.
    pub effective_bust_probability: f64,
    pub ev_hit: f64,
    pub ev_stay: f64,
    pub confidence: f64,
    pub flip7_potential: f64,
    /// Held faces that still have unseen copies.
    pub danger_faces: Vec<Face>,
    pub pool: UnknownPool,
}
