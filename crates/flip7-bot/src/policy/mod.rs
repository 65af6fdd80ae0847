mod advisor;
mod heuristic;

pub use advisor::AdvisorPolicy;
pub use heuristic::{HeuristicPolicy, HeuristicStyle};

use core::fmt;
use flip7_core::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Hit,
    Stay,
}

impl Action {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hit" | "draw" => Some(Action::Hit),
            "stay" | "bank" => Some(Action::Stay),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Hit => "hit",
            Action::Stay => "stay",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context provided to policies for decision-making
pub struct PolicyContext<'a> {
    pub observation: &'a Observation,
    /// Cards this player has drawn so far in the round.
    pub draws: usize,
}

/// Unified interface for HIT / STAY decisions
pub trait Policy: Send {
    fn name(&self) -> &str;

    fn choose(&mut self, ctx: &PolicyContext) -> Action;
}
