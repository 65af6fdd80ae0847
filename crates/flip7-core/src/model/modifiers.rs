use serde::{Deserialize, Serialize};

/// Modifier cards held in front of the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    /// The first duplicate drawn is discarded instead of busting.
    #[serde(default)]
    pub second_chance: bool,
    /// Number-card points (held and next drawn) count double.
    #[serde(default)]
    pub times_two: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        second_chance: false,
        times_two: false,
    };

    pub const fn new(second_chance: bool, times_two: bool) -> Self {
        Self {
            second_chance,
            times_two,
        }
    }

    pub const fn multiplier(self) -> f64 {
        if self.times_two { 2.0 } else { 1.0 }
    }
}
