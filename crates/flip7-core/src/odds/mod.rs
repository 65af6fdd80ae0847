//! Odds over the unseen part of the deck.
//!
//! - `pool`: reduces revealed counts to the unknown pool.
//! - `estimate`: closed-form single-draw estimates used by default.
//! - `exact`: exact multi-draw probabilities for the optional exact model.

mod estimate;
mod exact;
mod pool;

pub use estimate::{
    OddsConfig, bust_probability, effective_bust_probability, expected_draw_value,
    flip7_potential,
};
pub use exact::{exact_flip7_probability, exact_second_chance_bust};
pub use pool::{UnknownPool, unknown_pool};
