use super::pool::UnknownPool;
use crate::model::deck::FLIP7_TARGET;
use crate::model::hand::Hand;
use serde::{Deserialize, Serialize};

/// Tunables of the closed-form estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OddsConfig {
    /// Scales `p_bust²` when second chance is held.
    pub second_chance_damping: f64,
    /// Per-card decay applied to the bonus reachability.
    pub flip7_decay: f64,
    /// More missing faces than this count as unreachable.
    pub flip7_horizon: usize,
}

impl Default for OddsConfig {
    fn default() -> Self {
        Self {
            second_chance_damping: 0.8,
            flip7_decay: 0.7,
            flip7_horizon: 3,
        }
    }
}

/// Chance that the next card duplicates a held face.
pub fn bust_probability(hand: &Hand, pool: &UnknownPool) -> f64 {
    if pool.total() == 0 {
        return 0.0;
    }
    let dangerous: u32 = hand
        .faces()
        .map(|face| u32::from(pool.remaining(face)))
        .sum();
    f64::from(dangerous) / f64::from(pool.total())
}

/// Bust chance once second chance absorbs the first duplicate.
pub fn effective_bust_probability(p_bust: f64, damping: f64) -> f64 {
    p_bust * p_bust * damping
}

/// Mean points of the next card given that it does not bust.
pub fn expected_draw_value(hand: &Hand, pool: &UnknownPool, times_two: bool) -> f64 {
    let safe = SafeDraws::collect(hand, pool);
    if safe.copies == 0 {
        return 0.0;
    }
    let mean = f64::from(safe.face_sum) / f64::from(safe.copies);
    if times_two { mean * 2.0 } else { mean }
}

/// Rough chance of completing seven distinct faces.
pub fn flip7_potential(hand: &Hand, pool: &UnknownPool, config: &OddsConfig) -> f64 {
    let held = hand.unique_len();
    if held >= FLIP7_TARGET {
        return 1.0;
    }
    let needed = FLIP7_TARGET - held;
    if needed > config.flip7_horizon {
        return 0.0;
    }
    let safe = SafeDraws::collect(hand, pool);
    if safe.distinct < needed {
        return 0.0;
    }
    let density = f64::from(safe.copies) / f64::from(pool.total());
    density * config.flip7_decay.powi(needed as i32)
}

/// Unseen faces the player does not hold yet.
struct SafeDraws {
    distinct: usize,
    copies: u32,
    face_sum: u32,
}

impl SafeDraws {
    fn collect(hand: &Hand, pool: &UnknownPool) -> Self {
        let mut safe = Self {
            distinct: 0,
            copies: 0,
            face_sum: 0,
        };
        for (face, remaining) in pool.iter() {
            if remaining == 0 || hand.contains(face) {
                continue;
            }
            safe.distinct += 1;
            safe.copies += u32::from(remaining);
            safe.face_sum += face.points() * u32::from(remaining);
        }
        safe
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::face::Face;
    use crate::model::revealed::RevealedCounts;
    use crate::odds::pool::unknown_pool;

    fn table(values: &[u8]) -> (Hand, UnknownPool) {
        let hand = Hand::from_values(values).unwrap();
        let pool = unknown_pool(&RevealedCounts::from_hand(&hand));
        (hand, pool)
    }

    #[test]
    fn single_five_busts_on_remaining_fives() {
        let (hand, pool) = table(&[5]);
        let p = bust_probability(&hand, &pool);
        assert_eq!(p, 4.0 / 78.0);
        assert!((p - 0.0513).abs() < 1e-4);
    }

    #[test]
    fn empty_pool_never_busts() {
        let hand = Hand::from_values(&[12]).unwrap();
        let pool = unknown_pool(&RevealedCounts::from_counts(crate::model::deck::DECK_COMPOSITION));
        assert_eq!(bust_probability(&hand, &pool), 0.0);
    }

    #[test]
    fn bust_grows_with_unseen_copies_of_held_faces() {
        let hand = Hand::from_values(&[9, 4]).unwrap();
        let nine = Face::ALL[9];
        let mut previous = -1.0;
        for seen in (1..=9u8).rev() {
            let mut revealed = RevealedCounts::from_hand(&hand);
            revealed.set(nine, seen);
            let p = bust_probability(&hand, &unknown_pool(&revealed));
            assert!(p >= previous, "seen={seen} p={p} previous={previous}");
            previous = p;
        }
    }

    #[test]
    fn second_chance_squares_and_damps() {
        assert_eq!(effective_bust_probability(0.5, 0.8), 0.2);
        assert_eq!(effective_bust_probability(0.0, 0.8), 0.0);
        assert_eq!(effective_bust_probability(0.5, 1.0), 0.25);
    }

    #[test]
    fn draw_value_ignores_held_faces() {
        let (hand, pool) = table(&[5]);
        // 650 face points in the deck, minus every five.
        assert_eq!(expected_draw_value(&hand, &pool, false), 625.0 / 74.0);
    }

    #[test]
    fn times_two_doubles_draw_value() {
        let (hand, pool) = table(&[3, 8]);
        let plain = expected_draw_value(&hand, &pool, false);
        assert_eq!(expected_draw_value(&hand, &pool, true), plain * 2.0);
    }

    #[test]
    fn draw_value_is_zero_without_safe_cards() {
        let hand = Hand::from_values(&[12]).unwrap();
        let mut counts = crate::model::deck::DECK_COMPOSITION;
        counts[12] = 5;
        let pool = unknown_pool(&RevealedCounts::from_counts(counts));
        assert_eq!(pool.total(), 7);
        assert_eq!(expected_draw_value(&hand, &pool, true), 0.0);
    }

    #[test]
    fn potential_is_one_for_seven_faces() {
        let (hand, pool) = table(&[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(flip7_potential(&hand, &pool, &OddsConfig::default()), 1.0);
    }

    #[test]
    fn potential_is_zero_beyond_horizon() {
        let (hand, pool) = table(&[4, 5, 6]);
        assert_eq!(flip7_potential(&hand, &pool, &OddsConfig::default()), 0.0);
        let wide = OddsConfig {
            flip7_horizon: 4,
            ..OddsConfig::default()
        };
        assert!(flip7_potential(&hand, &pool, &wide) > 0.0);
    }

    #[test]
    fn potential_is_zero_without_enough_distinct_faces() {
        let hand = Hand::from_values(&[7, 8, 9, 10]).unwrap();
        let mut counts = crate::model::deck::DECK_COMPOSITION;
        // Leave only faces 11 and 12 unseen among the non-held ones.
        counts[11] = 10;
        counts[12] = 10;
        for face in [7usize, 8, 9, 10] {
            counts[face] -= 1;
        }
        let pool = unknown_pool(&RevealedCounts::from_counts(counts));
        assert_eq!(flip7_potential(&hand, &pool, &OddsConfig::default()), 0.0);
    }

    #[test]
    fn potential_scales_density_by_decay() {
        let (hand, pool) = table(&[0, 1, 2, 3]);
        // 75 unseen, of which face 2 has one and face 3 has two left.
        let expected = (72.0 / 75.0) * 0.7f64.powi(3);
        assert_eq!(flip7_potential(&hand, &pool, &OddsConfig::default()), expected);
    }
}
