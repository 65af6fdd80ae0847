//! HIT / STAY decision over an observed table.

mod config;
mod result;

pub use config::{ProbabilityModel, StrategyConfig, UnknownModel};
pub use result::{Recommendation, StrategyResult};

use crate::model::deck::{FLIP7_TARGET, TOTAL_NUMBER_CARDS};
use crate::model::face::Face;
use crate::model::hand::Hand;
use crate::model::modifiers::Modifiers;
use crate::model::observation::Observation;
use crate::model::revealed::RevealedCounts;
use crate::odds::{
    UnknownPool, bust_probability, effective_bust_probability, exact_flip7_probability,
    exact_second_chance_bust, expected_draw_value, flip7_potential, unknown_pool,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Advisor {
    config: StrategyConfig,
}

impl Advisor {
    pub const fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> StrategyConfig {
        self.config
    }

    /// Expected values of hitting and staying plus the recommendation.
    ///
    /// Branches on hand size: an empty hand always hits, seven or more
    /// distinct faces always stay with the bonus banked, anything in between
    /// compares `(1 - p_bust) * (points + next card + bonus odds)` against
    /// the points already held.
    pub fn evaluate(&self, observation: &Observation) -> StrategyResult {
        let hand = &observation.hand;
        let modifiers = observation.modifiers;
        let pool = unknown_pool(&observation.revealed);
        let multiplier = modifiers.multiplier();
        let bonus = f64::from(self.config.bonus);

        let bust = bust_probability(hand, &pool);
        let effective = if modifiers.second_chance {
            self.second_chance_bust(hand, &pool, bust)
        } else {
            bust
        };
        let potential = self.reachability(hand, &pool, modifiers);
        let current_points = f64::from(hand.points()) * multiplier;

        let (recommendation, ev_hit, ev_stay) = if hand.is_empty() {
            let mean_card = f64::from(TOTAL_NUMBER_CARDS) / Face::COUNT as f64;
            (Recommendation::Hit, mean_card * multiplier, 0.0)
        } else if hand.unique_len() >= FLIP7_TARGET {
            let banked = current_points + bonus;
            (Recommendation::Stay, banked, banked)
        } else {
            let draw_value = expected_draw_value(hand, &pool, modifiers.times_two);
            let ev_hit = (1.0 - effective) * (current_points + draw_value + potential * bonus);
            let ev_stay = current_points;
            (Recommendation::compare(ev_hit, ev_stay), ev_hit, ev_stay)
        };

        StrategyResult {
            recommendation,
            bust_probability: bust,
            effective_bust_probability: effective,
            ev_hit,
            ev_stay,
            confidence: confidence(ev_hit, ev_stay),
            flip7_potential: potential,
            danger_faces: danger_faces(hand, &pool),
            pool,
        }
    }

    fn second_chance_bust(&self, hand: &Hand, pool: &UnknownPool, bust: f64) -> f64 {
        match self.config.model {
            ProbabilityModel::Approximate => {
                effective_bust_probability(bust, self.config.odds.second_chance_damping)
            }
            ProbabilityModel::Exact => exact_second_chance_bust(hand, pool),
        }
    }

    fn reachability(&self, hand: &Hand, pool: &UnknownPool, modifiers: Modifiers) -> f64 {
        match self.config.model {
            ProbabilityModel::Approximate => flip7_potential(hand, pool, &self.config.odds),
            ProbabilityModel::Exact => {
                exact_flip7_probability(hand, pool, modifiers.second_chance)
            }
        }
    }
}

/// Evaluates a table with the default configuration.
pub fn advise(hand: &Hand, revealed: &RevealedCounts, modifiers: Modifiers) -> StrategyResult {
    let observation = Observation::new(hand.clone(), *revealed, modifiers);
    Advisor::default().evaluate(&observation)
}

fn confidence(ev_hit: f64, ev_stay: f64) -> f64 {
    if ev_stay > 0.0 {
        ((ev_hit - ev_stay).abs() / ev_stay).min(1.0)
    } else if ev_hit > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn danger_faces(hand: &Hand, pool: &UnknownPool) -> Vec<Face> {
    hand.faces()
        .filter(|face| pool.remaining(*face) > 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(values: &[u8], modifiers: Modifiers) -> Observation {
        let hand = Hand::from_values(values).unwrap();
        let revealed = RevealedCounts::from_hand(&hand);
        Observation::new(hand, revealed, modifiers)
    }

    #[test]
    fn empty_hand_always_hits() {
        for modifiers in [
            Modifiers::NONE,
            Modifiers::new(true, false),
            Modifiers::new(false, true),
        ] {
            let result = Advisor::default().evaluate(&observe(&[], modifiers));
            assert_eq!(result.recommendation, Recommendation::Hit);
            assert_eq!(result.ev_stay, 0.0);
            assert_eq!(result.ev_hit, 79.0 / 13.0 * modifiers.multiplier());
            assert_eq!(result.confidence, 1.0);
            assert!(result.danger_faces.is_empty());
        }
    }

    #[test]
    fn seven_faces_bank_the_bonus() {
        let result = Advisor::default().evaluate(&observe(&[1, 2, 3, 4, 5, 6, 7], Modifiers::NONE));
        assert_eq!(result.recommendation, Recommendation::Stay);
        assert_eq!(result.ev_hit, 43.0);
        assert_eq!(result.ev_stay, 43.0);
        assert_eq!(result.flip7_potential, 1.0);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn seven_faces_double_only_card_points() {
        let result = Advisor::default().evaluate(&observe(&[1, 2, 3, 4, 5, 6, 7], Modifiers::new(false, true)));
        assert_eq!(result.ev_stay, 56.0 + 15.0);
    }

    #[test]
    fn single_five_matches_hand_computation() {
        let result = Advisor::default().evaluate(&observe(&[5], Modifiers::NONE));
        assert_eq!(result.pool.remaining(Face::ALL[5]), 4);
        assert_eq!(result.pool.total(), 78);
        assert_eq!(result.bust_probability, 4.0 / 78.0);
        assert_eq!(result.effective_bust_probability, result.bust_probability);
        assert_eq!(result.flip7_potential, 0.0);
        let expected = (1.0 - 4.0 / 78.0) * (5.0 + 625.0 / 74.0);
        assert_eq!(result.ev_hit, expected);
        assert_eq!(result.ev_stay, 5.0);
        assert_eq!(result.recommendation, Recommendation::Hit);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.danger_faces, vec![Face::ALL[5]]);
    }

    #[test]
    fn second_chance_damps_bust_probability() {
        let plain = Advisor::default().evaluate(&observe(&[10, 11, 12], Modifiers::NONE));
        let shielded =
            Advisor::default().evaluate(&observe(&[10, 11, 12], Modifiers::new(true, false)));
        assert_eq!(shielded.bust_probability, plain.bust_probability);
        assert_eq!(
            shielded.effective_bust_probability,
            plain.bust_probability * plain.bust_probability * 0.8
        );
        assert!(shielded.ev_hit > plain.ev_hit);
    }

    #[test]
    fn danger_faces_skip_exhausted_faces() {
        let hand = Hand::from_values(&[0, 1, 9]).unwrap();
        let revealed = RevealedCounts::from_hand(&hand);
        let result = advise(&hand, &revealed, Modifiers::NONE);
        assert_eq!(result.danger_faces, vec![Face::ALL[9]]);
    }

    #[test]
    fn confidence_is_capped_at_one() {
        assert_eq!(confidence(30.0, 10.0), 1.0);
        assert_eq!(confidence(15.0, 10.0), 0.5);
        assert_eq!(confidence(5.0, 10.0), 0.5);
        assert_eq!(confidence(0.0, 0.0), 0.0);
        assert_eq!(confidence(3.0, 0.0), 1.0);
    }

    #[test]
    fn exact_model_uses_exact_reachability() {
        let observation = observe(&[0, 1, 2, 3, 4, 5], Modifiers::NONE);
        let approximate = Advisor::default().evaluate(&observation);
        let exact = Advisor::new(StrategyConfig::exact()).evaluate(&observation);
        assert_eq!(exact.bust_probability, approximate.bust_probability);
        assert!((exact.flip7_potential - 63.0 / 73.0).abs() < 1e-12);
        assert!((approximate.flip7_potential - (63.0 / 73.0) * 0.7).abs() < 1e-12);
    }

    #[test]
    fn exact_model_uses_double_duplicate_bust() {
        let observation = observe(&[5], Modifiers::new(true, false));
        let exact = Advisor::new(StrategyConfig::exact()).evaluate(&observation);
        let expected = (4.0 / 78.0) * (3.0 / 77.0);
        assert!((exact.effective_bust_probability - expected).abs() < 1e-15);
    }

    #[test]
    fn custom_bonus_flows_into_seven_face_value() {
        let config = StrategyConfig {
            bonus: 20,
            ..StrategyConfig::default()
        };
        let result = Advisor::new(config).evaluate(&observe(&[0, 1, 2, 3, 4, 5, 6], Modifiers::NONE));
        assert_eq!(result.ev_stay, 21.0 + 20.0);
    }
}
