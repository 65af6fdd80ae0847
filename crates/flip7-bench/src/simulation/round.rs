use std::time::{Duration, Instant};

use flip7_bot::{Action, DrawOutcome, Policy, PolicyContext, RevealTracker};
use flip7_core::model::deck::{Deck, FLIP7_BONUS};
use serde::Serialize;

/// How a single player's round came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundEnding {
    Stayed,
    Busted,
    Flip7,
    /// The player wanted another card but the deck ran dry.
    DeckExhausted,
}

impl RoundEnding {
    pub const fn as_str(self) -> &'static str {
        match self {
            RoundEnding::Stayed => "stayed",
            RoundEnding::Busted => "busted",
            RoundEnding::Flip7 => "flip7",
            RoundEnding::DeckExhausted => "deck_exhausted",
        }
    }
}

pub struct RoundResult {
    pub points: u32,
    pub ending: RoundEnding,
    pub draws: usize,
    /// Duplicates discarded by a second chance.
    pub absorbed: usize,
    pub metrics: DecisionSummary,
}

/// Play one player's turn until they stay, bust, flip seven or run out of cards.
///
/// The tracker should already hold whatever the player saw before the turn.
pub fn play_round(
    policy: &mut dyn Policy,
    deck: &mut Deck,
    tracker: &mut RevealTracker,
) -> RoundResult {
    let mut metrics = DecisionMetrics::default();
    let mut draws = 0usize;
    let mut absorbed = 0usize;

    let ending = loop {
        let observation = tracker.observation();
        let ctx = PolicyContext {
            observation: &observation,
            draws,
        };
        let start = Instant::now();
        let action = policy.choose(&ctx);
        metrics.record(start.elapsed());

        if action == Action::Stay {
            break RoundEnding::Stayed;
        }

        let Some(card) = deck.draw() else {
            break RoundEnding::DeckExhausted;
        };
        draws += 1;

        match tracker.note_drawn(card) {
            DrawOutcome::Busted(_) => break RoundEnding::Busted,
            DrawOutcome::Flip7(_) => break RoundEnding::Flip7,
            DrawOutcome::Absorbed(_) => absorbed += 1,
            DrawOutcome::Added(_)
            | DrawOutcome::GainedSecondChance
            | DrawOutcome::GainedTimesTwo
            | DrawOutcome::Discarded(_) => {}
        }
    };

    let points = match ending {
        RoundEnding::Busted => 0,
        _ => tracker.banked_points(FLIP7_BONUS),
    };

    RoundResult {
        points,
        ending,
        draws,
        absorbed,
        metrics: metrics.finalize(),
    }
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use flip7_bot::{HeuristicPolicy, HeuristicStyle};
    use flip7_core::model::card::Card;
    use flip7_core::model::face::Face;

    fn stacked(draw_order: &[Card]) -> Deck {
        // Deck::draw pops from the back.
        let mut cards = draw_order.to_vec();
        cards.reverse();
        Deck::from_cards(cards)
    }

    fn number(value: u8) -> Card {
        Card::Number(Face::ALL[value as usize])
    }

    #[test]
    fn duplicate_without_second_chance_scores_zero() {
        let mut deck = stacked(&[number(7), number(7), number(3)]);
        let mut policy = HeuristicPolicy::new("yolo", HeuristicStyle::Reckless);
        let mut tracker = RevealTracker::new();
        let result = play_round(&mut policy, &mut deck, &mut tracker);
        assert_eq!(result.ending, RoundEnding::Busted);
        assert_eq!(result.points, 0);
        assert_eq!(result.draws, 2);
        assert_eq!(result.metrics.decisions, 2);
    }

    #[test]
    fn second_chance_absorbs_one_duplicate() {
        let mut deck = stacked(&[
            Card::SecondChance,
            number(10),
            number(10),
            number(12),
        ]);
        let mut policy = HeuristicPolicy::threshold(22);
        let mut tracker = RevealTracker::new();
        let result = play_round(&mut policy, &mut deck, &mut tracker);
        assert_eq!(result.ending, RoundEnding::Stayed);
        assert_eq!(result.absorbed, 1);
        assert_eq!(result.draws, 4);
        assert_eq!(result.points, 22);
    }

    #[test]
    fn seven_faces_add_the_bonus() {
        let order: Vec<Card> = (0..7).map(number).collect();
        let mut deck = stacked(&order);
        let mut policy = HeuristicPolicy::new("yolo", HeuristicStyle::Reckless);
        let mut tracker = RevealTracker::new();
        let result = play_round(&mut policy, &mut deck, &mut tracker);
        assert_eq!(result.ending, RoundEnding::Flip7);
        assert_eq!(result.points, 21 + FLIP7_BONUS);
    }

    #[test]
    fn times_two_doubles_card_points() {
        let mut deck = stacked(&[Card::TimesTwo, number(9), number(4)]);
        let mut policy = HeuristicPolicy::threshold(20);
        let mut tracker = RevealTracker::new();
        let result = play_round(&mut policy, &mut deck, &mut tracker);
        assert_eq!(result.ending, RoundEnding::Stayed);
        assert_eq!(result.points, 26);
    }

    #[test]
    fn empty_deck_banks_what_is_held() {
        let mut deck = stacked(&[number(5)]);
        let mut policy = HeuristicPolicy::new("yolo", HeuristicStyle::Reckless);
        let mut tracker = RevealTracker::new();
        let result = play_round(&mut policy, &mut deck, &mut tracker);
        assert_eq!(result.ending, RoundEnding::DeckExhausted);
        assert_eq!(result.points, 5);
        assert_eq!(result.draws, 1);
    }
}
