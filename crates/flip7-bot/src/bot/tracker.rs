use flip7_core::Observation;
use flip7_core::model::card::Card;
use flip7_core::model::deck::FLIP7_TARGET;
use flip7_core::model::face::Face;
use flip7_core::model::hand::Hand;
use flip7_core::model::modifiers::Modifiers;
use flip7_core::model::revealed::RevealedCounts;

/// What an own draw did to the player's round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Added(Face),
    /// Completed seven distinct faces.
    Flip7(Face),
    /// Duplicate discarded by second chance.
    Absorbed(Face),
    Busted(Face),
    GainedSecondChance,
    GainedTimesTwo,
    /// Modifier already held; the card goes to the discard.
    Discarded(Card),
}

impl DrawOutcome {
    pub const fn ends_round(self) -> bool {
        matches!(self, DrawOutcome::Flip7(_) | DrawOutcome::Busted(_))
    }
}

/// Keeps the hand, the reveal counts and the modifiers of one player in sync
/// with the cards turned over during a round.
#[derive(Debug, Clone, Default)]
pub struct RevealTracker {
    hand: Hand,
    revealed: RevealedCounts,
    modifiers: Modifiers,
}

impl RevealTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_for_round(&mut self) {
        self.hand = Hand::new();
        self.revealed.clear();
        self.modifiers = Modifiers::NONE;
    }

    /// A card turned face-up in front of someone else.
    pub fn note_revealed(&mut self, card: Card) {
        if let Card::Number(face) = card {
            self.revealed.increment(face);
        }
    }

    /// A card drawn by this player.
    pub fn note_drawn(&mut self, card: Card) -> DrawOutcome {
        match card {
            Card::Number(face) => {
                self.revealed.increment(face);
                if !self.hand.contains(face) {
                    self.hand.add(face);
                    if self.hand.unique_len() >= FLIP7_TARGET {
                        DrawOutcome::Flip7(face)
                    } else {
                        DrawOutcome::Added(face)
                    }
                } else if self.modifiers.second_chance {
                    self.modifiers.second_chance = false;
                    DrawOutcome::Absorbed(face)
                } else {
                    DrawOutcome::Busted(face)
                }
            }
            Card::SecondChance if self.modifiers.second_chance => DrawOutcome::Discarded(card),
            Card::SecondChance => {
                self.modifiers.second_chance = true;
                DrawOutcome::GainedSecondChance
            }
            Card::TimesTwo if self.modifiers.times_two => DrawOutcome::Discarded(card),
            Card::TimesTwo => {
                self.modifiers.times_two = true;
                DrawOutcome::GainedTimesTwo
            }
        }
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn revealed(&self) -> &RevealedCounts {
        &self.revealed
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn observation(&self) -> Observation {
        Observation::new(self.hand.clone(), self.revealed, self.modifiers)
    }

    /// Points banked by staying now: card points (doubled under ×2) plus the
    /// bonus once seven faces are held.
    pub fn banked_points(&self, bonus: u32) -> u32 {
        let multiplier = if self.modifiers.times_two { 2 } else { 1 };
        let mut points = self.hand.points() * multiplier;
        if self.hand.unique_len() >= FLIP7_TARGET {
            points += bonus;
        }
        points
    }
}
