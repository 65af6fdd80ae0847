use crate::model::card::Card;
use crate::model::face::Face;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Copies of each face in the full deck, indexed by face value.
pub const DECK_COMPOSITION: [u8; Face::COUNT] = [1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];

/// Number cards in the full deck.
pub const TOTAL_NUMBER_CARDS: u32 = composition_total();

/// Points awarded for holding seven distinct faces.
pub const FLIP7_BONUS: u32 = 15;

/// Distinct faces required for the bonus.
pub const FLIP7_TARGET: usize = 7;

const _: () = assert!(TOTAL_NUMBER_CARDS == 79);

const fn composition_total() -> u32 {
    let mut total = 0u32;
    let mut idx = 0;
    while idx < Face::COUNT {
        total += DECK_COMPOSITION[idx] as u32;
        idx += 1;
    }
    total
}

pub const fn copies(face: Face) -> u8 {
    DECK_COMPOSITION[face.index()]
}

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// All 79 number cards in face order.
    pub fn standard() -> Self {
        Self::with_modifiers(0, 0)
    }

    pub fn with_modifiers(second_chance: usize, times_two: usize) -> Self {
        let mut cards =
            Vec::with_capacity(TOTAL_NUMBER_CARDS as usize + second_chance + times_two);
        for face in Face::ALL.iter().copied() {
            for _ in 0..copies(face) {
                cards.push(Card::Number(face));
            }
        }
        cards.extend(std::iter::repeat_n(Card::SecondChance, second_chance));
        cards.extend(std::iter::repeat_n(Card::TimesTwo, times_two));
        Self { cards }
    }

    /// A deck in the given order; the last card is drawn first.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Takes the top card.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_matches_face_values() {
        assert_eq!(DECK_COMPOSITION[0], 1);
        assert_eq!(DECK_COMPOSITION[1], 1);
        for value in 2..=12u8 {
            let face = Face::from_value(value).unwrap();
            assert_eq!(copies(face), value);
        }
        assert_eq!(TOTAL_NUMBER_CARDS, 79);
    }

    #[test]
    fn standard_deck_has_79_number_cards() {
        let deck = Deck::standard();
        assert_eq!(deck.len(), 79);
        let twelves = deck
            .cards()
            .iter()
            .filter(|card| **card == Card::Number(Face::ALL[12]))
            .count();
        assert_eq!(twelves, 12);
    }

    #[test]
    fn modifiers_are_appended() {
        let deck = Deck::with_modifiers(3, 1);
        assert_eq!(deck.len(), 83);
        assert_eq!(deck.cards().iter().filter(|c| c.is_modifier()).count(), 4);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn draw_takes_from_the_top() {
        let mut deck = Deck::standard();
        assert_eq!(deck.draw(), Some(Card::Number(Face::ALL[12])));
        assert_eq!(deck.len(), 78);
    }
}
