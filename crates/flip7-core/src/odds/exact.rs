use super::pool::UnknownPool;
use crate::model::deck::FLIP7_TARGET;
use crate::model::face::Face;
use crate::model::hand::Hand;
use std::collections::HashMap;

/// Chance that the next two draws both duplicate a held face, the first one
/// being absorbed by second chance.
pub fn exact_second_chance_bust(hand: &Hand, pool: &UnknownPool) -> f64 {
    let total = pool.total();
    let dangerous: u32 = hand
        .faces()
        .map(|face| u32::from(pool.remaining(face)))
        .sum();
    if total < 2 || dangerous < 2 {
        return 0.0;
    }
    let first = f64::from(dangerous) / f64::from(total);
    let second = f64::from(dangerous - 1) / f64::from(total - 1);
    first * second
}

/// Chance of reaching seven distinct faces by hitting until the bonus, a bust
/// or an empty pool. Draws are uniform without replacement.
pub fn exact_flip7_probability(hand: &Hand, pool: &UnknownPool, second_chance: bool) -> f64 {
    let start = hand.faces().fold(0u16, |mask, face| mask | bit(face));
    let mut search = ReachSearch {
        start,
        pool: *pool,
        second_chance,
        memo: HashMap::new(),
    };
    search.reach(start, None)
}

const fn bit(face: Face) -> u16 {
    1 << face.index()
}

struct ReachSearch {
    start: u16,
    pool: UnknownPool,
    second_chance: bool,
    // (held mask, face absorbed by second chance) -> probability
    memo: HashMap<(u16, Option<Face>), f64>,
}

impl ReachSearch {
    fn remaining(&self, mask: u16, absorbed: Option<Face>, face: Face) -> u32 {
        let mut left = u32::from(self.pool.remaining(face));
        let drawn_this_turn = mask & bit(face) != 0 && self.start & bit(face) == 0;
        if drawn_this_turn {
            left = left.saturating_sub(1);
        }
        if absorbed == Some(face) {
            left = left.saturating_sub(1);
        }
        left
    }

    fn reach(&mut self, mask: u16, absorbed: Option<Face>) -> f64 {
        if mask.count_ones() as usize >= FLIP7_TARGET {
            return 1.0;
        }
        if let Some(&cached) = self.memo.get(&(mask, absorbed)) {
            return cached;
        }

        let left: [u32; Face::COUNT] =
            std::array::from_fn(|idx| self.remaining(mask, absorbed, Face::ALL[idx]));
        let total: u32 = left.iter().sum();
        let chance = self.second_chance && absorbed.is_none();

        let mut probability = 0.0;
        if total > 0 {
            for face in Face::ALL {
                let count = left[face.index()];
                if count == 0 {
                    continue;
                }
                let weight = f64::from(count) / f64::from(total);
                if mask & bit(face) == 0 {
                    probability += weight * self.reach(mask | bit(face), absorbed);
                } else if chance {
                    probability += weight * self.reach(mask, Some(face));
                }
            }
        }

        self.memo.insert((mask, absorbed), probability);
        probability
    }
}
