use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use tracing::debug;

/// One suit: ace through nine, then ten, jack, queen and king collapsed to 10.
const SUIT_RANKS: [u8; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 10, 10];

pub struct Shoe<R = SmallRng> {
    pub num_decks: u8,
    cards: Vec<u8>,
    rng: R,
}

impl Shoe<SmallRng> {
    pub fn seeded(num_decks: u8, seed: u64) -> Self {
        Shoe::new(num_decks, SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy(num_decks: u8) -> Self {
        Shoe::new(num_decks, SmallRng::from_entropy())
    }
}

impl<R: Rng> Shoe<R> {
    pub fn new(num_decks: u8, rng: R) -> Self {
        let mut shoe = Shoe {
            num_decks: num_decks.max(1),
            cards: Vec::new(),
            rng,
        };
        shoe.reset();
        shoe
    }

    /// A stacked shoe that deals `cards` in the given order. Once they run
    /// out the shoe reshuffles a full composition like any other.
    pub fn from_cards(num_decks: u8, cards: &[u8], rng: R) -> Self {
        Shoe {
            num_decks: num_decks.max(1),
            cards: cards.iter().rev().copied().collect(),
            rng,
        }
    }

    pub fn reset(&mut self) {
        self.cards.clear();
        for _ in 0..self.num_decks {
            for _ in 0..4 {
                self.cards.extend_from_slice(&SUIT_RANKS);
            }
        }
        self.cards.shuffle(&mut self.rng);
    }

    pub fn draw(&mut self) -> u8 {
        if self.cards.is_empty() {
            debug!("shoe exhausted, reshuffling");
            self.reset();
        }
        self.cards.pop().expect("shoe should not be empty after reshuffle")
    }

    /// Reshuffles when fewer than `threshold` cards remain. Returns whether
    /// it did.
    pub fn ensure(&mut self, threshold: usize) -> bool {
        if self.cards.len() >= threshold {
            return false;
        }
        debug!(remaining = self.cards.len(), threshold, "reshuffling shoe");
        self.reset();
        true
    }

    pub fn remaining_cards(&self) -> usize {
        self.cards.len()
    }

    pub fn full_size(&self) -> usize {
        self.num_decks as usize * 52
    }

    pub fn remove_card_by_rank(&mut self, rank: u8) -> bool {
        if let Some(pos) = self.cards.iter().position(|&c| c == rank) {
            self.cards.remove(pos);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_shoe_has_full_composition() {
        let shoe = Shoe::seeded(6, 42);
        assert_eq!(shoe.remaining_cards(), 312);
        assert_eq!(shoe.full_size(), 312);

        let tens = shoe.cards.iter().filter(|&&c| c == 10).count();
        let aces = shoe.cards.iter().filter(|&&c| c == 1).count();
        assert_eq!(tens, 16 * 6);
        assert_eq!(aces, 4 * 6);
    }

    #[test]
    fn draw_removes_one_card_in_range() {
        let mut shoe = Shoe::seeded(6, 1);
        for drawn in 1..=100 {
            let card = shoe.draw();
            assert!((1..=10).contains(&card));
            assert_eq!(shoe.remaining_cards(), 312 - drawn);
        }
    }

    #[test]
    fn same_seed_deals_same_sequence() {
        let mut a = Shoe::seeded(6, 12345);
        let mut b = Shoe::seeded(6, 12345);
        let first: Vec<u8> = (0..20).map(|_| a.draw()).collect();
        let second: Vec<u8> = (0..20).map(|_| b.draw()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn ensure_reshuffles_only_below_threshold() {
        let mut shoe = Shoe::seeded(1, 3);
        for _ in 0..12 {
            shoe.draw();
        }
        assert!(!shoe.ensure(40));
        assert_eq!(shoe.remaining_cards(), 40);

        shoe.draw();
        assert!(shoe.ensure(40));
        assert_eq!(shoe.remaining_cards(), 52);
    }

    #[test]
    fn stacked_shoe_deals_in_order_then_reshuffles() {
        let mut shoe = Shoe::from_cards(1, &[8, 8, 10], SmallRng::seed_from_u64(0));
        assert_eq!(shoe.draw(), 8);
        assert_eq!(shoe.draw(), 8);
        assert_eq!(shoe.draw(), 10);
        assert_eq!(shoe.remaining_cards(), 0);

        let card = shoe.draw();
        assert!((1..=10).contains(&card));
        assert_eq!(shoe.remaining_cards(), 51);
    }

    #[test]
    fn remove_card_by_rank_takes_one_copy() {
        let mut shoe = Shoe::seeded(1, 9);
        assert!(shoe.remove_card_by_rank(1));
        assert_eq!(shoe.remaining_cards(), 51);
        assert_eq!(shoe.cards.iter().filter(|&&c| c == 1).count(), 3);
        assert!(!shoe.remove_card_by_rank(11));
    }
}
