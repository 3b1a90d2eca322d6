use serde::Serialize;

/// Total of a hand and whether an ace is counted as 11.
///
/// At most one ace is promoted: a second soft ace would always bust.
/// Totals past `u8::MAX` saturate.
pub fn score(hand: &[u8]) -> (u8, bool) {
    let total: u32 = hand.iter().map(|&card| u32::from(card)).sum();
    let usable_ace = hand.contains(&1) && total + 10 <= 21;
    let total = if usable_ace { total + 10 } else { total };
    (u8::try_from(total).unwrap_or(u8::MAX), usable_ace)
}

pub fn is_bust(hand: &[u8]) -> bool {
    score(hand).0 > 21
}

pub fn is_pair(hand: &[u8]) -> bool {
    hand.len() == 2 && hand[0] == hand[1]
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Hand {
    cards: Vec<u8>,
}

impl Hand {
    pub fn new() -> Self {
        Hand { cards: Vec::new() }
    }

    pub fn from_cards(cards: &[u8]) -> Self {
        Hand {
            cards: cards.to_vec(),
        }
    }

    pub fn push(&mut self, card: u8) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[u8] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn first(&self) -> Option<u8> {
        self.cards.first().copied()
    }

    pub fn score(&self) -> (u8, bool) {
        score(&self.cards)
    }

    pub fn total(&self) -> u8 {
        self.score().0
    }

    pub fn is_bust(&self) -> bool {
        is_bust(&self.cards)
    }

    pub fn is_splittable(&self) -> bool {
        is_pair(&self.cards)
    }
}
