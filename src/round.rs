use serde::Serialize;

use crate::{env::Observation, hand::Hand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Push,
}

impl Outcome {
    pub fn reward(self) -> i32 {
        match self {
            Outcome::Win => 1,
            Outcome::Loss => -1,
            Outcome::Push => 0,
        }
    }

    pub fn from_reward(reward: i32) -> Outcome {
        match reward.signum() {
            1 => Outcome::Win,
            -1 => Outcome::Loss,
            _ => Outcome::Push,
        }
    }
}

/// Settles a finished player hand against the finished dealer hand, one unit.
pub fn settle(player: &Hand, dealer: &Hand) -> Outcome {
    if player.is_bust() {
        return Outcome::Loss;
    }
    if dealer.is_bust() {
        return Outcome::Win;
    }
    let player_total = player.total();
    let dealer_total = dealer.total();
    if player_total > dealer_total {
        Outcome::Win
    } else if player_total < dealer_total {
        Outcome::Loss
    } else {
        Outcome::Push
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HandRecord {
    pub hand: Hand,
    pub stake: i32,
    pub outcome: Option<Outcome>,
}

impl HandRecord {
    pub fn new(hand: Hand) -> Self {
        HandRecord {
            hand,
            stake: 1,
            outcome: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.outcome.is_some()
    }

    /// Settled reward, stake applied. Zero while the hand is open.
    pub fn reward(&self) -> i32 {
        self.outcome.map_or(0, |outcome| outcome.reward() * self.stake)
    }

    pub(crate) fn settle_with(&mut self, outcome: Outcome) -> i32 {
        self.outcome = Some(outcome);
        self.reward()
    }
}

/// The dealer's hand. Only the upcard is dealt at round start; the rest is
/// drawn during play-out, which also flips `revealed`.
#[derive(Clone, Debug, Serialize)]
pub struct DealerHand {
    pub hand: Hand,
    pub revealed: bool,
}

impl DealerHand {
    pub fn new(upcard: u8) -> Self {
        DealerHand {
            hand: Hand::from_cards(&[upcard]),
            revealed: false,
        }
    }

    pub fn upcard(&self) -> u8 {
        self.hand.first().unwrap_or_default()
    }
}

/// State of one round. Player hands live in an arena addressed by index;
/// `active` is the hand currently receiving actions.
#[derive(Clone, Debug, Serialize)]
pub struct Round {
    dealer: DealerHand,
    hands: Vec<HandRecord>,
    active: usize,
    penalty: i32,
    done: bool,
}

impl Round {
    pub fn new(player: Hand, dealer_upcard: u8) -> Self {
        Round {
            dealer: DealerHand::new(dealer_upcard),
            hands: vec![HandRecord::new(player)],
            active: 0,
            penalty: 0,
            done: false,
        }
    }

    pub fn dealer(&self) -> &DealerHand {
        &self.dealer
    }

    pub fn hands(&self) -> &[HandRecord] {
        &self.hands
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &HandRecord {
        &self.hands[self.active]
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn is_last_hand(&self) -> bool {
        self.active + 1 == self.hands.len()
    }

    pub fn observation(&self) -> Observation {
        let (player_total, usable_ace) = self.active().hand.score();
        Observation {
            player_total,
            dealer_upcard: self.dealer.upcard(),
            usable_ace,
        }
    }

    /// Recorded settlements with stakes applied, plus any penalty charged to
    /// the round. Open hands count zero.
    pub fn cumulative_reward(&self) -> i32 {
        self.hands.iter().map(HandRecord::reward).sum::<i32>() + self.penalty
    }

    pub fn penalty(&self) -> i32 {
        self.penalty
    }

    pub(crate) fn active_mut(&mut self) -> &mut HandRecord {
        &mut self.hands[self.active]
    }

    pub(crate) fn dealer_mut(&mut self) -> &mut DealerHand {
        &mut self.dealer
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_last_hand() {
            self.active += 1;
        }
    }

    pub(crate) fn charge_penalty(&mut self, penalty: i32) {
        self.penalty += penalty;
    }

    pub(crate) fn finish(&mut self) {
        self.done = true;
    }

    /// Replaces the active hand with `first` and inserts `second` right after
    /// it. The cursor stays on `first`.
    pub(crate) fn split_active(&mut self, first: Hand, second: Hand) {
        self.hands[self.active] = HandRecord::new(first);
        self.hands.insert(self.active + 1, HandRecord::new(second));
    }

    pub(crate) fn has_open_hand(&self) -> bool {
        self.hands.iter().any(|record| !record.is_settled())
    }

    /// Settles every hand still open against the dealer and returns the sum.
    pub(crate) fn settle_open_hands(&mut self) -> i32 {
        let dealer = &self.dealer.hand;
        self.hands
            .iter_mut()
            .filter(|record| !record.is_settled())
            .map(|record| {
                let outcome = settle(&record.hand, dealer);
                record.settle_with(outcome)
            })
            .sum()
    }
}
