//! The round engine: deals from the shoe, applies actions to the active hand,
//! plays the dealer out and settles.
//!
//! Rewards are in units of one stake: +1 win, -1 loss, 0 push, doubled for a
//! doubled hand. A step's reward is the sum of the hands settled during that
//! step, so the rewards of one round add up to its total result. A busted
//! hand settles at once; every other hand settles when the last hand
//! finishes.
//!
//! A double down finishes only the hand it was played on. After a split,
//! play moves on to the next hand and the round ends with the last one.

use rand::{rngs::SmallRng, Rng};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::{
    config::{EnvConfig, SHOE_DECKS},
    errors::EnvError,
    hand::Hand,
    round::{DealerHand, HandRecord, Outcome, Round},
    shoe::Shoe,
    strategy::{legal_actions, Action, PolicyView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Observation {
    pub player_total: u8,
    pub dealer_upcard: u8,
    pub usable_ace: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepInfo {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub observation: Observation,
    pub reward: i32,
    pub done: bool,
    pub info: StepInfo,
}

pub struct BlackjackEnv<R = SmallRng> {
    shoe: Shoe<R>,
    config: EnvConfig,
    round: Option<Round>,
}

impl BlackjackEnv<SmallRng> {
    pub fn new(config: EnvConfig) -> Self {
        let shoe = match config.seed {
            Some(seed) => Shoe::seeded(SHOE_DECKS, seed),
            None => Shoe::from_entropy(SHOE_DECKS),
        };
        BlackjackEnv::with_shoe(shoe, config)
    }

    pub fn seeded(seed: u64) -> Self {
        BlackjackEnv::new(EnvConfig::seeded(seed))
    }
}

impl<R: Rng> BlackjackEnv<R> {
    pub fn with_shoe(shoe: Shoe<R>, config: EnvConfig) -> Self {
        BlackjackEnv {
            shoe,
            config,
            round: None,
        }
    }

    /// Starts a new round: two cards to the player, the upcard to the dealer.
    pub fn reset(&mut self) -> Observation {
        self.shoe.ensure(self.config.deal_threshold);
        let first = self.shoe.draw();
        let upcard = self.shoe.draw();
        let second = self.shoe.draw();
        self.start_round(Hand::from_cards(&[first, second]), upcard)
    }

    /// Starts a round from fixed cards. Each card is taken out of the shoe
    /// when the shoe still holds one of that rank.
    pub fn reset_with(&mut self, player_cards: &[u8], dealer_upcard: u8) -> Result<Observation, EnvError> {
        if player_cards.is_empty() {
            return Err(EnvError::EmptyHand);
        }
        if let Some(&card) = player_cards
            .iter()
            .chain(std::iter::once(&dealer_upcard))
            .find(|card| !(1..=10).contains(*card))
        {
            return Err(EnvError::InvalidCard(card));
        }

        self.shoe.ensure(self.config.deal_threshold);
        for &card in player_cards {
            self.shoe.remove_card_by_rank(card);
        }
        self.shoe.remove_card_by_rank(dealer_upcard);
        Ok(self.start_round(Hand::from_cards(player_cards), dealer_upcard))
    }

    fn start_round(&mut self, player: Hand, upcard: u8) -> Observation {
        let round = Round::new(player, upcard);
        let observation = round.observation();
        self.round = Some(round);
        observation
    }

    pub fn step_code(&mut self, code: u8) -> Result<Step, EnvError> {
        self.step(Action::try_from(code)?)
    }

    pub fn step(&mut self, action: Action) -> Result<Step, EnvError> {
        let BlackjackEnv { shoe, config, round } = self;
        let round = round.as_mut().ok_or(EnvError::NoRoundInProgress)?;

        if round.is_done() {
            return Ok(transition(round, 0));
        }

        trace!(?action, hand = round.active_index(), "applying action");
        let reward = match action {
            Action::Stick => finish_hand(round, shoe, config),
            Action::Hit => {
                let card = shoe.draw();
                let active = round.active_mut();
                active.hand.push(card);
                if active.hand.is_bust() {
                    let lost = active.settle_with(Outcome::Loss);
                    lost + finish_hand(round, shoe, config)
                } else {
                    0
                }
            }
            Action::DoubleDown => {
                let cards = round.active().hand.len();
                if cards != 2 {
                    return Err(EnvError::DoubleDownNotAllowed { cards });
                }
                let card = shoe.draw();
                let active = round.active_mut();
                active.stake = 2;
                active.hand.push(card);
                let lost = if active.hand.is_bust() {
                    active.settle_with(Outcome::Loss)
                } else {
                    0
                };
                lost + finish_hand(round, shoe, config)
            }
            Action::Split => {
                let active = &round.active().hand;
                if active.is_splittable() {
                    let rank = active.cards()[0];
                    let first = Hand::from_cards(&[rank, shoe.draw()]);
                    let second = Hand::from_cards(&[rank, shoe.draw()]);
                    round.split_active(first, second);
                    0
                } else {
                    warn!(cards = ?active.cards(), "split requested on a hand that is not a pair");
                    round.charge_penalty(config.illegal_split_penalty);
                    close_round(round, shoe, config);
                    config.illegal_split_penalty
                }
            }
        };

        Ok(transition(round, reward))
    }

    pub fn observation(&self) -> Option<Observation> {
        self.round.as_ref().map(Round::observation)
    }

    /// The active hand together with the observation, as a policy sees it.
    pub fn view(&self) -> Option<PolicyView<'_>> {
        self.round.as_ref().map(|round| PolicyView {
            observation: round.observation(),
            cards: round.active().hand.cards(),
        })
    }

    /// Actions the engine accepts without error or penalty. Empty once the
    /// round is over or before the first reset.
    pub fn legal_actions(&self) -> Vec<Action> {
        match &self.round {
            Some(round) if !round.is_done() => legal_actions(round.active().hand.cards()),
            _ => Vec::new(),
        }
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    pub fn active_hand(&self) -> Option<&Hand> {
        self.round.as_ref().map(|round| &round.active().hand)
    }

    pub fn hands(&self) -> &[HandRecord] {
        match &self.round {
            Some(round) => round.hands(),
            None => &[],
        }
    }

    pub fn dealer_hand(&self) -> Option<&DealerHand> {
        self.round.as_ref().map(Round::dealer)
    }

    pub fn is_done(&self) -> bool {
        self.round.as_ref().map_or(true, Round::is_done)
    }

    pub fn cumulative_reward(&self) -> i32 {
        self.round.as_ref().map_or(0, Round::cumulative_reward)
    }

    pub fn shoe_len(&self) -> usize {
        self.shoe.remaining_cards()
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }
}

fn transition(round: &Round, reward: i32) -> Step {
    Step {
        observation: round.observation(),
        reward,
        done: round.is_done(),
        info: StepInfo::default(),
    }
}

/// The active hand is finished. Moves to the next hand, or, on the last one,
/// plays the dealer out when any hand is still open and settles the round.
fn finish_hand<R: Rng>(round: &mut Round, shoe: &mut Shoe<R>, config: &EnvConfig) -> i32 {
    if !round.is_last_hand() {
        round.advance();
        return 0;
    }

    if round.has_open_hand() {
        play_dealer(round.dealer_mut(), shoe);
    }
    let reward = round.settle_open_hands();
    debug!(
        reward,
        total = round.cumulative_reward(),
        dealer_total = round.dealer().hand.total(),
        hands = round.hands().len(),
        "round settled"
    );
    close_round(round, shoe, config);
    reward
}

fn close_round<R: Rng>(round: &mut Round, shoe: &mut Shoe<R>, config: &EnvConfig) {
    round.finish();
    shoe.ensure(config.round_end_threshold);
}

/// Dealer draws to 17 and stands on every 17, soft or hard.
pub fn play_dealer<R: Rng>(dealer: &mut DealerHand, shoe: &mut Shoe<R>) {
    dealer.revealed = true;
    while dealer.hand.total() < 17 {
        dealer.hand.push(shoe.draw());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn stacked(cards: &[u8]) -> BlackjackEnv {
        let config = EnvConfig {
            deal_threshold: 0,
            round_end_threshold: 0,
            ..EnvConfig::seeded(0)
        };
        let shoe = Shoe::from_cards(SHOE_DECKS, cards, SmallRng::seed_from_u64(0));
        BlackjackEnv::with_shoe(shoe, config)
    }

    #[test]
    fn reset_deals_player_dealer_player() {
        let mut env = stacked(&[10, 6, 7]);
        let obs = env.reset();
        assert_eq!(env.active_hand().unwrap().cards(), &[10, 7]);
        assert_eq!(obs.dealer_upcard, 6);
        assert_eq!(obs.player_total, 17);
        assert!(!env.dealer_hand().unwrap().revealed);
    }

    #[test]
    fn stick_plays_dealer_and_settles() {
        // player 10,9; dealer 6 then draws 10, 2
        let mut env = stacked(&[10, 6, 9, 10, 2]);
        env.reset();
        let step = env.step(Action::Stick).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, 1);
        let dealer = env.dealer_hand().unwrap();
        assert!(dealer.revealed);
        assert_eq!(dealer.hand.cards(), &[6, 10, 2]);
    }

    #[test]
    fn dealer_stands_on_soft_seventeen() {
        let mut env = stacked(&[10, 1, 8, 6]);
        env.reset();
        let step = env.step(Action::Stick).unwrap();
        assert_eq!(env.dealer_hand().unwrap().hand.cards(), &[1, 6]);
        assert_eq!(step.reward, 1);
    }

    #[test]
    fn bust_on_last_hand_skips_dealer_play() {
        let mut env = stacked(&[10, 5, 6, 9]);
        env.reset();
        let step = env.step(Action::Hit).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, -1);
        let dealer = env.dealer_hand().unwrap();
        assert_eq!(dealer.hand.len(), 1);
        assert!(!dealer.revealed);
    }

    #[test]
    fn illegal_split_penalty_is_the_round_total() {
        let mut env = stacked(&[10, 7, 6]);
        env.reset();
        let step = env.step(Action::Split).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, -5);
        assert_eq!(env.cumulative_reward(), -5);
        assert_eq!(env.round().unwrap().penalty(), -5);
        assert!(!env.dealer_hand().unwrap().revealed);
    }

    #[test]
    fn double_down_bust_costs_two() {
        let mut env = stacked(&[6, 9, 6, 10]);
        env.reset();
        let step = env.step(Action::DoubleDown).unwrap();
        assert!(step.done);
        assert_eq!(step.reward, -2);
        assert_eq!(env.hands()[0].stake, 2);
    }
}
