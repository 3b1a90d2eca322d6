use serde::{Deserialize, Serialize};

use crate::{env::Observation, errors::EnvError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Action {
    Stick = 0,
    Hit = 1,
    DoubleDown = 2,
    Split = 3,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Stick, Action::Hit, Action::DoubleDown, Action::Split];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            Action::Stick => "S",
            Action::Hit => "H",
            Action::DoubleDown => "D",
            Action::Split => "P",
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = EnvError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Action::Stick),
            1 => Ok(Action::Hit),
            2 => Ok(Action::DoubleDown),
            3 => Ok(Action::Split),
            other => Err(EnvError::UnknownAction(other)),
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> u8 {
        action as u8
    }
}

/// What a policy gets to see: the observation plus the raw cards of the
/// active hand, needed to spot pairs and two-card doubles.
#[derive(Debug, Clone, Copy)]
pub struct PolicyView<'a> {
    pub observation: Observation,
    pub cards: &'a [u8],
}

impl PolicyView<'_> {
    pub fn legal_actions(&self) -> Vec<Action> {
        legal_actions(self.cards)
    }
}

/// Stick and Hit always; DoubleDown on two cards; Split on a pair.
pub fn legal_actions(cards: &[u8]) -> Vec<Action> {
    let mut actions = vec![Action::Stick, Action::Hit];
    if cards.len() == 2 {
        actions.push(Action::DoubleDown);
    }
    if crate::hand::is_pair(cards) {
        actions.push(Action::Split);
    }
    actions
}

pub trait Policy {
    fn choose_action(&mut self, view: &PolicyView<'_>) -> Action;
}

/// Fixed-rule basic strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicStrategy;

impl BasicStrategy {
    pub fn decide_action(&self, view: &PolicyView<'_>) -> Action {
        let Observation {
            player_total,
            dealer_upcard: dealer,
            usable_ace,
        } = view.observation;
        let cards = view.cards;
        let two_cards = cards.len() == 2;

        if let Some(action) = pair_action(cards, dealer) {
            return action;
        }

        if usable_ace {
            return match player_total {
                0..=17 => Action::Hit,
                18 if (3..=6).contains(&dealer) => double_or_hit(two_cards),
                18 if matches!(dealer, 2 | 7 | 8) => Action::Stick,
                18 => Action::Hit,
                _ => Action::Stick,
            };
        }

        match player_total {
            17.. => Action::Stick,
            13..=16 if (2..=6).contains(&dealer) => Action::Stick,
            12 if (4..=6).contains(&dealer) => Action::Stick,
            11 => double_or_hit(two_cards),
            10 if dealer < 10 => double_or_hit(two_cards),
            9 if (3..=6).contains(&dealer) => double_or_hit(two_cards),
            _ => Action::Hit,
        }
    }
}

impl Policy for BasicStrategy {
    fn choose_action(&mut self, view: &PolicyView<'_>) -> Action {
        self.decide_action(view)
    }
}

/// Pair rules. `None` falls through to the total-based tables.
fn pair_action(cards: &[u8], dealer: u8) -> Option<Action> {
    if !crate::hand::is_pair(cards) {
        return None;
    }
    match cards[0] {
        1 | 8 => Some(Action::Split),
        5 | 10 => Some(Action::Stick),
        9 if !matches!(dealer, 7 | 10 | 1) => Some(Action::Split),
        6 if (2..=6).contains(&dealer) => Some(Action::Split),
        _ => None,
    }
}

fn double_or_hit(two_cards: bool) -> Action {
    if two_cards {
        Action::DoubleDown
    } else {
        Action::Hit
    }
}
