use std::collections::HashMap;

use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    config::AgentConfig,
    env::Observation,
    strategy::{Action, Policy, PolicyView},
};

/// Q-table key: the observation plus the active hand's cards, sorted so that
/// the order they were dealt in does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    pub observation: Observation,
    pub cards: Vec<u8>,
}

impl StateKey {
    pub fn new(observation: Observation, cards: &[u8]) -> Self {
        let mut cards = cards.to_vec();
        cards.sort_unstable();
        StateKey { observation, cards }
    }

    pub fn from_view(view: &PolicyView<'_>) -> Self {
        StateKey::new(view.observation, view.cards)
    }
}

type ActionValues = [f64; 4];

/// Tabular Q-learning with epsilon-greedy exploration.
pub struct QLearningAgent<R = SmallRng> {
    q_table: HashMap<StateKey, ActionValues>,
    config: AgentConfig,
    epsilon: f64,
    alpha: f64,
    rng: R,
}

impl QLearningAgent<SmallRng> {
    pub fn seeded(config: AgentConfig, seed: u64) -> Self {
        QLearningAgent::new(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> QLearningAgent<R> {
    pub fn new(config: AgentConfig, rng: R) -> Self {
        QLearningAgent {
            q_table: HashMap::new(),
            epsilon: config.epsilon,
            alpha: config.alpha,
            config,
            rng,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.clamp(0.0, 1.0);
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn states_learned(&self) -> usize {
        self.q_table.len()
    }

    pub fn values(&self, state: &StateKey) -> Option<&ActionValues> {
        self.q_table.get(state)
    }

    /// Epsilon-greedy choice among `legal`.
    pub fn select_action(&mut self, state: &StateKey, legal: &[Action]) -> Action {
        if self.rng.gen::<f64>() < self.epsilon {
            if let Some(&action) = legal.choose(&mut self.rng) {
                return action;
            }
        }
        self.greedy_action(state, legal)
    }

    /// Highest-valued legal action; ties go to the lowest action code.
    /// Unseen states value every action at zero.
    pub fn greedy_action(&self, state: &StateKey, legal: &[Action]) -> Action {
        let values = self.q_table.get(state).copied().unwrap_or_default();
        let mut best: Option<Action> = None;
        for &action in legal {
            match best {
                Some(current) if values[action.index()] <= values[current.index()] => {}
                _ => best = Some(action),
            }
        }
        best.unwrap_or(Action::Stick)
    }

    /// One Q-learning update. `next_legal` bounds the max over the next
    /// state's values; it is ignored when `done`.
    pub fn update(
        &mut self,
        state: &StateKey,
        action: Action,
        reward: i32,
        next_state: &StateKey,
        next_legal: &[Action],
        done: bool,
    ) {
        let target = if done {
            reward as f64
        } else {
            let next_values = self.q_table.get(next_state).copied().unwrap_or_default();
            let best_next = next_legal
                .iter()
                .map(|action| next_values[action.index()])
                .fold(f64::NEG_INFINITY, f64::max);
            let best_next = if best_next.is_finite() { best_next } else { 0.0 };
            reward as f64 + self.config.gamma * best_next
        };

        let alpha = self.alpha;
        let values = self.q_table.entry(state.clone()).or_default();
        let predicted = values[action.index()];
        values[action.index()] += alpha * (target - predicted);

        if self.epsilon > self.config.epsilon_min {
            self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        }
        self.alpha = (self.alpha * self.config.alpha_decay).max(self.config.alpha_min);
    }
}

impl<R: Rng> Policy for QLearningAgent<R> {
    fn choose_action(&mut self, view: &PolicyView<'_>) -> Action {
        let state = StateKey::from_view(view);
        let legal = view.legal_actions();
        self.select_action(&state, &legal)
    }
}
