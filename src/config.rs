use serde::{Deserialize, Serialize};

/// Decks in the shoe. Fixed for every environment.
pub const SHOE_DECKS: u8 = 6;

fn default_deal_threshold() -> usize {
    40
}

fn default_round_end_threshold() -> usize {
    15
}

fn default_illegal_split_penalty() -> i32 {
    -5
}

/// Engine settings. A missing `seed` means the shoe is seeded from entropy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_deal_threshold")]
    pub deal_threshold: usize,
    #[serde(default = "default_round_end_threshold")]
    pub round_end_threshold: usize,
    #[serde(default = "default_illegal_split_penalty")]
    pub illegal_split_penalty: i32,
}

impl EnvConfig {
    pub fn seeded(seed: u64) -> Self {
        EnvConfig {
            seed: Some(seed),
            ..EnvConfig::default()
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig {
            seed: None,
            deal_threshold: default_deal_threshold(),
            round_end_threshold: default_round_end_threshold(),
            illegal_split_penalty: default_illegal_split_penalty(),
        }
    }
}

fn default_alpha() -> f64 {
    0.05
}

fn default_gamma() -> f64 {
    0.99
}

fn default_epsilon() -> f64 {
    1.0
}

fn default_epsilon_decay() -> f64 {
    0.9995
}

fn default_epsilon_min() -> f64 {
    0.1
}

fn default_alpha_decay() -> f64 {
    0.99
}

fn default_alpha_min() -> f64 {
    0.001
}

/// Hyperparameters for the tabular Q agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_epsilon_decay")]
    pub epsilon_decay: f64,
    #[serde(default = "default_epsilon_min")]
    pub epsilon_min: f64,
    #[serde(default = "default_alpha_decay")]
    pub alpha_decay: f64,
    #[serde(default = "default_alpha_min")]
    pub alpha_min: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            alpha: default_alpha(),
            gamma: default_gamma(),
            epsilon: default_epsilon(),
            epsilon_decay: default_epsilon_decay(),
            epsilon_min: default_epsilon_min(),
            alpha_decay: default_alpha_decay(),
            alpha_min: default_alpha_min(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(format!("alpha must be in [0, 1], got {}", self.alpha));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon) || !(0.0..=1.0).contains(&self.epsilon_min) {
            return Err("epsilon and epsilon_min must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.epsilon_decay) || !(0.0..=1.0).contains(&self.alpha_decay) {
            return Err("decay factors must be in [0, 1]".to_string());
        }
        Ok(())
    }
}
