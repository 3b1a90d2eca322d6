//! Blackjack round environment for policy training and evaluation.
//!
//! [`env::BlackjackEnv`] deals rounds from a seeded six-deck shoe and exposes
//! `reset`/`step`: observations are `(player_total, dealer_upcard,
//! usable_ace)`, actions are Stick, Hit, DoubleDown and Split, and rewards
//! are whole stakes. [`strategy`] and [`agent`] hold the two policies,
//! [`sim`] the training and evaluation loops. The `#[wasm_bindgen]`
//! functions below are the browser entry points.

use js_sys::Function;
use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;

pub mod agent;
pub mod config;
pub mod env;
pub mod errors;
pub mod hand;
pub mod round;
pub mod shoe;
pub mod sim;
pub mod strategy;

pub use crate::{
    agent::{QLearningAgent, StateKey},
    config::{AgentConfig, EnvConfig},
    env::{BlackjackEnv, Observation, Step, StepInfo},
    errors::{EnvError, SimError},
    hand::{is_bust, score, Hand},
    round::{settle, DealerHand, HandRecord, Outcome, Round},
    shoe::Shoe,
    strategy::{Action, BasicStrategy, Policy, PolicyView},
};

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    let message = JsValue::from_str(&format!("{context}: {err}"));
    web_sys::console::error_1(&message);
    message
}

fn parse_input<T: DeserializeOwned>(params: &JsValue) -> Result<T, JsValue> {
    console_error_panic_hook::set_once();
    serde_wasm_bindgen::from_value(params.clone()).map_err(|err| js_error("Invalid input", err))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| js_error("Serialization failed", err))
}

#[wasm_bindgen]
pub fn run_training(params: &JsValue) -> Result<JsValue, JsValue> {
    let input: sim::TrainingInput = parse_input(params)?;
    let report = sim::run_training(input).map_err(|err| js_error("Training failed", err))?;
    to_js(&report)
}

#[wasm_bindgen]
pub fn run_training_with_progress(
    params: &JsValue,
    progress_callback: &Function,
) -> Result<JsValue, JsValue> {
    let input: sim::TrainingInput = parse_input(params)?;

    let progress_cb = |current: u32, total: u32| {
        let _ = progress_callback.call2(
            &JsValue::NULL,
            &JsValue::from(current),
            &JsValue::from(total),
        );
    };

    let report = sim::run_training_with_progress(input, progress_cb)
        .map_err(|err| js_error("Training failed", err))?;
    to_js(&report)
}

#[wasm_bindgen]
pub fn run_evaluation(params: &JsValue) -> Result<JsValue, JsValue> {
    let input: sim::EvaluationInput = parse_input(params)?;
    let result = sim::run_evaluation(input).map_err(|err| js_error("Evaluation failed", err))?;
    to_js(&result)
}

#[wasm_bindgen]
pub fn play_single_round(params: &JsValue) -> Result<JsValue, JsValue> {
    let input: sim::RoundInput = parse_input(params)?;
    let record = sim::run_round(input).map_err(|err| js_error("Round failed", err))?;
    to_js(&record)
}

/// Step-by-step access to one environment from JavaScript.
#[wasm_bindgen]
pub struct WasmEnv {
    inner: BlackjackEnv,
}

#[wasm_bindgen]
impl WasmEnv {
    #[wasm_bindgen(constructor)]
    pub fn new(params: &JsValue) -> Result<WasmEnv, JsValue> {
        let config: EnvConfig = if params.is_undefined() || params.is_null() {
            EnvConfig::default()
        } else {
            parse_input(params)?
        };
        Ok(WasmEnv {
            inner: BlackjackEnv::new(config),
        })
    }

    pub fn reset(&mut self) -> Result<JsValue, JsValue> {
        let observation = self.inner.reset();
        to_js(&observation)
    }

    pub fn step(&mut self, action: u8) -> Result<JsValue, JsValue> {
        let step = self
            .inner
            .step_code(action)
            .map_err(|err| js_error("Step failed", err))?;
        to_js(&step)
    }

    #[wasm_bindgen(js_name = activeHand)]
    pub fn active_hand(&self) -> Vec<u8> {
        self.inner
            .active_hand()
            .map(|hand| hand.cards().to_vec())
            .unwrap_or_default()
    }

    #[wasm_bindgen(js_name = legalActions)]
    pub fn legal_actions(&self) -> Vec<u8> {
        self.inner.legal_actions().into_iter().map(u8::from).collect()
    }

    #[wasm_bindgen(js_name = cumulativeReward)]
    pub fn cumulative_reward(&self) -> i32 {
        self.inner.cumulative_reward()
    }
}
