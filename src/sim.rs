use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    agent::{QLearningAgent, StateKey},
    config::{AgentConfig, EnvConfig},
    env::BlackjackEnv,
    errors::{EnvError, SimError},
    round::{HandRecord, Outcome},
    strategy::{Action, BasicStrategy, Policy},
};

fn default_progress_interval() -> u32 {
    1_000
}

fn default_evaluation_episodes() -> u32 {
    1_000
}

#[derive(Debug, Deserialize)]
pub struct TrainingInput {
    pub episodes: u32,
    pub seed: u64,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u32,
    #[serde(default = "default_evaluation_episodes")]
    pub evaluation_episodes: u32,
    #[serde(default = "default_evaluation_episodes")]
    pub comparison_tests: u32,
}

#[derive(Debug, Deserialize)]
pub struct EvaluationInput {
    pub episodes: u32,
    pub seed: u64,
}

/// One round, optionally from fixed starting cards.
#[derive(Debug, Deserialize)]
pub struct RoundInput {
    pub seed: u64,
    #[serde(default)]
    pub player_cards: Option<Vec<u8>>,
    #[serde(default)]
    pub dealer_card: Option<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    pub hands: Vec<HandRecord>,
    pub dealer_cards: Vec<u8>,
    pub dealer_upcard: u8,
    pub actions: Vec<Action>,
    pub reward: i32,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub episodes: u32,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    pub total_reward: i64,
    pub average_reward: f64,
}

impl EvaluationResult {
    fn record(&mut self, reward: i32) {
        self.episodes += 1;
        self.total_reward += i64::from(reward);
        match Outcome::from_reward(reward) {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Push => self.pushes += 1,
        }
    }

    fn finalize(&mut self) {
        self.average_reward = if self.episodes > 0 {
            self.total_reward as f64 / self.episodes as f64
        } else {
            0.0
        };
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingResult {
    pub rewards: EvaluationResult,
    pub final_epsilon: f64,
    pub final_alpha: f64,
    pub states_learned: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub player_cards: Vec<u8>,
    pub player_total: u8,
    pub usable_ace: bool,
    pub dealer_upcard: u8,
    pub agent_action: Action,
    pub basic_action: Action,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub total_tests: u32,
    pub mismatches: u32,
    pub accuracy: f64,
    pub records: Vec<Mismatch>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingReport {
    pub training: TrainingResult,
    pub agent: EvaluationResult,
    pub basic: EvaluationResult,
    pub comparison: ComparisonResult,
}

fn current_state<R: Rng>(env: &BlackjackEnv<R>) -> Result<StateKey, EnvError> {
    env.view()
        .map(|view| StateKey::from_view(&view))
        .ok_or(EnvError::NoRoundInProgress)
}

/// Plays the round already dealt in `env` to the end with `policy`.
fn play_out<R, P>(env: &mut BlackjackEnv<R>, policy: &mut P) -> Result<RoundRecord, EnvError>
where
    R: Rng,
    P: Policy + ?Sized,
{
    let mut actions = Vec::new();
    let mut reward = 0;
    while !env.is_done() {
        let view = env.view().ok_or(EnvError::NoRoundInProgress)?;
        let action = policy.choose_action(&view);
        let step = env.step(action)?;
        actions.push(action);
        reward += step.reward;
    }

    let round = env.round().ok_or(EnvError::NoRoundInProgress)?;
    Ok(RoundRecord {
        hands: round.hands().to_vec(),
        dealer_cards: round.dealer().hand.cards().to_vec(),
        dealer_upcard: round.dealer().upcard(),
        actions,
        reward,
        outcome: Outcome::from_reward(reward),
    })
}

pub fn play_round<R, P>(env: &mut BlackjackEnv<R>, policy: &mut P) -> Result<RoundRecord, EnvError>
where
    R: Rng,
    P: Policy + ?Sized,
{
    env.reset();
    play_out(env, policy)
}

pub fn train<R, A, F>(
    env: &mut BlackjackEnv<R>,
    agent: &mut QLearningAgent<A>,
    episodes: u32,
    progress_interval: u32,
    mut progress_cb: F,
) -> Result<TrainingResult, EnvError>
where
    R: Rng,
    A: Rng,
    F: FnMut(u32, u32),
{
    let progress_interval = progress_interval.max(1);
    let mut rewards = EvaluationResult::default();

    for episode in 0..episodes {
        env.reset();
        let mut state = current_state(env)?;
        let mut total_reward = 0;

        loop {
            let legal = env.legal_actions();
            let action = agent.select_action(&state, &legal);
            let step = env.step(action)?;
            let next_state = current_state(env)?;
            let next_legal = env.legal_actions();
            agent.update(&state, action, step.reward, &next_state, &next_legal, step.done);

            total_reward += step.reward;
            state = next_state;
            if step.done {
                break;
            }
        }
        rewards.record(total_reward);

        let completed = episode + 1;
        if completed % progress_interval == 0 || completed == episodes {
            info!(
                episode = completed,
                episodes,
                total_reward,
                epsilon = agent.epsilon(),
                "training progress"
            );
            progress_cb(completed, episodes);
        }
    }
    rewards.finalize();

    Ok(TrainingResult {
        rewards,
        final_epsilon: agent.epsilon(),
        final_alpha: agent.alpha(),
        states_learned: agent.states_learned(),
    })
}

/// Plays `episodes` rounds and tallies each round's summed reward.
pub fn evaluate<R, P>(
    env: &mut BlackjackEnv<R>,
    policy: &mut P,
    episodes: u32,
) -> Result<EvaluationResult, EnvError>
where
    R: Rng,
    P: Policy + ?Sized,
{
    let mut result = EvaluationResult::default();
    for _ in 0..episodes {
        let record = play_round(env, policy)?;
        result.record(record.reward);
    }
    result.finalize();
    Ok(result)
}

/// Deals `tests` fresh rounds and compares the agent's greedy first action
/// with basic strategy's.
pub fn compare<R, A>(
    env: &mut BlackjackEnv<R>,
    agent: &QLearningAgent<A>,
    tests: u32,
) -> Result<ComparisonResult, EnvError>
where
    R: Rng,
    A: Rng,
{
    let mut records = Vec::new();
    for _ in 0..tests {
        env.reset();
        let view = env.view().ok_or(EnvError::NoRoundInProgress)?;
        let agent_action = agent.greedy_action(&StateKey::from_view(&view), &view.legal_actions());
        let basic_action = BasicStrategy.decide_action(&view);
        if agent_action != basic_action {
            let mut player_cards = view.cards.to_vec();
            player_cards.sort_unstable();
            records.push(Mismatch {
                player_cards,
                player_total: view.observation.player_total,
                usable_ace: view.observation.usable_ace,
                dealer_upcard: view.observation.dealer_upcard,
                agent_action,
                basic_action,
            });
        }
    }

    let mismatches = records.len() as u32;
    let accuracy = if tests > 0 {
        (1.0 - mismatches as f64 / tests as f64) * 100.0
    } else {
        0.0
    };
    Ok(ComparisonResult {
        total_tests: tests,
        mismatches,
        accuracy,
        records,
    })
}

pub fn run_training(input: TrainingInput) -> Result<TrainingReport, SimError> {
    run_training_with_progress(input, |_current, _total| {})
}

/// Trains a Q agent, then evaluates it greedily next to basic strategy and
/// compares their first decisions.
pub fn run_training_with_progress<F>(input: TrainingInput, progress_cb: F) -> Result<TrainingReport, SimError>
where
    F: FnMut(u32, u32),
{
    input.agent.validate().map_err(SimError::InvalidInput)?;

    let mut env = BlackjackEnv::new(EnvConfig::seeded(input.seed));
    let mut agent = QLearningAgent::seeded(input.agent.clone(), input.seed.wrapping_add(1));

    let training = train(
        &mut env,
        &mut agent,
        input.episodes,
        input.progress_interval,
        progress_cb,
    )?;

    agent.set_epsilon(0.0);
    let agent_eval = evaluate(&mut env, &mut agent, input.evaluation_episodes)?;
    let basic_eval = evaluate(&mut env, &mut BasicStrategy, input.evaluation_episodes)?;
    let comparison = compare(&mut env, &agent, input.comparison_tests)?;

    info!(
        agent_average = agent_eval.average_reward,
        basic_average = basic_eval.average_reward,
        accuracy = comparison.accuracy,
        "training finished"
    );

    Ok(TrainingReport {
        training,
        agent: agent_eval,
        basic: basic_eval,
        comparison,
    })
}

pub fn run_evaluation(input: EvaluationInput) -> Result<EvaluationResult, SimError> {
    let mut env = BlackjackEnv::new(EnvConfig::seeded(input.seed));
    Ok(evaluate(&mut env, &mut BasicStrategy, input.episodes)?)
}

pub fn run_round(input: RoundInput) -> Result<RoundRecord, SimError> {
    let mut env = BlackjackEnv::new(EnvConfig::seeded(input.seed));
    match (input.player_cards, input.dealer_card) {
        (Some(player_cards), Some(dealer_card)) => {
            env.reset_with(&player_cards, dealer_card)?;
            Ok(play_out(&mut env, &mut BasicStrategy)?)
        }
        (None, None) => Ok(play_round(&mut env, &mut BasicStrategy)?),
        _ => Err(SimError::InvalidInput(
            "player_cards and dealer_card must be given together".to_string(),
        )),
    }
}
