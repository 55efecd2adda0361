use crate::agent::q_table::{QTable, StepSize};
use crate::config::AgentConfig;
use crate::error::{BeamError, Result};
use crate::state::StateKey;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Value update rule, resolved once when the agent is built
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateRule {
    /// Per-state bandit: `Q ← Q + α(r − Q)`
    Simple,
    /// On-policy TD: bootstrap from the next action the policy picks
    Sarsa,
    /// Off-policy TD: bootstrap from the best next action
    QLearning,
}

impl UpdateRule {
    /// Parse a method name; unknown names fall back to Q-learning.
    pub fn from_name(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "simple" => UpdateRule::Simple,
            "sarsa" => UpdateRule::Sarsa,
            "qlearning" => UpdateRule::QLearning,
            _ => {
                warn!(method = name, "unknown update rule, falling back to Q-learning");
                UpdateRule::QLearning
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpdateRule::Simple => "simple",
            UpdateRule::Sarsa => "SARSA",
            UpdateRule::QLearning => "Q-LEARNING",
        }
    }
}

/// One observed step, as fed to [`Agent::learn`]
#[derive(Clone, Copy, Debug)]
pub struct Transition<'a> {
    pub state: &'a StateKey,
    pub action: usize,
    pub reward: f64,
    pub next_state: &'a StateKey,
    /// Last step of the chunk; no value is bootstrapped past it
    pub end: bool,
}

/// Tabular epsilon-greedy agent over receive-beam indices
///
/// # Example
///
/// ```rust
/// use beamtrack::agent::{AgentBuilder, UpdateRule};
/// use beamtrack::state::StateKey;
///
/// let mut agent = AgentBuilder::new()
///     .num_actions(8)
///     .epsilon(0.0)
///     .rule(UpdateRule::Simple)
///     .seed(7)
///     .build()
///     .unwrap();
///
/// let state = StateKey::from_actions(vec![3, 4, 4]);
/// agent.update(&state, 5, 1.0);
/// assert_eq!(agent.e_greedy(&state), 5);
/// ```
#[derive(Clone, Debug)]
pub struct Agent {
    pub q_table: QTable,
    pub rule: UpdateRule,
    pub epsilon: f64,
    pub gamma: f64,
    pub step_size: StepSize,
    /// Restrict moves to neighbouring beams
    pub adjacency: bool,
    rng: StdRng,
}

impl Agent {
    pub fn new(
        num_actions: usize,
        rule: UpdateRule,
        epsilon: f64,
        gamma: f64,
        step_size: StepSize,
        adjacency: bool,
        seed: u64,
    ) -> Self {
        Agent {
            q_table: QTable::new(num_actions),
            rule,
            epsilon,
            gamma,
            step_size,
            adjacency,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &AgentConfig, num_actions: usize, seed: u64) -> Result<Self> {
        AgentBuilder::new()
            .num_actions(num_actions)
            .rule(config.update_rule())
            .epsilon(config.epsilon)
            .gamma(config.gamma)
            .step_size(config.step_size.clone())
            .adjacency(config.adjacency)
            .seed(seed)
            .build()
    }

    pub fn num_actions(&self) -> usize {
        self.q_table.num_actions()
    }

    /// Beams reachable from `previous` in one step: `previous ± 1`, clamped
    /// to the codebook edges.
    pub fn adjacent_actions(&self, previous: usize) -> Vec<usize> {
        let last = self.num_actions() - 1;
        let low = previous.saturating_sub(1);
        let high = (previous + 1).min(last);
        (low..=high).collect()
    }

    fn e_greedy_over(&mut self, state: &StateKey, candidates: &[usize]) -> usize {
        if self.rng.gen::<f64>() < self.epsilon {
            candidates[self.rng.gen_range(0..candidates.len())]
        } else {
            self.q_table.greedy(state, candidates)
        }
    }

    /// Epsilon-greedy over the whole codebook.
    pub fn e_greedy(&mut self, state: &StateKey) -> usize {
        let candidates: Vec<usize> = (0..self.num_actions()).collect();
        self.e_greedy_over(state, &candidates)
    }

    /// Epsilon-greedy over the beams adjacent to `previous`.
    pub fn e_greedy_adj(&mut self, state: &StateKey, previous: usize) -> usize {
        let candidates = self.adjacent_actions(previous);
        self.e_greedy_over(state, &candidates)
    }

    /// Policy used by the training loop: adjacency-constrained when enabled
    /// and a previous action exists.
    pub fn select_action(&mut self, state: &StateKey, previous: Option<usize>) -> usize {
        match (self.adjacency, previous) {
            (true, Some(previous)) => self.e_greedy_adj(state, previous),
            _ => self.e_greedy(state),
        }
    }

    /// Count the visit and return the step size to use for it.
    fn visit(&mut self, state: &StateKey, action: usize) -> f64 {
        let row = self.q_table.entry(state);
        row.visits[action] += 1;
        let visits = row.visits[action];
        self.step_size.alpha(visits)
    }

    fn apply(&mut self, state: &StateKey, action: usize, target: f64) {
        let alpha = self.visit(state, action);
        let row = self.q_table.entry(state);
        let value = row.values[action];
        row.values[action] = value + alpha * (target - value);
    }

    /// Bandit update: `Q ← Q + α(r − Q)`.
    pub fn update(&mut self, state: &StateKey, action: usize, reward: f64) {
        self.apply(state, action, reward);
    }

    /// SARSA update bootstrapping from `Q(next_state, next_action)`.
    pub fn update_sarsa(
        &mut self,
        state: &StateKey,
        action: usize,
        reward: f64,
        next_state: &StateKey,
        next_action: usize,
        end: bool,
    ) {
        let bootstrap = if end {
            0.0
        } else {
            self.gamma * self.q_table.value(next_state, next_action)
        };
        self.apply(state, action, reward + bootstrap);
    }

    /// Q-learning update bootstrapping from the best reachable next action.
    ///
    /// With adjacency enabled the maximum runs over the beams adjacent to
    /// `action`, which is the previous action at the next step.
    pub fn update_q_learning(
        &mut self,
        state: &StateKey,
        action: usize,
        reward: f64,
        next_state: &StateKey,
        end: bool,
    ) {
        let bootstrap = if end {
            0.0
        } else {
            let candidates = if self.adjacency {
                self.adjacent_actions(action)
            } else {
                (0..self.num_actions()).collect()
            };
            self.gamma * self.q_table.max_value(next_state, &candidates)
        };
        self.apply(state, action, reward + bootstrap);
    }

    /// Apply the configured update rule to one transition.
    ///
    /// Returns the next action SARSA bootstrapped from, if any.
    pub fn learn(&mut self, transition: &Transition) -> Option<usize> {
        match self.rule {
            UpdateRule::Simple => {
                self.update(transition.state, transition.action, transition.reward);
                None
            }
            UpdateRule::Sarsa => {
                let next_action = if transition.end {
                    transition.action
                } else {
                    self.select_action(transition.next_state, Some(transition.action))
                };
                self.update_sarsa(
                    transition.state,
                    transition.action,
                    transition.reward,
                    transition.next_state,
                    next_action,
                    transition.end,
                );
                (!transition.end).then_some(next_action)
            }
            UpdateRule::QLearning => {
                self.update_q_learning(
                    transition.state,
                    transition.action,
                    transition.reward,
                    transition.next_state,
                    transition.end,
                );
                None
            }
        }
    }
}

/// Builder pattern for [`Agent`]
pub struct AgentBuilder {
    num_actions: usize,
    rule: UpdateRule,
    epsilon: f64,
    gamma: f64,
    step_size: StepSize,
    adjacency: bool,
    seed: u64,
}

impl AgentBuilder {
    pub fn new() -> Self {
        AgentBuilder {
            num_actions: 0,
            rule: UpdateRule::QLearning,
            epsilon: 0.1,
            gamma: 0.7,
            step_size: StepSize::default(),
            adjacency: false,
            seed: 0,
        }
    }

    pub fn num_actions(mut self, num_actions: usize) -> Self {
        self.num_actions = num_actions;
        self
    }

    pub fn rule(mut self, rule: UpdateRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn step_size(mut self, step_size: StepSize) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn adjacency(mut self, adjacency: bool) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(self) -> Result<Agent> {
        if self.num_actions == 0 {
            return Err(BeamError::InvalidParameter {
                name: "num_actions".to_string(),
                reason: "Action space must not be empty".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(BeamError::InvalidParameter {
                name: "epsilon".to_string(),
                reason: "Must lie in [0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(BeamError::InvalidParameter {
                name: "gamma".to_string(),
                reason: "Must lie in [0, 1]".to_string(),
            });
        }
        self.step_size.validate()?;

        Ok(Agent::new(
            self.num_actions,
            self.rule,
            self.epsilon,
            self.gamma,
            self.step_size,
            self.adjacency,
            self.seed,
        ))
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
