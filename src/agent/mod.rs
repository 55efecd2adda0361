//! # Tabular Beam-Tracking Agents
//!
//! The agent picks a receive-beam index every timestep and learns action
//! values per [`StateKey`](crate::state::StateKey) from scalar power rewards.
//!
//! ## Core Concepts
//!
//! - **Q-table**: sparse map from state key to a row of action values,
//!   zero until first written
//! - **Exploration**: epsilon-greedy, either over the whole codebook or over
//!   the beams adjacent to the previous one
//! - **Update rules**: `simple` (per-state bandit), SARSA and Q-learning, picked
//!   once at construction through [`UpdateRule`]
//! - **Step size**: constant or decaying with the visit count of each pair
//!
//! Terminal transitions (last step of a chunk) never bootstrap from the next
//! state.

mod q_table;
mod tabular;

pub use q_table::{QTable, StateValues, StepSize};
pub use tabular::{Agent, AgentBuilder, Transition, UpdateRule};
