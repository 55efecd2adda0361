//! # beamtrack - Reinforcement-Learning Beam Tracking for mmWave Links
//!
//! beamtrack trains tabular agents to track the best receive beam of a
//! millimeter-wave MIMO link while a terminal moves along a simulated
//! trajectory. Rewards come from a physical channel model: array steering
//! vectors, DFT codebooks and per-path channel coefficients combine into the
//! received power of every beam pair.
//!
//! ## Key Features
//!
//! - **Channel reward model**: multipath channel synthesis and the full
//!   beam-pair power surface per timestep
//! - **Tabular RL**: sparse Q-table with bandit, SARSA and Q-learning updates
//! - **Adjacency policy**: beam moves limited to one codebook step per timestep
//! - **Composite states**: recent beams plus orientation, distance and
//!   polar-angle buckets
//! - **Reproducible runs**: every repetition is seeded, serial or parallel
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beamtrack::config::ExperimentConfig;
//! use beamtrack::trace::{LineOfSightSource, TraceCache};
//! use beamtrack::trainer::Trainer;
//!
//! let config = ExperimentConfig::default();
//! let mut source = LineOfSightSource::new(config.training.seed);
//! let trace = TraceCache::new("data.bin")
//!     .load_or_generate(&config.scenario, config.array.carrier_frequency, &mut source)
//!     .unwrap();
//!
//! let trainer = Trainer::new(config, trace).unwrap();
//! let log = trainer.run().unwrap();
//! println!("misalignment (3 dB): {:.3}", log.mean_misalignment(3.0));
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - Q-table, policies and update rules
//! - [`antenna`] - Array geometry and steering vectors
//! - [`codebook`] - DFT beamforming codebooks
//! - [`config`] - Experiment configuration
//! - [`discretize`] - Angle helpers and side-information buckets
//! - [`environment`] - Channel synthesis and beam-pair rewards
//! - [`error`] - Error types and result handling
//! - [`metrics`] - Reward logs, misalignment and accuracy
//! - [`state`] - State keys and the rolling state encoder
//! - [`trace`] - Channel traces, trace sources and the on-disk cache
//! - [`trainer`] - Repetition/chunk orchestration

pub mod agent;
pub mod antenna;
pub mod codebook;
pub mod config;
pub mod discretize;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod state;
pub mod trace;
pub mod trainer;

#[cfg(test)]
mod tests;
