//! # Training Orchestration
//!
//! A run is a number of independent repetitions. Each repetition samples a
//! random window of `chunk_size` timesteps from one trajectory, builds a fresh
//! agent and state encoder, and walks the window once in order with the last
//! step flagged terminal. Repetitions only share the immutable link setup and
//! channel trace, so they can run on the rayon pool.
//!
//! Repetition `m` draws all of its randomness from a generator seeded with
//! `seed + m`, which makes serial and parallel runs produce the same logs.

use crate::agent::{Agent, Transition};
use crate::antenna::LinkSide;
use crate::config::ExperimentConfig;
use crate::discretize::{local_angle, los_angle};
use crate::environment::{Environment, LinkSetup};
use crate::error::{BeamError, Result};
use crate::metrics::{EpisodeLog, TrainingLog};
use crate::state::{SideInfo, StateEncoder};
use crate::trace::{ChannelTrace, TrajectoryTrace};
use ndarray::parallel::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Trainer {
    config: ExperimentConfig,
    setup: Arc<LinkSetup>,
    trace: ChannelTrace,
    /// Trajectories long enough to hold a chunk
    eligible: Vec<usize>,
}

impl Trainer {
    pub fn new(config: ExperimentConfig, trace: ChannelTrace) -> Result<Self> {
        config.validate()?;
        trace.validate()?;

        let chunk_size = config.training.chunk_size;
        let eligible: Vec<usize> = trace
            .trajectories
            .iter()
            .enumerate()
            .filter(|(_, trajectory)| trajectory.len() >= chunk_size)
            .map(|(index, _)| index)
            .collect();
        if eligible.is_empty() {
            return Err(BeamError::invalid_parameter(
                "training.chunk_size".to_string(),
                format!("{} exceeds every trajectory length", chunk_size),
            ));
        }

        let setup = Arc::new(LinkSetup::from_config(&config.array));
        Ok(Trainer {
            config,
            setup,
            trace,
            eligible,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn setup(&self) -> &LinkSetup {
        &self.setup
    }

    pub fn trace(&self) -> &ChannelTrace {
        &self.trace
    }

    /// Run every repetition, in parallel if the configuration asks for it.
    pub fn run(&self) -> Result<TrainingLog> {
        let training = &self.config.training;
        let rule = self.config.agent.update_rule();
        info!(
            method = rule.name(),
            repetitions = training.repetitions,
            chunk_size = training.chunk_size,
            adjacency = self.config.agent.adjacency,
            parallel = training.parallel,
            "starting training run"
        );

        let episodes = if training.parallel {
            self.run_parallel()?
        } else {
            self.run_serial()?
        };

        let log = TrainingLog {
            method: rule.name().to_string(),
            episodes,
        };
        info!(
            repetitions = log.repetitions(),
            misalignment_3db = log.mean_misalignment(3.0),
            "training run finished"
        );
        Ok(log)
    }

    fn run_serial(&self) -> Result<Vec<EpisodeLog>> {
        let mut env = Environment::new(self.setup.clone(), Vec::new(), self.config.training.transmit_beam)?;
        (0..self.config.training.repetitions)
            .map(|repetition| self.run_repetition(&mut env, repetition))
            .collect()
    }

    fn run_parallel(&self) -> Result<Vec<EpisodeLog>> {
        (0..self.config.training.repetitions)
            .into_par_iter()
            .map(|repetition| {
                let mut env =
                    Environment::new(self.setup.clone(), Vec::new(), self.config.training.transmit_beam)?;
                self.run_repetition(&mut env, repetition)
            })
            .collect()
    }

    /// Pick a trajectory and a window offset for one repetition.
    pub fn sample_chunk<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, usize) {
        let trajectory = self.eligible[rng.gen_range(0..self.eligible.len())];
        let slack = self.trace.trajectories[trajectory].len() - self.config.training.chunk_size;
        let offset = if slack == 0 { 0 } else { rng.gen_range(0..=slack) };
        (trajectory, offset)
    }

    fn run_repetition(&self, env: &mut Environment, repetition: usize) -> Result<EpisodeLog> {
        let mut rng = StdRng::seed_from_u64(self.config.training.seed.wrapping_add(repetition as u64));
        let (trajectory, offset) = self.sample_chunk(&mut rng);
        let log = self.run_chunk(env, trajectory, offset, &mut rng)?;
        debug!(
            repetition,
            trajectory,
            offset,
            total_reward = log.total_reward(),
            "repetition finished"
        );
        Ok(log)
    }

    /// Train a fresh agent on `chunk_size` steps of `trajectory` from `offset`.
    pub fn run_chunk<R: Rng + ?Sized>(
        &self,
        env: &mut Environment,
        trajectory: usize,
        offset: usize,
        rng: &mut R,
    ) -> Result<EpisodeLog> {
        let chunk_size = self.config.training.chunk_size;
        let window = &self.trace.trajectories[trajectory];
        env.update_data(&window.snapshots[offset..offset + chunk_size]);

        let num_actions = env.num_actions();
        let side = |n: usize| self.side_info(window, offset + n);

        let mut encoder = StateEncoder::new(&self.config.state, num_actions, &side(0), rng);
        let mut agent = Agent::from_config(&self.config.agent, num_actions, rng.gen())?;
        let mut log = EpisodeLog::new(trajectory, offset, chunk_size);

        let mut previous = None;
        let mut state = encoder.current().clone();
        for n in 0..chunk_size {
            let action = agent.select_action(&state, previous);
            let sample = env.take_action(n, action);

            let end = n + 1 == chunk_size;
            let next_side = side((n + 1).min(chunk_size - 1));
            let next_state = encoder.get_nextstate(action, &next_side);
            agent.learn(&Transition {
                state: &state,
                action,
                reward: sample.reward,
                next_state: &next_state,
                end,
            });

            encoder.update_state(action, &next_side);
            log.record(action, &sample);
            previous = Some(action);
            state = next_state;
        }

        debug!(states = agent.q_table.len(), "chunk finished");
        Ok(log)
    }

    fn side_info(&self, trajectory: &TrajectoryTrace, timestep: usize) -> SideInfo {
        SideInfo::observe(
            &self.config.state,
            self.config.scenario.comm_radius,
            trajectory.positions[timestep],
            trajectory.snapshots[timestep].orientation,
        )
    }

    /// Line-of-sight receive beam at every logged step, for accuracy metrics.
    pub fn reference_beams(&self, log: &TrainingLog) -> Vec<Vec<usize>> {
        log.episodes
            .iter()
            .map(|episode| {
                let trajectory = &self.trace.trajectories[episode.trajectory];
                (episode.offset..episode.offset + episode.len())
                    .map(|t| {
                        let yaw = trajectory.snapshots[t].orientation;
                        let angle = local_angle(los_angle(trajectory.positions[t]), yaw);
                        self.setup.rx_codebook.angle_to_beam(angle, LinkSide::Receive)
                    })
                    .collect()
            })
            .collect()
    }
}
