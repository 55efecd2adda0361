//! # Channel Traces
//!
//! Per-timestep multipath parameters produced by the external channel
//! simulator, indexed `[trajectory][timestep][path]`, and the on-disk cache
//! that avoids re-running the simulator.
//!
//! The simulator itself sits behind [`TraceSource`]. [`LineOfSightSource`] is
//! a minimal single-path stand-in driven by a [`RandomWalk`] mobility model,
//! enough for demos and tests; it does not model reflections or blockage.

use crate::config::ScenarioConfig;
use crate::discretize::los_angle;
use crate::error::{BeamError, Result};
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Multipath parameters at one timestep
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Angle of arrival per path, global frame (radians)
    pub aoa: Vec<f64>,
    /// Angle of departure per path (radians)
    pub aod: Vec<f64>,
    /// Complex path coefficient per path
    pub coefficients: Vec<Complex64>,
    /// Receiver yaw (radians)
    pub orientation: f64,
}

impl ChannelSnapshot {
    pub fn num_paths(&self) -> usize {
        self.coefficients.len()
    }
}

/// One simulated trajectory: positions and the channel seen at each of them
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryTrace {
    pub positions: Vec<[f64; 2]>,
    pub snapshots: Vec<ChannelSnapshot>,
}

impl TrajectoryTrace {
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// All trajectories of a run
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelTrace {
    pub trajectories: Vec<TrajectoryTrace>,
}

impl ChannelTrace {
    /// Check the trace is usable for training.
    pub fn validate(&self) -> Result<()> {
        if self.trajectories.is_empty() {
            return Err(BeamError::EmptyTrace("no trajectories".to_string()));
        }
        for (index, trajectory) in self.trajectories.iter().enumerate() {
            if trajectory.is_empty() {
                return Err(BeamError::EmptyTrace(format!("trajectory {} has no timesteps", index)));
            }
            if trajectory.positions.len() != trajectory.snapshots.len() {
                return Err(BeamError::dimension_mismatch(
                    format!("{} positions", trajectory.snapshots.len()),
                    format!("{} positions", trajectory.positions.len()),
                ));
            }
            for snapshot in &trajectory.snapshots {
                let paths = snapshot.num_paths();
                if snapshot.aoa.len() != paths || snapshot.aod.len() != paths {
                    return Err(BeamError::dimension_mismatch(
                        format!("{} angles per timestep", paths),
                        format!("{} AoA / {} AoD", snapshot.aoa.len(), snapshot.aod.len()),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Length of the shortest trajectory
    pub fn min_len(&self) -> usize {
        self.trajectories.iter().map(TrajectoryTrace::len).min().unwrap_or(0)
    }
}

/// External producer of channel traces (ray tracer, measurement replay, ...)
pub trait TraceSource {
    fn generate(&mut self, scenario: &ScenarioConfig, carrier_frequency: f64) -> Result<ChannelTrace>;
}

/// Bincode file cache in front of a [`TraceSource`]
#[derive(Clone, Debug)]
pub struct TraceCache {
    path: PathBuf,
}

impl TraceCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        TraceCache {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<ChannelTrace> {
        let data = std::fs::read(&self.path)?;
        let trace: ChannelTrace = bincode::deserialize(&data)?;
        trace.validate()?;
        Ok(trace)
    }

    pub fn store(&self, trace: &ChannelTrace) -> Result<()> {
        let serialized = bincode::serialize(trace)?;
        std::fs::write(&self.path, serialized)?;
        Ok(())
    }

    /// Load the cached trace, regenerating it through `source` when the cache
    /// is missing or unreadable.
    pub fn load_or_generate<S: TraceSource + ?Sized>(
        &self,
        scenario: &ScenarioConfig,
        carrier_frequency: f64,
        source: &mut S,
    ) -> Result<ChannelTrace> {
        match self.load() {
            Ok(trace) => {
                info!(path = %self.path.display(), trajectories = trace.trajectories.len(), "loaded cached channel trace");
                return Ok(trace);
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "channel trace cache unusable, regenerating");
            }
        }

        let trace = source
            .generate(scenario, carrier_frequency)
            .map_err(|err| BeamError::TraceUnavailable(err.to_string()))?;
        trace.validate()?;

        if let Err(err) = self.store(&trace) {
            warn!(path = %self.path.display(), error = %err, "failed to write channel trace cache");
        }
        Ok(trace)
    }
}

/// Random-walk mobility inside the communication radius
#[derive(Clone, Debug)]
pub struct RandomWalk {
    pub radius: f64,
    pub step_size: [f64; 2],
    pub turn_probability: f64,
}

impl RandomWalk {
    pub fn from_scenario(scenario: &ScenarioConfig) -> Self {
        RandomWalk {
            radius: scenario.comm_radius,
            step_size: scenario.step_size,
            turn_probability: scenario.turn_probability,
        }
    }

    /// Generate `steps` positions and the heading at each of them.
    pub fn run<R: Rng>(&self, steps: usize, rng: &mut R) -> (Vec<[f64; 2]>, Vec<f64>) {
        let step_dist = Uniform::new_inclusive(self.step_size[0], self.step_size[1]);
        let angle_dist = Uniform::new(-PI, PI);

        // Start uniformly inside the disc
        let r = self.radius * rng.gen::<f64>().sqrt();
        let phi = angle_dist.sample(rng);
        let mut position = [r * phi.cos(), r * phi.sin()];
        let mut heading = angle_dist.sample(rng);

        let mut positions = Vec::with_capacity(steps);
        let mut headings = Vec::with_capacity(steps);
        for _ in 0..steps {
            positions.push(position);
            headings.push(heading);

            if rng.gen::<f64>() < self.turn_probability {
                heading = angle_dist.sample(rng);
            }
            let step = step_dist.sample(rng);
            let mut next = [position[0] + step * heading.cos(), position[1] + step * heading.sin()];
            if next[0].hypot(next[1]) > self.radius {
                heading = los_angle(position);
                next = [position[0] + step * heading.cos(), position[1] + step * heading.sin()];
            }
            position = next;
        }
        (positions, headings)
    }
}

/// Single line-of-sight path with free-space amplitude
#[derive(Clone, Debug)]
pub struct LineOfSightSource {
    rng: StdRng,
}

impl LineOfSightSource {
    pub fn new(seed: u64) -> Self {
        LineOfSightSource {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Channel snapshot for a receiver at `position` with yaw `heading`.
    pub fn snapshot(position: [f64; 2], heading: f64, wavelength: f64) -> ChannelSnapshot {
        let distance = position[0].hypot(position[1]).max(1.0);
        let amplitude = wavelength / (4.0 * PI * distance);
        let phase = -2.0 * PI * distance / wavelength;
        ChannelSnapshot {
            aoa: vec![los_angle(position)],
            aod: vec![position[1].atan2(position[0])],
            coefficients: vec![Complex64::from_polar(amplitude, phase)],
            orientation: heading,
        }
    }
}

impl TraceSource for LineOfSightSource {
    fn generate(&mut self, scenario: &ScenarioConfig, carrier_frequency: f64) -> Result<ChannelTrace> {
        if scenario.num_trajectories == 0 || scenario.trajectory_length == 0 {
            return Err(BeamError::invalid_parameter(
                "scenario",
                "line-of-sight source needs at least one trajectory and one timestep",
            ));
        }
        let wavelength = crate::config::SPEED_OF_LIGHT / carrier_frequency;
        let walk = RandomWalk::from_scenario(scenario);

        let trajectories = (0..scenario.num_trajectories)
            .map(|_| {
                let (positions, headings) = walk.run(scenario.trajectory_length, &mut self.rng);
                let snapshots = positions
                    .iter()
                    .zip(headings.iter())
                    .map(|(&position, &heading)| Self::snapshot(position, heading, wavelength))
                    .collect();
                TrajectoryTrace { positions, snapshots }
            })
            .collect();

        Ok(ChannelTrace { trajectories })
    }
}
