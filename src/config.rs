//! # Experiment Configuration
//!
//! One immutable [`ExperimentConfig`] is built per run (usually from a JSON
//! scenario file) and handed to the orchestrator, which derives the agent,
//! state encoder and environment settings from it.
//!
//! ```rust
//! use beamtrack::config::ExperimentConfig;
//!
//! let config = ExperimentConfig::from_json_str(r#"{ "agent": { "method": "SARSA" } }"#).unwrap();
//! assert_eq!(config.array.rx_beams, 8);
//! assert!(config.validate().is_ok());
//! ```

use crate::agent::{StepSize, UpdateRule};
use crate::environment::TransmitBeam;
use crate::error::{BeamError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SPEED_OF_LIGHT: f64 = 3e8;

/// Antenna arrays, codebooks and link budget
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayConfig {
    pub tx_antennas: usize,
    pub rx_antennas: usize,
    pub tx_beams: usize,
    pub rx_beams: usize,
    /// Carrier frequency in Hz
    pub carrier_frequency: f64,
    /// Linear transmit power
    pub tx_power: f64,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        ArrayConfig {
            tx_antennas: 4,
            rx_antennas: 4,
            tx_beams: 8,
            rx_beams: 8,
            carrier_frequency: 28e9,
            tx_power: 10000.0,
        }
    }
}

impl ArrayConfig {
    pub fn wavelength(&self) -> f64 {
        SPEED_OF_LIGHT / self.carrier_frequency
    }
}

/// Which features make up the state key
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Number of past receive beams in the key
    pub n_actions: usize,
    /// Number of past orientation buckets in the key (0 disables orientation)
    pub n_ori: usize,
    /// Sectors used to bucket the receiver yaw
    pub orientation_buckets: usize,
    /// Distance rings within the communication radius
    pub distance_resolution: Option<usize>,
    /// Polar-angle sectors around the base station
    pub location_resolution: Option<usize>,
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig {
            n_actions: 3,
            n_ori: 1,
            orientation_buckets: 8,
            distance_resolution: None,
            location_resolution: None,
        }
    }
}

/// Learning rule and exploration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// "simple", "SARSA" or "Q-LEARNING"; unknown names fall back to Q-learning
    pub method: String,
    pub epsilon: f64,
    pub gamma: f64,
    pub step_size: StepSize,
    /// Restrict each move to the neighbouring beams
    pub adjacency: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            method: "Q-LEARNING".to_string(),
            epsilon: 0.1,
            gamma: 0.7,
            step_size: StepSize::Constant { alpha: 0.1 },
            adjacency: false,
        }
    }
}

impl AgentConfig {
    pub fn update_rule(&self) -> UpdateRule {
        UpdateRule::from_name(&self.method)
    }
}

/// Repetitions and chunk sampling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub repetitions: usize,
    /// Timesteps per chunk
    pub chunk_size: usize,
    pub seed: u64,
    pub transmit_beam: TransmitBeam,
    /// Run repetitions on the rayon thread pool
    pub parallel: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            repetitions: 5,
            chunk_size: 10000,
            seed: 0,
            transmit_beam: TransmitBeam::Optimal,
            parallel: false,
        }
    }
}

/// Parameters forwarded to the mobility and channel simulators
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub num_trajectories: usize,
    pub trajectory_length: usize,
    /// Communication radius in metres
    pub comm_radius: f64,
    /// Step length bounds in metres, `[min, max]`
    pub step_size: [f64; 2],
    pub turn_probability: f64,
    pub scenarios: Vec<String>,
    pub cache_path: Option<PathBuf>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            num_trajectories: 5,
            trajectory_length: 20000,
            comm_radius: 200.0,
            step_size: [0.5, 1.0],
            turn_probability: 0.1,
            scenarios: vec!["3GPP_38.901_UMi_LOS".to_string()],
            cache_path: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub array: ArrayConfig,
    pub state: StateConfig,
    pub agent: AgentConfig,
    pub training: TrainingConfig,
    pub scenario: ScenarioConfig,
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    pub fn wavelength(&self) -> f64 {
        self.array.wavelength()
    }

    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("array.tx_antennas", self.array.tx_antennas),
            ("array.rx_antennas", self.array.rx_antennas),
            ("array.tx_beams", self.array.tx_beams),
            ("array.rx_beams", self.array.rx_beams),
            ("state.n_actions", self.state.n_actions),
            ("training.chunk_size", self.training.chunk_size),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(BeamError::invalid_parameter(name, "must be greater than zero"));
            }
        }
        if self.state.n_ori > 0 && self.state.orientation_buckets == 0 {
            return Err(BeamError::invalid_parameter(
                "state.orientation_buckets",
                "must be greater than zero when orientation is enabled",
            ));
        }
        if self.state.distance_resolution == Some(0) || self.state.location_resolution == Some(0) {
            return Err(BeamError::invalid_parameter("state", "resolutions must be greater than zero"));
        }
        if !(self.array.carrier_frequency > 0.0) {
            return Err(BeamError::invalid_parameter("array.carrier_frequency", "must be positive"));
        }
        if self.array.tx_power < 0.0 {
            return Err(BeamError::invalid_parameter("array.tx_power", "must be non-negative"));
        }
        if !(0.0..=1.0).contains(&self.agent.epsilon) {
            return Err(BeamError::invalid_parameter("agent.epsilon", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.agent.gamma) {
            return Err(BeamError::invalid_parameter("agent.gamma", "must lie in [0, 1]"));
        }
        self.agent.step_size.validate()?;
        if let TransmitBeam::Fixed(beam) = self.training.transmit_beam {
            if beam >= self.array.tx_beams {
                return Err(BeamError::InvalidAction {
                    action: beam,
                    max_actions: self.array.tx_beams,
                });
            }
        }
        if !(self.scenario.comm_radius > 0.0) {
            return Err(BeamError::invalid_parameter("scenario.comm_radius", "must be positive"));
        }
        let [min_step, max_step] = self.scenario.step_size;
        if !(min_step > 0.0 && min_step <= max_step) {
            return Err(BeamError::invalid_parameter(
                "scenario.step_size",
                "expected 0 < min <= max",
            ));
        }
        Ok(())
    }
}
