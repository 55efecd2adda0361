//! # Channel Reward Model
//!
//! Turns one timestep's multipath parameters into the received power of
//! every transmit/receive beam pair and scores the agent's receive beam.
//!
//! For a timestep with paths `i`, gains `β_i`, receive steering vectors
//! `a_r,i` and transmit steering vectors `a_t,i`, the channel is
//!
//! ```text
//! H = √(Nr · Nt) · Σ_i β_i · a_r,i · a_t,iᴴ
//! ```
//!
//! and the power of beam pair `(p, q)` is `P_t · |w_qᴴ H f_p|²`.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use beamtrack::environment::{Environment, LinkSetup, TransmitBeam};
//! use beamtrack::trace::ChannelSnapshot;
//! use num_complex::Complex64;
//!
//! let setup = Arc::new(LinkSetup::new(4, 4, 8, 8, 3e8 / 28e9, 1.0));
//! let snapshot = ChannelSnapshot {
//!     aoa: vec![0.4],
//!     aod: vec![1.2],
//!     coefficients: vec![Complex64::new(1.0, 0.0)],
//!     orientation: 0.0,
//! };
//! let env = Environment::new(setup, vec![snapshot], TransmitBeam::Optimal).unwrap();
//! let sample = env.take_action(0, 3);
//! assert!(sample.min <= sample.reward && sample.reward <= sample.max);
//! ```

use crate::antenna::{LinkSide, UniformLinearArray};
use crate::codebook::Codebook;
use crate::config::ArrayConfig;
use crate::discretize::local_angle;
use crate::error::{BeamError, Result};
use crate::trace::ChannelSnapshot;
use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Transmit beam paired with the agent's receive beam when scoring an action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransmitBeam {
    /// Always the same reference beam
    Fixed(usize),
    /// Transmit index of the best beam pair at that timestep
    Optimal,
}

impl Default for TransmitBeam {
    fn default() -> Self {
        TransmitBeam::Optimal
    }
}

/// Geometry, codebooks and link budget shared by every chunk of a run
#[derive(Clone, Debug)]
pub struct LinkSetup {
    pub tx_array: UniformLinearArray,
    pub rx_array: UniformLinearArray,
    pub tx_codebook: Codebook,
    pub rx_codebook: Codebook,
    pub wavelength: f64,
    pub tx_power: f64,
}

impl LinkSetup {
    /// Half-wavelength ULAs with DFT codebooks on both sides.
    pub fn new(
        tx_antennas: usize,
        rx_antennas: usize,
        tx_beams: usize,
        rx_beams: usize,
        wavelength: f64,
        tx_power: f64,
    ) -> Self {
        LinkSetup {
            tx_array: UniformLinearArray::half_wavelength(tx_antennas, wavelength),
            rx_array: UniformLinearArray::half_wavelength(rx_antennas, wavelength),
            tx_codebook: Codebook::dft(tx_beams, tx_antennas),
            rx_codebook: Codebook::dft(rx_beams, rx_antennas),
            wavelength,
            tx_power,
        }
    }

    pub fn from_config(config: &ArrayConfig) -> Self {
        Self::new(
            config.tx_antennas,
            config.rx_antennas,
            config.tx_beams,
            config.rx_beams,
            config.wavelength(),
            config.tx_power,
        )
    }

    fn check(&self) -> Result<()> {
        if self.tx_codebook.num_antennas() != self.tx_array.num_elements() {
            return Err(BeamError::dimension_mismatch(
                format!("{} transmit codebook columns", self.tx_array.num_elements()),
                format!("{}", self.tx_codebook.num_antennas()),
            ));
        }
        if self.rx_codebook.num_antennas() != self.rx_array.num_elements() {
            return Err(BeamError::dimension_mismatch(
                format!("{} receive codebook columns", self.rx_array.num_elements()),
                format!("{}", self.rx_codebook.num_antennas()),
            ));
        }
        Ok(())
    }
}

/// Outcome of one action: the achieved power and the extrema of the sweep
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardSample {
    pub reward: f64,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

/// Reward model bound to one chunk of channel snapshots
#[derive(Clone, Debug)]
pub struct Environment {
    setup: Arc<LinkSetup>,
    snapshots: Vec<ChannelSnapshot>,
    transmit_beam: TransmitBeam,
}

impl Environment {
    pub fn new(
        setup: Arc<LinkSetup>,
        snapshots: Vec<ChannelSnapshot>,
        transmit_beam: TransmitBeam,
    ) -> Result<Self> {
        setup.check()?;
        if let TransmitBeam::Fixed(beam) = transmit_beam {
            if beam >= setup.tx_codebook.num_beams() {
                return Err(BeamError::InvalidAction {
                    action: beam,
                    max_actions: setup.tx_codebook.num_beams(),
                });
            }
        }
        Ok(Environment {
            setup,
            snapshots,
            transmit_beam,
        })
    }

    /// Rebind the reward model to a new chunk of snapshots.
    pub fn update_data(&mut self, snapshots: &[ChannelSnapshot]) {
        self.snapshots.clear();
        self.snapshots.extend_from_slice(snapshots);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn setup(&self) -> &LinkSetup {
        &self.setup
    }

    pub fn num_actions(&self) -> usize {
        self.setup.rx_codebook.num_beams()
    }

    /// Instantaneous `Nr × Nt` channel matrix at `timestep`.
    ///
    /// Panics if `timestep` is outside the bound chunk.
    pub fn channel_matrix(&self, timestep: usize) -> Array2<Complex64> {
        let snapshot = &self.snapshots[timestep];
        let setup = &self.setup;
        let nr = setup.rx_array.num_elements();
        let nt = setup.tx_array.num_elements();

        let aoa_local: Vec<f64> = snapshot
            .aoa
            .iter()
            .map(|&angle| local_angle(angle, snapshot.orientation))
            .collect();
        let alpha_rx = setup.rx_array.steering_vectors(LinkSide::Receive, &aoa_local, setup.wavelength);
        let alpha_tx = setup.tx_array.steering_vectors(LinkSide::Transmit, &snapshot.aod, setup.wavelength);

        let mut h = Array2::<Complex64>::zeros((nr, nt));
        for (i, beta) in snapshot.coefficients.iter().enumerate() {
            let a_r = alpha_rx.row(i);
            let a_t = alpha_tx.row(i);
            for r in 0..nr {
                let scaled = beta * a_r[r];
                for t in 0..nt {
                    h[[r, t]] += scaled * a_t[t].conj();
                }
            }
        }

        let scale = ((nr * nt) as f64).sqrt();
        h.mapv_inplace(|x| x * scale);
        h
    }

    /// Received power of every beam pair, shape `(tx_beams, rx_beams)`.
    pub fn reward_surface(&self, timestep: usize) -> Array2<f64> {
        let h = self.channel_matrix(timestep);
        let w_conj = self.setup.rx_codebook.weights().mapv(|w| w.conj());
        let f = self.setup.tx_codebook.weights();

        // gains[q, p] = w_qᴴ H f_p
        let gains = w_conj.dot(&h).dot(&f.t());
        let tx_power = self.setup.tx_power;
        gains.t().mapv(|g| tx_power * g.norm_sqr())
    }

    /// Best beam pair `(tx, rx)` at `timestep`; first maximum wins ties.
    pub fn best_beam_pair(&self, timestep: usize) -> (usize, usize) {
        argmax2(&self.reward_surface(timestep))
    }

    /// Physical directions (degrees) of the best transmit and receive beams.
    pub fn beam_directions(&self, timestep: usize) -> (f64, f64) {
        let (p, q) = self.best_beam_pair(timestep);
        (
            self.setup.tx_codebook.direction(p, LinkSide::Transmit).to_degrees(),
            self.setup.rx_codebook.direction(q, LinkSide::Receive).to_degrees(),
        )
    }

    /// Score receive beam `action` at `timestep`.
    ///
    /// Panics if `timestep` is outside the bound chunk or `action` is not a
    /// receive beam index.
    pub fn take_action(&self, timestep: usize, action: usize) -> RewardSample {
        let surface = self.reward_surface(timestep);
        let tx_beam = match self.transmit_beam {
            TransmitBeam::Fixed(beam) => beam,
            TransmitBeam::Optimal => argmax2(&surface).0,
        };

        let max = surface.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = surface.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = surface.mean().unwrap_or(0.0);

        RewardSample {
            reward: surface[[tx_beam, action]],
            max,
            min,
            mean,
        }
    }
}

fn argmax2(surface: &Array2<f64>) -> (usize, usize) {
    let mut best = (0, 0);
    let mut best_value = f64::NEG_INFINITY;
    for ((p, q), &value) in surface.indexed_iter() {
        if value > best_value {
            best_value = value;
            best = (p, q);
        }
    }
    best
}
