//! # DFT Beamforming Codebooks
//!
//! A codebook is a `B × A` matrix of unit-norm analog beamforming vectors,
//! one row per beam. Row `p` of a DFT codebook is
//!
//! ```text
//! w_p[k] = (1/√A) · exp(−jπ · k · (2p − B) / B),   k = 0..A
//! ```
//!
//! which steers the array towards `cos θ = (2p − B)/B`, covering the field of
//! view in `B` equal steps of `cos θ`.
//!
//! ## Example
//!
//! ```rust
//! use beamtrack::codebook::Codebook;
//!
//! let codebook = Codebook::dft(8, 4);
//! assert_eq!(codebook.num_beams(), 8);
//! assert_eq!(codebook.num_antennas(), 4);
//! ```

use crate::antenna::{steering_vectors, LinkSide};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Fixed set of beamforming weight vectors
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Codebook {
    weights: Array2<Complex64>,
}

impl Codebook {
    /// Build a DFT codebook with `num_beams` beams for `num_antennas` elements.
    pub fn dft(num_beams: usize, num_antennas: usize) -> Self {
        let scale = 1.0 / (num_antennas as f64).sqrt();
        let b = num_beams as f64;

        let weights = Array2::from_shape_fn((num_beams, num_antennas), |(p, k)| {
            let phase = -PI * k as f64 * (2.0 * p as f64 - b) / b;
            Complex64::from_polar(scale, phase)
        });

        Codebook { weights }
    }

    pub fn num_beams(&self) -> usize {
        self.weights.nrows()
    }

    pub fn num_antennas(&self) -> usize {
        self.weights.ncols()
    }

    /// Weight vector for one beam
    pub fn beam(&self, index: usize) -> ArrayView1<'_, Complex64> {
        self.weights.row(index)
    }

    pub fn weights(&self) -> ArrayView2<'_, Complex64> {
        self.weights.view()
    }

    /// Spatial frequency `cos θ` the beam points at, in `[-1, 1)`.
    fn spatial_frequency(&self, index: usize, side: LinkSide) -> f64 {
        let b = self.num_beams() as f64;
        let u = (2.0 * index as f64 - b) / b;
        match side {
            LinkSide::Receive => u,
            LinkSide::Transmit => -u,
        }
    }

    /// Physical direction of a beam in radians, in `[0, π]`.
    ///
    /// Receive beams peak where `cos θ = (2q − B)/B`; transmit beams enter
    /// the channel unconjugated, so they peak at the mirrored angle.
    pub fn direction(&self, index: usize, side: LinkSide) -> f64 {
        self.spatial_frequency(index, side).clamp(-1.0, 1.0).acos()
    }

    /// Beam whose main lobe is closest to `angle` (radians, local frame).
    ///
    /// Distance is measured in `cos θ` on a circle of period 2, since DFT
    /// beams alias at endfire.
    pub fn angle_to_beam(&self, angle: f64, side: LinkSide) -> usize {
        let u = angle.cos();
        (0..self.num_beams())
            .map(|index| {
                let diff = (u - self.spatial_frequency(index, side)).rem_euclid(2.0);
                (index, diff.min(2.0 - diff))
            })
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(index, _)| index)
            .unwrap_or(0)
    }

    /// Beam gain `|wᴴ a(θ)|²` of every beam over `resolution` angles in `[−π, π)`.
    ///
    /// Returns the sampled angles and a `(num_beams, resolution)` pattern.
    pub fn beam_pattern(
        &self,
        positions: ArrayView2<f64>,
        wavelength: f64,
        side: LinkSide,
        resolution: usize,
    ) -> (Array1<f64>, Array2<f64>) {
        let angles: Array1<f64> = (0..resolution)
            .map(|i| -PI + 2.0 * PI * i as f64 / resolution as f64)
            .collect();
        let response = steering_vectors(side, angles.as_slice().unwrap_or(&[]), positions, wavelength);

        let pattern = Array2::from_shape_fn((self.num_beams(), resolution), |(beam, i)| {
            self.weights
                .row(beam)
                .iter()
                .zip(response.row(i).iter())
                .map(|(w, a)| w.conj() * a)
                .sum::<Complex64>()
                .norm_sqr()
        });

        (angles, pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antenna::UniformLinearArray;

    #[test]
    fn test_dft_rows_are_unit_norm() {
        let codebook = Codebook::dft(8, 4);
        for row in codebook.weights().rows() {
            let norm: f64 = row.iter().map(|w| w.norm_sqr()).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_first_element_is_real() {
        let codebook = Codebook::dft(4, 4);
        for p in 0..4 {
            let w0 = codebook.beam(p)[0];
            assert!((w0 - Complex64::new(0.5, 0.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn test_directions_cover_field_of_view() {
        let codebook = Codebook::dft(8, 4);
        let rx: Vec<f64> = (0..8).map(|q| codebook.direction(q, LinkSide::Receive)).collect();
        assert!((rx[0] - PI).abs() < 1e-12);
        assert!((rx[4] - PI / 2.0).abs() < 1e-12);
        // Receive directions decrease monotonically with beam index
        assert!(rx.windows(2).all(|w| w[1] < w[0]));
        let tx4 = codebook.direction(4, LinkSide::Transmit);
        assert!((tx4 - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_angle_to_beam_round_trip() {
        let codebook = Codebook::dft(8, 8);
        for q in 1..8 {
            let angle = codebook.direction(q, LinkSide::Receive);
            assert_eq!(codebook.angle_to_beam(angle, LinkSide::Receive), q);
            let angle = codebook.direction(q, LinkSide::Transmit);
            assert_eq!(codebook.angle_to_beam(angle, LinkSide::Transmit), q);
        }
    }

    #[test]
    fn test_endfire_aliases_to_beam_zero() {
        let codebook = Codebook::dft(2, 2);
        assert_eq!(codebook.angle_to_beam(0.0, LinkSide::Receive), 0);
        assert_eq!(codebook.angle_to_beam(PI, LinkSide::Receive), 0);
    }

    #[test]
    fn test_beam_pattern_peaks_at_direction() {
        let wavelength = 3e8 / 28e9;
        let ula = UniformLinearArray::half_wavelength(8, wavelength);
        let codebook = Codebook::dft(8, 8);
        let (angles, pattern) = codebook.beam_pattern(ula.positions.view(), wavelength, LinkSide::Receive, 720);
        assert_eq!(pattern.shape(), &[8, 720]);

        let beam = 5;
        let (peak, _) = pattern
            .row(beam)
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, &g)| if g > best.1 { (i, g) } else { best });
        let expected = codebook.direction(beam, LinkSide::Receive);
        assert!((angles[peak].abs() - expected).abs() < 0.02);
        // Peak gain of a unit-norm beam against an N-element response is N
        assert!((pattern[[beam, peak]] - 8.0).abs() < 0.1);
    }
}
