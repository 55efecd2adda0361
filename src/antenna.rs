//! # Antenna Arrays and Steering Vectors
//!
//! Element geometry for uniform linear arrays and the per-path steering
//! vectors used to synthesize the channel matrix.
//!
//! For an element at position `r = [x, y]` and a path at angle `θ`, the
//! steering phase is `exp(j · dir · 2π/λ · (x cos θ + y sin θ))`, where `dir`
//! is `+1` on the transmit side and `-1` on the receive side. No `1/√N`
//! normalization is applied here; that lives in the codebook.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Which end of the link a steering vector describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkSide {
    /// Angle of departure, phase sign `+1`
    Transmit,
    /// Angle of arrival, phase sign `-1`
    Receive,
}

impl LinkSide {
    pub fn sign(self) -> f64 {
        match self {
            LinkSide::Transmit => 1.0,
            LinkSide::Receive => -1.0,
        }
    }
}

/// A uniform linear array laid out along the x axis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UniformLinearArray {
    /// Element positions in metres, shape `(2, num_elements)`
    pub positions: Array2<f64>,
}

impl UniformLinearArray {
    /// Elements spaced `λ/2` apart starting at the origin.
    pub fn half_wavelength(num_elements: usize, wavelength: f64) -> Self {
        let mut positions = Array2::zeros((2, num_elements));
        for k in 0..num_elements {
            positions[[0, k]] = k as f64 * wavelength / 2.0;
        }
        UniformLinearArray { positions }
    }

    pub fn num_elements(&self) -> usize {
        self.positions.ncols()
    }

    /// Steering vectors for this array, see [`steering_vectors`].
    pub fn steering_vectors(&self, side: LinkSide, angles: &[f64], wavelength: f64) -> Array2<Complex64> {
        steering_vectors(side, angles, self.positions.view(), wavelength)
    }
}

/// Compute one steering vector per path.
///
/// Returns an array of shape `(angles.len(), num_elements)`; row `i` is the
/// array response to path `i`. An empty `angles` slice yields a `0 × N` array.
pub fn steering_vectors(
    side: LinkSide,
    angles: &[f64],
    positions: ArrayView2<f64>,
    wavelength: f64,
) -> Array2<Complex64> {
    let num_elements = positions.ncols();
    let k = side.sign() * 2.0 * PI / wavelength;

    Array2::from_shape_fn((angles.len(), num_elements), |(path, element)| {
        let theta = angles[path];
        let projection = positions[[0, element]] * theta.cos() + positions[[1, element]] * theta.sin();
        Complex64::from_polar(1.0, k * projection)
    })
}
