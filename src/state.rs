//! # State Encoding
//!
//! The agent's state is a fixed-width key made of the last `n_actions`
//! receive beams, the last `n_ori` orientation buckets, and optional distance
//! and polar-angle buckets. Disabled features stay `None`/empty, so every key
//! produced under one [`StateConfig`] has the same shape.
//!
//! ```rust
//! use beamtrack::config::StateConfig;
//! use beamtrack::state::{SideInfo, StateEncoder};
//!
//! let config = StateConfig { n_actions: 3, n_ori: 0, ..StateConfig::default() };
//! let mut encoder = StateEncoder::with_history(&config, vec![0, 0, 1], &SideInfo::none());
//! for action in [2, 3, 4] {
//!     encoder.update_state(action, &SideInfo::none());
//! }
//! assert_eq!(encoder.current().actions, vec![2, 3, 4]);
//! ```

use crate::config::StateConfig;
use crate::discretize::{discretize_distance, discretize_orientation, discretize_polar};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Hashable composite state
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    /// Most recent receive beams, oldest first
    pub actions: Vec<usize>,
    /// Most recent orientation buckets, oldest first
    pub orientations: Vec<usize>,
    pub distance: Option<usize>,
    pub location: Option<usize>,
}

impl StateKey {
    /// Key with only an action history
    pub fn from_actions(actions: Vec<usize>) -> Self {
        StateKey {
            actions,
            ..StateKey::default()
        }
    }

    /// Most recent action in the history
    pub fn last_action(&self) -> Option<usize> {
        self.actions.last().copied()
    }
}

/// Discretized side information observed at one timestep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideInfo {
    pub orientation: Option<usize>,
    pub distance: Option<usize>,
    pub location: Option<usize>,
}

impl SideInfo {
    pub fn none() -> Self {
        SideInfo::default()
    }

    /// Bucket the receiver's position and yaw for the features `config` enables.
    pub fn observe(config: &StateConfig, comm_radius: f64, position: [f64; 2], yaw: f64) -> Self {
        SideInfo {
            orientation: (config.n_ori > 0)
                .then(|| discretize_orientation(yaw, config.orientation_buckets)),
            distance: config
                .distance_resolution
                .map(|resolution| discretize_distance(position, comm_radius, resolution)),
            location: config
                .location_resolution
                .map(|resolution| discretize_polar(position, resolution)),
        }
    }
}

/// Rolling history of actions and side information
#[derive(Clone, Debug)]
pub struct StateEncoder {
    n_actions: usize,
    n_ori: usize,
    use_distance: bool,
    use_location: bool,
    key: StateKey,
}

impl StateEncoder {
    /// Start a chunk with an action history drawn uniformly from `0..num_actions`.
    pub fn new<R: Rng + ?Sized>(
        config: &StateConfig,
        num_actions: usize,
        initial: &SideInfo,
        rng: &mut R,
    ) -> Self {
        let actions = (0..config.n_actions)
            .map(|_| rng.gen_range(0..num_actions))
            .collect();
        Self::with_history(config, actions, initial)
    }

    /// Start a chunk from an explicit action history.
    ///
    /// Panics if `actions.len()` differs from `config.n_actions`.
    pub fn with_history(config: &StateConfig, actions: Vec<usize>, initial: &SideInfo) -> Self {
        assert_eq!(
            actions.len(),
            config.n_actions,
            "action history must hold exactly n_actions entries"
        );
        let use_distance = config.distance_resolution.is_some();
        let use_location = config.location_resolution.is_some();
        let key = StateKey {
            actions,
            orientations: vec![initial.orientation.unwrap_or(0); config.n_ori],
            distance: use_distance.then(|| initial.distance.unwrap_or(0)),
            location: use_location.then(|| initial.location.unwrap_or(0)),
        };
        StateEncoder {
            n_actions: config.n_actions,
            n_ori: config.n_ori,
            use_distance,
            use_location,
            key,
        }
    }

    /// The committed state
    pub fn current(&self) -> &StateKey {
        &self.key
    }

    /// Current history with the newest side information substituted in.
    ///
    /// Fields of `side` that are `None` keep their committed value.
    pub fn get_state(&self, side: &SideInfo) -> StateKey {
        let mut key = self.key.clone();
        if self.n_ori > 0 {
            if let (Some(orientation), Some(last)) = (side.orientation, key.orientations.last_mut()) {
                *last = orientation;
            }
        }
        self.substitute(&mut key, side);
        key
    }

    /// State that would follow from taking `action` and observing `side`.
    pub fn get_nextstate(&self, action: usize, side: &SideInfo) -> StateKey {
        let mut key = self.key.clone();
        self.advance(&mut key, action, side);
        key
    }

    /// Commit the transition.
    pub fn update_state(&mut self, action: usize, side: &SideInfo) {
        let mut key = std::mem::take(&mut self.key);
        self.advance(&mut key, action, side);
        self.key = key;
    }

    fn advance(&self, key: &mut StateKey, action: usize, side: &SideInfo) {
        shift_in(&mut key.actions, action);
        if self.n_ori > 0 {
            let orientation = side
                .orientation
                .or_else(|| key.orientations.last().copied())
                .unwrap_or(0);
            shift_in(&mut key.orientations, orientation);
        }
        self.substitute(key, side);
    }

    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn substitute(&self, key: &mut StateKey, side: &SideInfo) {
        if self.use_distance {
            if let Some(distance) = side.distance {
                key.distance = Some(distance);
            }
        }
        if self.use_location {
            if let Some(location) = side.location {
                key.location = Some(location);
            }
        }
    }
}

fn shift_in(window: &mut [usize], value: usize) {
    if let Some(last) = window.len().checked_sub(1) {
        window.rotate_left(1);
        window[last] = value;
    }
}
