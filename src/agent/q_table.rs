use crate::error::{BeamError, Result};
use crate::state::StateKey;
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Step size schedule for the value updates
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StepSize {
    /// Fixed `α`
    Constant { alpha: f64 },
    /// `α = max(1/n, min_alpha)` where `n` counts visits of the (state, action) pair
    VisitDecay { min_alpha: f64 },
}

impl StepSize {
    pub fn alpha(&self, visits: u64) -> f64 {
        match self {
            StepSize::Constant { alpha } => *alpha,
            StepSize::VisitDecay { min_alpha } => (1.0 / visits.max(1) as f64).max(*min_alpha),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            StepSize::Constant { alpha } if !(*alpha > 0.0 && *alpha <= 1.0) => Err(
                BeamError::invalid_parameter("step_size.alpha", "must lie in (0, 1]"),
            ),
            StepSize::VisitDecay { min_alpha } if !(0.0..=1.0).contains(min_alpha) => Err(
                BeamError::invalid_parameter("step_size.min_alpha", "must lie in [0, 1]"),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for StepSize {
    fn default() -> Self {
        StepSize::Constant { alpha: 0.1 }
    }
}

/// Value estimates and visit counts of every action in one state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateValues {
    pub values: Array1<f64>,
    pub visits: Vec<u64>,
}

impl StateValues {
    fn new(num_actions: usize) -> Self {
        StateValues {
            values: Array1::zeros(num_actions),
            visits: vec![0; num_actions],
        }
    }
}

/// Lazily populated action-value table keyed by [`StateKey`]
///
/// Unseen states read as all-zero; a state's row is allocated the first time
/// it is written.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QTable {
    num_actions: usize,
    table: HashMap<StateKey, StateValues>,
}

impl QTable {
    pub fn new(num_actions: usize) -> Self {
        QTable {
            num_actions,
            table: HashMap::new(),
        }
    }

    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Number of materialized states
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn value(&self, state: &StateKey, action: usize) -> f64 {
        self.table.get(state).map_or(0.0, |row| row.values[action])
    }

    pub fn values(&self, state: &StateKey) -> Option<ArrayView1<'_, f64>> {
        self.table.get(state).map(|row| row.values.view())
    }

    pub fn visits(&self, state: &StateKey, action: usize) -> u64 {
        self.table.get(state).map_or(0, |row| row.visits[action])
    }

    /// Row for `state`, created with zero values if missing.
    pub fn entry(&mut self, state: &StateKey) -> &mut StateValues {
        // Only a missing row pays for cloning the key
        if !self.table.contains_key(state) {
            self.table.insert(state.clone(), StateValues::new(self.num_actions));
        }
        self.table
            .get_mut(state)
            .unwrap_or_else(|| unreachable!("row inserted above"))
    }

    pub fn set(&mut self, state: &StateKey, action: usize, value: f64) {
        self.entry(state).values[action] = value;
    }

    /// Highest-valued candidate; the first candidate wins ties.
    pub fn greedy(&self, state: &StateKey, candidates: &[usize]) -> usize {
        let mut best = candidates[0];
        let mut best_value = self.value(state, best);
        for &action in &candidates[1..] {
            let value = self.value(state, action);
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    pub fn max_value(&self, state: &StateKey, candidates: &[usize]) -> f64 {
        candidates
            .iter()
            .map(|&action| self.value(state, action))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(actions: &[usize]) -> StateKey {
        StateKey::from_actions(actions.to_vec())
    }

    #[test]
    fn test_unseen_state_reads_zero() {
        let table = QTable::new(4);
        assert_eq!(table.value(&key(&[1, 2]), 3), 0.0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_entry_materializes() {
        let mut table = QTable::new(4);
        table.set(&key(&[1, 2]), 1, 2.5);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(&key(&[1, 2]), 1), 2.5);
        assert_eq!(table.values(&key(&[1, 2])).unwrap().len(), 4);
    }

    #[test]
    fn test_greedy_first_max_wins() {
        let mut table = QTable::new(4);
        let s = key(&[0]);
        table.set(&s, 1, 5.0);
        table.set(&s, 3, 5.0);
        assert_eq!(table.greedy(&s, &[0, 1, 2, 3]), 1);
        assert_eq!(table.greedy(&s, &[3, 2, 1]), 3);
        // All zeros: first candidate
        assert_eq!(table.greedy(&key(&[9]), &[2, 3]), 2);
        assert_eq!(table.max_value(&s, &[0, 2]), 0.0);
    }

    #[test]
    fn test_visit_decay() {
        let schedule = StepSize::VisitDecay { min_alpha: 0.05 };
        assert_eq!(schedule.alpha(1), 1.0);
        assert_eq!(schedule.alpha(4), 0.25);
        assert_eq!(schedule.alpha(1000), 0.05);
        assert!(StepSize::Constant { alpha: 0.0 }.validate().is_err());
        assert!(StepSize::VisitDecay { min_alpha: 0.0 }.validate().is_ok());
    }

    #[test]
    fn test_entry_keeps_existing_row() {
        let mut table = QTable::new(3);
        let s = key(&[1, 1, 1]);
        table.set(&s, 2, -0.5);
        table.entry(&s).visits[2] += 1;
        table.entry(&s).values[0] = 4.0;
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(&s, 2), -0.5);
        assert_eq!(table.value(&s, 0), 4.0);
        assert_eq!(table.visits(&s, 2), 1);
    }
}
