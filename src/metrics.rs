//! Per-step reward logs and the misalignment / accuracy metrics computed
//! from them.

use crate::environment::RewardSample;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Convert a linear power to decibels
pub fn to_db(power: f64) -> f64 {
    10.0 * power.log10()
}

/// Everything recorded during one training chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeLog {
    /// Trajectory the chunk was sampled from
    pub trajectory: usize,
    /// First timestep of the chunk within that trajectory
    pub offset: usize,
    pub actions: Vec<usize>,
    pub rewards: Vec<f64>,
    pub max_rewards: Vec<f64>,
    pub min_rewards: Vec<f64>,
    pub mean_rewards: Vec<f64>,
}

impl EpisodeLog {
    pub fn new(trajectory: usize, offset: usize, capacity: usize) -> Self {
        EpisodeLog {
            trajectory,
            offset,
            actions: Vec::with_capacity(capacity),
            rewards: Vec::with_capacity(capacity),
            max_rewards: Vec::with_capacity(capacity),
            min_rewards: Vec::with_capacity(capacity),
            mean_rewards: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, action: usize, sample: &RewardSample) {
        self.actions.push(action);
        self.rewards.push(sample.reward);
        self.max_rewards.push(sample.max);
        self.min_rewards.push(sample.min);
        self.mean_rewards.push(sample.mean);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// Logs of all repetitions of a run, `[repetitions × chunk]`
///
/// All episodes of one run have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    pub method: String,
    pub episodes: Vec<EpisodeLog>,
}

impl TrainingLog {
    pub fn new(method: &str) -> Self {
        TrainingLog {
            method: method.to_string(),
            episodes: Vec::new(),
        }
    }

    pub fn repetitions(&self) -> usize {
        self.episodes.len()
    }

    pub fn chunk_len(&self) -> usize {
        self.episodes.first().map_or(0, EpisodeLog::len)
    }

    fn stack(&self, pick: impl Fn(&EpisodeLog) -> &Vec<f64>) -> Array2<f64> {
        Array2::from_shape_fn((self.repetitions(), self.chunk_len()), |(m, n)| pick(&self.episodes[m])[n])
    }

    pub fn actions(&self) -> Array2<usize> {
        Array2::from_shape_fn((self.repetitions(), self.chunk_len()), |(m, n)| self.episodes[m].actions[n])
    }

    pub fn rewards(&self) -> Array2<f64> {
        self.stack(|e| &e.rewards)
    }

    pub fn max_rewards(&self) -> Array2<f64> {
        self.stack(|e| &e.max_rewards)
    }

    pub fn min_rewards(&self) -> Array2<f64> {
        self.stack(|e| &e.min_rewards)
    }

    pub fn mean_rewards(&self) -> Array2<f64> {
        self.stack(|e| &e.mean_rewards)
    }

    /// Per timestep, the fraction of repetitions whose reward fell more than
    /// `threshold_db` below the best beam pair.
    pub fn misalignment_probability(&self, threshold_db: f64) -> Array1<f64> {
        let rewards = self.rewards();
        let max = self.max_rewards();
        let factor = 10f64.powf(-threshold_db / 10.0);
        let repetitions = self.repetitions().max(1) as f64;

        Array1::from_shape_fn(self.chunk_len(), |n| {
            let misses = (0..self.repetitions())
                .filter(|&m| rewards[[m, n]] < max[[m, n]] * factor)
                .count();
            misses as f64 / repetitions
        })
    }

    /// Misalignment probability averaged over all timesteps.
    pub fn mean_misalignment(&self, threshold_db: f64) -> f64 {
        self.misalignment_probability(threshold_db).mean().unwrap_or(0.0)
    }

    /// Fraction of the last `last_n` steps whose beam matched `references`.
    ///
    /// `references[m]` holds the reference beam of every step of episode `m`.
    pub fn beam_accuracy(&self, references: &[Vec<usize>], last_n: usize) -> f64 {
        let mut hits = 0usize;
        let mut total = 0usize;
        for (episode, reference) in self.episodes.iter().zip(references) {
            let n = last_n.min(episode.len()).min(reference.len());
            let actions = &episode.actions[episode.len() - n..];
            let reference = &reference[reference.len() - n..];
            hits += actions.iter().zip(reference).filter(|(a, r)| a == r).count();
            total += n;
        }
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Save logs to a JSON file
    pub fn save_json(&self, path: &str) -> crate::error::Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load logs from a JSON file
    pub fn load_json(path: &str) -> crate::error::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(reward: f64, max: f64) -> RewardSample {
        RewardSample {
            reward,
            max,
            min: 0.0,
            mean: max / 2.0,
        }
    }

    fn log() -> TrainingLog {
        let mut log = TrainingLog::new("simple");
        let mut a = EpisodeLog::new(0, 0, 3);
        a.record(1, &sample(10.0, 10.0));
        a.record(2, &sample(1.0, 10.0));
        a.record(2, &sample(6.0, 10.0));
        let mut b = EpisodeLog::new(1, 5, 3);
        b.record(0, &sample(0.0, 10.0));
        b.record(2, &sample(9.0, 10.0));
        b.record(3, &sample(0.0, 0.0));
        log.episodes.push(a);
        log.episodes.push(b);
        log
    }

    #[test]
    fn test_to_db() {
        assert!((to_db(100.0) - 20.0).abs() < 1e-12);
        assert_eq!(to_db(0.0), f64::NEG_INFINITY);
    }

    #[test]
    fn test_shapes() {
        let log = log();
        assert_eq!(log.rewards().shape(), &[2, 3]);
        assert_eq!(log.actions()[[1, 2]], 3);
        assert_eq!(log.max_rewards()[[0, 1]], 10.0);
        assert_eq!(log.mean_rewards()[[0, 0]], 5.0);
    }

    #[test]
    fn test_misalignment() {
        let log = log();
        // 3 dB: reward must reach about half of the max
        let p = log.misalignment_probability(3.0);
        assert_eq!(p.to_vec(), vec![0.5, 0.5, 0.0]);
        assert!((log.mean_misalignment(3.0) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_beam_accuracy() {
        let log = log();
        let references = vec![vec![1, 2, 0], vec![0, 0, 3]];
        assert!((log.beam_accuracy(&references, 2) - 0.5).abs() < 1e-12);
        assert!((log.beam_accuracy(&references, 10) - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let log = log();
        log.save_json(path.to_str().unwrap()).unwrap();
        assert_eq!(TrainingLog::load_json(path.to_str().unwrap()).unwrap(), log);
    }
}
