/***
# Beam Tracking Example

* Trains the three tabular update rules on a line-of-sight trace:
  - Loads an experiment from a JSON file (first argument) or uses defaults
  - Generates the channel trace once and caches it on disk
  - Compares misalignment and beam accuracy with and without the adjacency policy

Run with: RUST_LOG=beamtrack=debug cargo run --example beam_tracking -- experiment.json
***/

use beamtrack::{
    config::ExperimentConfig,
    error::Result,
    metrics::to_db,
    trace::{LineOfSightSource, TraceCache},
    trainer::Trainer,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("beamtrack=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let base = match std::env::args().nth(1) {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => {
            let mut config = ExperimentConfig::default();
            config.scenario.trajectory_length = 4000;
            config.training.chunk_size = 2000;
            config.training.parallel = true;
            config
        }
    };
    base.validate()?;

    println!("=== Beam Tracking Demo ===\n");
    println!(
        "  {}x{} antennas, {}x{} beams at {:.1} GHz",
        base.array.tx_antennas,
        base.array.rx_antennas,
        base.array.tx_beams,
        base.array.rx_beams,
        base.array.carrier_frequency / 1e9
    );

    let cache_path = base
        .scenario
        .cache_path
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("beamtrack_los_trace.bin"));
    let mut source = LineOfSightSource::new(base.training.seed);
    let trace = TraceCache::new(&cache_path).load_or_generate(
        &base.scenario,
        base.array.carrier_frequency,
        &mut source,
    )?;
    println!(
        "  Trace: {} trajectories, shortest {} steps ({})\n",
        trace.trajectories.len(),
        trace.min_len(),
        cache_path.display()
    );

    println!("{:<12} {:>10} {:>14} {:>14} {:>12}", "method", "adjacency", "P(miss 3 dB)", "mean gap (dB)", "accuracy");
    for method in ["simple", "SARSA", "Q-LEARNING"] {
        for adjacency in [false, true] {
            let mut config = base.clone();
            config.agent.method = method.to_string();
            config.agent.adjacency = adjacency;

            let trainer = Trainer::new(config, trace.clone())?;
            let log = trainer.run()?;
            let references = trainer.reference_beams(&log);

            let rewards = log.rewards();
            let max = log.max_rewards();
            let gaps: Vec<f64> = rewards
                .iter()
                .zip(max.iter())
                .filter(|(r, _)| **r > 0.0)
                .map(|(r, m)| to_db(*m) - to_db(*r))
                .collect();
            let mean_gap = gaps.iter().sum::<f64>() / gaps.len().max(1) as f64;

            println!(
                "{:<12} {:>10} {:>14.3} {:>14.2} {:>12.3}",
                log.method,
                adjacency,
                log.mean_misalignment(3.0),
                mean_gap,
                log.beam_accuracy(&references, log.chunk_len() / 10)
            );
        }
    }

    Ok(())
}
