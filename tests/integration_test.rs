use beamtrack::{
    config::{ExperimentConfig, ScenarioConfig},
    error::{BeamError, Result},
    trace::{ChannelTrace, LineOfSightSource, TraceCache, TraceSource},
    trainer::Trainer,
};

/// Counts calls and delegates to the line-of-sight source
struct CountingSource {
    inner: LineOfSightSource,
    calls: usize,
}

impl TraceSource for CountingSource {
    fn generate(&mut self, scenario: &ScenarioConfig, carrier_frequency: f64) -> Result<ChannelTrace> {
        self.calls += 1;
        self.inner.generate(scenario, carrier_frequency)
    }
}

struct OfflineSimulator;

impl TraceSource for OfflineSimulator {
    fn generate(&mut self, _: &ScenarioConfig, _: f64) -> Result<ChannelTrace> {
        Err(BeamError::IoError("simulator not installed".to_string()))
    }
}

fn small_config() -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.scenario.num_trajectories = 3;
    config.scenario.trajectory_length = 300;
    config.scenario.comm_radius = 80.0;
    config.training.repetitions = 4;
    config.training.chunk_size = 150;
    config
}

#[test]
fn test_cache_generates_then_reuses() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.bin");
    let config = small_config();
    let cache = TraceCache::new(&path);
    let mut source = CountingSource {
        inner: LineOfSightSource::new(5),
        calls: 0,
    };

    let first = cache
        .load_or_generate(&config.scenario, config.array.carrier_frequency, &mut source)
        .unwrap();
    assert_eq!(source.calls, 1);
    assert!(path.exists());
    assert_eq!(first.trajectories.len(), 3);
    assert_eq!(first.min_len(), 300);

    let second = cache
        .load_or_generate(&config.scenario, config.array.carrier_frequency, &mut source)
        .unwrap();
    assert_eq!(source.calls, 1);
    assert_eq!(first, second);
}

#[test]
fn test_corrupt_cache_is_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.bin");
    std::fs::write(&path, b"not a trace").unwrap();

    let config = small_config();
    let mut source = CountingSource {
        inner: LineOfSightSource::new(5),
        calls: 0,
    };
    let trace = TraceCache::new(&path)
        .load_or_generate(&config.scenario, config.array.carrier_frequency, &mut source)
        .unwrap();
    assert_eq!(source.calls, 1);
    assert_eq!(TraceCache::new(&path).load().unwrap(), trace);
}

#[test]
fn test_missing_simulator_reports_unavailable_trace() {
    let dir = tempfile::tempdir().unwrap();
    let config = small_config();
    let result = TraceCache::new(dir.path().join("missing.bin")).load_or_generate(
        &config.scenario,
        config.array.carrier_frequency,
        &mut OfflineSimulator,
    );
    assert!(matches!(result, Err(BeamError::TraceUnavailable(_))));
}

#[test]
fn test_end_to_end_training_from_json_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("experiment.json");
    let log_path = dir.path().join("log.json");

    let mut config = small_config();
    config.agent.method = "SARSA".to_string();
    config.agent.adjacency = true;
    config.state.n_ori = 1;
    config.scenario.cache_path = Some(dir.path().join("trace.bin"));
    config.save_json(&config_path).unwrap();

    let config = ExperimentConfig::from_json_file(&config_path).unwrap();
    let cache_path = config.scenario.cache_path.clone().unwrap();
    let mut source = LineOfSightSource::new(config.training.seed);
    let trace = TraceCache::new(cache_path)
        .load_or_generate(&config.scenario, config.array.carrier_frequency, &mut source)
        .unwrap();

    let trainer = Trainer::new(config, trace).unwrap();
    let log = trainer.run().unwrap();
    assert_eq!(log.method, "SARSA");
    assert_eq!(log.rewards().shape(), &[4, 150]);

    let misalignment = log.mean_misalignment(3.0);
    assert!((0.0..=1.0).contains(&misalignment));

    log.save_json(log_path.to_str().unwrap()).unwrap();
    let reloaded = beamtrack::metrics::TrainingLog::load_json(log_path.to_str().unwrap()).unwrap();
    assert_eq!(reloaded.episodes.len(), 4);
    assert_eq!(reloaded.episodes[0].actions, log.episodes[0].actions);
}
