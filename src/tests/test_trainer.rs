use crate::config::ExperimentConfig;
use crate::error::BeamError;
use crate::trace::{ChannelTrace, LineOfSightSource, TraceSource};
use crate::trainer::Trainer;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn small_config() -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.scenario.num_trajectories = 2;
    config.scenario.trajectory_length = 200;
    config.scenario.comm_radius = 50.0;
    config.training.repetitions = 3;
    config.training.chunk_size = 100;
    config.training.seed = 1;
    config
}

fn trace_for(config: &ExperimentConfig) -> ChannelTrace {
    LineOfSightSource::new(42)
        .generate(&config.scenario, config.array.carrier_frequency)
        .unwrap()
}

#[test]
fn test_log_shapes_and_bounds() {
    let config = small_config();
    let trace = trace_for(&config);
    let trainer = Trainer::new(config, trace).unwrap();
    let log = trainer.run().unwrap();

    assert_eq!(log.method, "Q-LEARNING");
    assert_eq!(log.repetitions(), 3);
    assert_eq!(log.chunk_len(), 100);
    assert_eq!(log.rewards().shape(), &[3, 100]);
    assert!(log.actions().iter().all(|&a| a < 8));

    for episode in &log.episodes {
        assert!(episode.trajectory < 2);
        assert!(episode.offset + 100 <= 200);
        for n in 0..episode.len() {
            assert!(episode.rewards[n] >= 0.0);
            assert!(episode.min_rewards[n] <= episode.rewards[n]);
            assert!(episode.rewards[n] <= episode.max_rewards[n]);
        }
    }

    let p = log.misalignment_probability(3.0);
    assert_eq!(p.len(), 100);
    assert!(p.iter().all(|&x| (0.0..=1.0).contains(&x)));
}

#[test]
fn test_serial_and_parallel_agree() {
    let mut config = small_config();
    let trace = trace_for(&config);
    let serial = Trainer::new(config.clone(), trace.clone()).unwrap().run().unwrap();

    config.training.parallel = true;
    let parallel = Trainer::new(config, trace).unwrap().run().unwrap();
    assert_eq!(serial, parallel);
}

#[test]
fn test_runs_are_reproducible() {
    let config = small_config();
    let trace = trace_for(&config);
    let a = Trainer::new(config.clone(), trace.clone()).unwrap().run().unwrap();
    let b = Trainer::new(config, trace).unwrap().run().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_adjacency_limits_beam_moves() {
    let mut config = small_config();
    config.agent.adjacency = true;
    config.agent.epsilon = 0.5;
    let trace = trace_for(&config);
    let log = Trainer::new(config, trace).unwrap().run().unwrap();

    for episode in &log.episodes {
        for pair in episode.actions.windows(2) {
            assert!(pair[0].abs_diff(pair[1]) <= 1, "jump {:?}", pair);
        }
    }
}

#[test]
fn test_every_method_runs() {
    for method in ["simple", "SARSA", "Q-LEARNING"] {
        let mut config = small_config();
        config.agent.method = method.to_string();
        let trace = trace_for(&config);
        let log = Trainer::new(config, trace).unwrap().run().unwrap();
        assert_eq!(log.repetitions(), 3);
        assert_eq!(log.chunk_len(), 100);
    }
}

#[test]
fn test_side_information_states() {
    let mut config = small_config();
    config.state.n_ori = 2;
    config.state.distance_resolution = Some(4);
    config.state.location_resolution = Some(8);
    let trace = trace_for(&config);
    let log = Trainer::new(config, trace).unwrap().run().unwrap();
    assert_eq!(log.chunk_len(), 100);
}

#[test]
fn test_chunk_longer_than_trajectories() {
    let mut config = small_config();
    let trace = trace_for(&config);
    config.training.chunk_size = 500;
    match Trainer::new(config, trace) {
        Err(BeamError::InvalidParameter { name, .. }) => assert_eq!(name, "training.chunk_size"),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("chunk longer than every trajectory was accepted"),
    }
}

#[test]
fn test_sample_chunk_range() {
    let config = small_config();
    let trace = trace_for(&config);
    let trainer = Trainer::new(config, trace).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    for _ in 0..100 {
        let (trajectory, offset) = trainer.sample_chunk(&mut rng);
        assert!(trajectory < 2);
        assert!(offset <= 100);
    }

    let mut full = small_config();
    full.training.chunk_size = 200;
    let trace = trace_for(&full);
    let trainer = Trainer::new(full, trace).unwrap();
    for _ in 0..10 {
        assert_eq!(trainer.sample_chunk(&mut rng).1, 0);
    }
}

#[test]
fn test_reference_beams_cover_every_step() {
    let config = small_config();
    let trace = trace_for(&config);
    let trainer = Trainer::new(config, trace).unwrap();
    let log = trainer.run().unwrap();

    let references = trainer.reference_beams(&log);
    assert_eq!(references.len(), log.repetitions());
    for (reference, episode) in references.iter().zip(&log.episodes) {
        assert_eq!(reference.len(), episode.len());
        assert!(reference.iter().all(|&beam| beam < 8));
    }
    let accuracy = log.beam_accuracy(&references, 50);
    assert!((0.0..=1.0).contains(&accuracy));
}
