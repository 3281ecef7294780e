use std::cell::Cell;

use glider_simulation::{
    build_trajectory, feasible_envelope, solve_trim, GlideDirection, GlideProfile, GliderConfig,
    GliderState, JsonTrimRecorder, SimulationError, StateBlock, TrajectoryAssembler, TrimError,
    TrimRecord, Vector3D, PHASE_WINDOW, SAMPLES_PER_PHASE,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const GLIDE_MAGNITUDE_DEG: f64 = 25.0;

// Synthetic linear force model: every slot relaxes slowly toward zero
fn linear_decay(_t: f64, state: &GliderState) -> GliderState {
    let mut derivative = GliderState::zeros();
    for (d, v) in derivative
        .as_mut_slice()
        .iter_mut()
        .zip(state.as_slice().iter())
    {
        *d = -0.002 * v;
    }
    derivative
}

fn random_config(rng: &mut StdRng) -> GliderConfig {
    let mut config = GliderConfig::slocum();
    config.hydrodynamics.kl = rng.gen_range(50.0..200.0);
    config.hydrodynamics.kd = rng.gen_range(5.0..50.0);
    config.hydrodynamics.kd0 = rng.gen_range(0.5..5.0);
    config.hydrodynamics.kl0 = rng.gen_range(0.0..5.0);
    config
}

fn random_feasible_angle(rng: &mut StdRng, config: &GliderConfig) -> f64 {
    let envelope = feasible_envelope(config);
    if rng.gen_bool(0.5) {
        rng.gen_range(envelope.upper + 0.01..1.5)
    } else {
        -rng.gen_range(-envelope.lower + 0.01..1.5)
    }
}

#[test]
fn test_envelope_brackets_level_flight_for_random_vehicles() {
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..200 {
        let config = random_config(&mut rng);
        let envelope = feasible_envelope(&config);
        assert!(
            envelope.lower < 0.0 && envelope.upper > 0.0,
            "envelope {:?} does not bracket zero",
            envelope
        );

        let fraction: f64 = rng.gen_range(0.05..0.95);
        let inside = envelope.lower + fraction * (envelope.upper - envelope.lower);
        if inside == 0.0 {
            continue;
        }
        match solve_trim(&config, inside) {
            Err(TrimError::OutsideEnvelope { .. }) => {}
            other => panic!("angle {} should be infeasible, got {:?}", inside, other),
        }
    }
}

#[test]
fn test_trim_is_deterministic_and_directional() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..200 {
        let config = random_config(&mut rng);
        let angle = random_feasible_angle(&mut rng, &config);

        let first = solve_trim(&config, angle).expect("feasible angle");
        let second = solve_trim(&config, angle).expect("feasible angle");
        assert_eq!(first, second);

        if angle > 0.0 {
            assert_eq!(first.direction, GlideDirection::Ascend);
            assert!(first.ballast_rate < 0.0);
        } else {
            assert_eq!(first.direction, GlideDirection::Descend);
            assert!(first.ballast_rate > 0.0);
        }
    }
}

#[test]
fn test_four_phase_sawtooth_scenario() {
    let config = GliderConfig::slocum();
    let g = GLIDE_MAGNITUDE_DEG.to_radians();
    let profile = GlideProfile::new(vec![-g, g, -g, g]);

    let trajectory = build_trajectory(&config, &profile, &linear_decay).expect("build succeeds");

    assert_eq!(trajectory.phases().len(), 4);
    assert_eq!(trajectory.len(), 4 * SAMPLES_PER_PHASE);
    for (i, phase) in trajectory.phases().iter().enumerate() {
        assert_eq!(phase.window.start, i as f64 * PHASE_WINDOW);
        assert_eq!(phase.window.length(), PHASE_WINDOW);
        assert_eq!(phase.rows, SAMPLES_PER_PHASE);
    }

    let dive = solve_trim(&config, -g).unwrap();
    let first = &trajectory.states()[0];
    assert_eq!(first.velocity(), Vector3D::new(dive.v_forward, 0.0, dive.v_vertical));
    assert_eq!(first.position(), Vector3D::ZERO);
    assert_eq!(first.orientation(), config.initial_attitude());
    assert_eq!(first.angular_velocity(), Vector3D::ZERO);
}

#[test]
fn test_phase_boundaries_carry_state_and_retrim() {
    let config = GliderConfig::slocum();
    let profile = GlideProfile::from_config(&config, 4);
    let trajectory = build_trajectory(&config, &profile, &linear_decay).unwrap();
    let phases = trajectory.phases();

    for i in 0..phases.len() - 1 {
        let previous = &phases[i];
        let next = &phases[i + 1];

        for block in StateBlock::ALL {
            if block.carries_over() {
                assert_eq!(
                    next.initial_state.block(block),
                    previous.terminal_state.block(block),
                    "{} changed across boundary {}",
                    block.label(),
                    i
                );
            }
        }
        assert_eq!(
            next.initial_state.block(StateBlock::MovableMass),
            Vector3D::new(next.trim.movable_mass_offset, 0.0, config.geometry.rp3)
        );
        assert_ne!(
            next.initial_state.block(StateBlock::MovableMass).x,
            previous.trim.movable_mass_offset
        );
        assert_eq!(
            next.initial_state.block(StateBlock::BallastOffset),
            Vector3D::new(config.geometry.rb1, 0.0, config.geometry.rb3)
        );
        assert_eq!(next.initial_state.ballast_mass(), next.trim.ballast_mass);
        assert_ne!(next.initial_state.ballast_mass(), previous.trim.ballast_mass);
    }
}

#[test]
fn test_assembled_times_strictly_increase() {
    let config = GliderConfig::slocum();
    let profile = GlideProfile::from_config(&config, 4);
    let trajectory = build_trajectory(&config, &profile, &linear_decay).unwrap();
    let times = trajectory.times();

    assert!(times.windows(2).all(|w| w[0] < w[1]));
    for (i, phase) in trajectory.phases().iter().enumerate().skip(1) {
        assert_eq!(times[phase.first_row], i as f64 * PHASE_WINDOW);
    }
}

#[test]
fn test_zero_angle_fails_before_integration() {
    let config = GliderConfig::slocum();
    let calls = Cell::new(0usize);
    let counting = |t: f64, state: &GliderState| {
        calls.set(calls.get() + 1);
        linear_decay(t, state)
    };

    let g = GLIDE_MAGNITUDE_DEG.to_radians();
    let profile = GlideProfile::new(vec![-g, 0.0, -g]);
    let err = build_trajectory(&config, &profile, &counting).unwrap_err();

    assert!(matches!(
        err,
        SimulationError::Trim {
            phase: 1,
            source: TrimError::ZeroGlideAngle
        }
    ));
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_trim_records_are_persisted_per_phase() {
    let config = GliderConfig::slocum();
    let dir = tempfile::tempdir().unwrap();
    let mut recorder = JsonTrimRecorder::new(dir.path());

    TrajectoryAssembler::new(&config)
        .unwrap()
        .with_recorder(&mut recorder)
        .build_trajectory(&GlideProfile::from_config(&config, 4), &linear_decay)
        .unwrap();

    for phase in 0..4 {
        let contents = std::fs::read_to_string(recorder.path_for(phase)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        let expected = if phase % 2 == 0 { "Descend" } else { "Ascend" };
        assert_eq!(value["glide_dir"], expected);
        assert_eq!(value["mt"].as_f64().unwrap(), config.total_mass());
    }
}

#[test]
fn test_in_memory_records_match_trim() {
    let config = GliderConfig::slocum();
    let mut records: Vec<TrimRecord> = Vec::new();
    let profile = GlideProfile::from_config(&config, 2);

    let trajectory = TrajectoryAssembler::new(&config)
        .unwrap()
        .with_recorder(&mut records)
        .build_trajectory(&profile, &linear_decay)
        .unwrap();

    assert_eq!(records.len(), 2);
    for (record, phase) in records.iter().zip(trajectory.phases()) {
        assert_eq!(record.rp1_d, phase.trim.movable_mass_offset);
        assert_eq!(record.mb_d, phase.trim.ballast_mass);
    }
}

#[test]
fn test_reference_config_file_matches_builtin() {
    let loaded = GliderConfig::load("configs/slocum.toml").expect("reference config");
    assert_eq!(loaded, GliderConfig::slocum());
}

#[test]
fn test_invalid_config_is_rejected_before_any_phase() {
    let mut config = GliderConfig::slocum();
    config.mass.hull = -1.0;

    assert!(matches!(
        TrajectoryAssembler::new(&config),
        Err(SimulationError::Config(_))
    ));
}
