//! Multi-phase sawtooth assembly: trim each phase, hand the previous
//! phase's terminal state forward, integrate, concatenate.

use tracing::{debug, info};

use crate::control::configuration::GliderConfig;
use crate::control::mission::GlideProfile;
use crate::control::trim::{solve_trim, TrimState};
use crate::errors::SimulationError;
use crate::telemetry_system::trim_record::{TrimRecord, TrimRecorder};
use crate::trajectory_system::dynamics::EquationsOfMotion;
use crate::trajectory_system::integrator::{PhaseWindow, SegmentIntegrator, TrajectorySegment};
use crate::trajectory_system::state::{GliderState, StateBlock};

/// Where one phase sits inside the assembled trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSummary {
    pub window: PhaseWindow,
    pub trim: TrimState,
    pub initial_state: GliderState,
    pub terminal_state: GliderState,
    /// Index of the phase's first row in `Trajectory::states`.
    pub first_row: usize,
    pub rows: usize,
}

/// Immutable result of a full build.
///
/// Rows of a phase cover `[start, end)`. The state at a phase's end is its
/// `terminal_state`, which is not a row: the next phase starts from it after
/// re-trimming. Adjacent rows across a seam are therefore one report
/// interval apart and differ by the re-trim jump. Use
/// [`Trajectory::final_state`] for the endpoint of the last phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<GliderState>,
    phases: Vec<PhaseSummary>,
}

impl Trajectory {
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[GliderState] {
        &self.states
    }

    pub fn phases(&self) -> &[PhaseSummary] {
        &self.phases
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Rows belonging to one phase.
    pub fn phase_rows(&self, phase: usize) -> Option<(&[f64], &[GliderState])> {
        let summary = self.phases.get(phase)?;
        let rows = summary.first_row..summary.first_row + summary.rows;
        Some((&self.times[rows.clone()], &self.states[rows]))
    }

    /// Integrated state at the end of the last phase window.
    pub fn final_state(&self) -> Option<&GliderState> {
        self.phases.last().map(|p| &p.terminal_state)
    }
}

/// Running concatenation of phase segments.
#[derive(Debug, Default)]
pub struct TrajectoryBuilder {
    times: Vec<f64>,
    states: Vec<GliderState>,
    phases: Vec<PhaseSummary>,
}

impl TrajectoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Terminal state of the most recently appended segment.
    pub fn last_terminal(&self) -> Option<&GliderState> {
        self.phases.last().map(|p| &p.terminal_state)
    }

    pub fn append_segment(
        &mut self,
        segment: TrajectorySegment,
        trim: TrimState,
    ) -> Result<(), SimulationError> {
        if segment.phase() != self.phases.len() {
            return Err(SimulationError::ProfileError(format!(
                "segment for phase {} appended after {} phases",
                segment.phase(),
                self.phases.len()
            )));
        }
        if let (Some(last), Some(first)) = (self.times.last(), segment.times.first()) {
            if first <= last {
                return Err(SimulationError::ProfileError(format!(
                    "phase {} starts at {} before previous sample {}",
                    segment.phase(),
                    first,
                    last
                )));
            }
        }

        let first_row = self.times.len();
        let rows = segment.len();
        self.phases.push(PhaseSummary {
            window: segment.window,
            trim,
            initial_state: segment.states.first().copied().unwrap_or(segment.terminal),
            terminal_state: segment.terminal,
            first_row,
            rows,
        });
        self.times.extend(segment.times);
        self.states.extend(segment.states);
        Ok(())
    }

    pub fn finalize(self) -> Trajectory {
        Trajectory {
            times: self.times,
            states: self.states,
            phases: self.phases,
        }
    }
}

pub struct TrajectoryAssembler<'a> {
    config: &'a GliderConfig,
    integrator: SegmentIntegrator,
    recorder: Option<&'a mut dyn TrimRecorder>,
}

impl<'a> TrajectoryAssembler<'a> {
    pub fn new(config: &'a GliderConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let integrator =
            SegmentIntegrator::from_config(config).map_err(|source| SimulationError::Integration {
                phase: 0,
                source,
            })?;
        Ok(TrajectoryAssembler {
            config,
            integrator,
            recorder: None,
        })
    }

    /// Replaces the integration settings taken from the configuration.
    pub fn with_integrator(mut self, integrator: SegmentIntegrator) -> Self {
        self.integrator = integrator;
        self
    }

    pub fn with_recorder(mut self, recorder: &'a mut dyn TrimRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn build_trajectory<E>(
        &mut self,
        profile: &GlideProfile,
        eom: &E,
    ) -> Result<Trajectory, SimulationError>
    where
        E: EquationsOfMotion + ?Sized,
    {
        profile.validate()?;
        let mut builder = TrajectoryBuilder::new();

        for (phase, &glide_angle) in profile.angles().iter().enumerate() {
            info!(
                phase,
                glide_angle_deg = glide_angle.to_degrees(),
                "Starting glide phase"
            );

            let trim = solve_trim(self.config, glide_angle)
                .map_err(|source| SimulationError::Trim { phase, source })?;

            if let Some(recorder) = self.recorder.as_deref_mut() {
                recorder.record(&TrimRecord::new(phase, self.config, &trim))?;
            }

            let initial = match builder.last_terminal() {
                None => GliderState::at_rest(self.config, &trim),
                Some(previous) => {
                    let retrimmed = previous.apply_trim_overrides(self.config, &trim);
                    let jump = (retrimmed.block(StateBlock::MovableMass)
                        - previous.block(StateBlock::MovableMass))
                    .magnitude();
                    if jump > 0.0 {
                        debug!(phase, jump, "Movable mass re-trimmed at phase boundary");
                    }
                    retrimmed
                }
            };

            let segment = self
                .integrator
                .integrate(&initial, phase, eom)
                .map_err(|source| SimulationError::Integration { phase, source })?;

            builder.append_segment(segment, trim)?;
        }

        let trajectory = builder.finalize();
        info!(
            phases = trajectory.phases().len(),
            samples = trajectory.len(),
            "Trajectory assembled"
        );
        Ok(trajectory)
    }
}

/// Builds a trajectory with the configuration's integration settings and no
/// trim recorder.
pub fn build_trajectory<E>(
    config: &GliderConfig,
    profile: &GlideProfile,
    eom: &E,
) -> Result<Trajectory, SimulationError>
where
    E: EquationsOfMotion + ?Sized,
{
    TrajectoryAssembler::new(config)?.build_trajectory(profile, eom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_ATOL, DEFAULT_RTOL};
    use crate::errors::{IntegrationError, TrimError};
    use crate::trajectory_system::dynamics::RigidBodyKinematics;
    use crate::utils::vector3d::Vector3D;
    use approx::assert_relative_eq;

    fn quick_integrator() -> SegmentIntegrator {
        SegmentIntegrator::new(20.0, 5, DEFAULT_RTOL, DEFAULT_ATOL).unwrap()
    }

    fn quick_build<E>(
        config: &GliderConfig,
        profile: &GlideProfile,
        eom: &E,
    ) -> Result<Trajectory, SimulationError>
    where
        E: EquationsOfMotion + ?Sized,
    {
        TrajectoryAssembler::new(config)?
            .with_integrator(quick_integrator())
            .build_trajectory(profile, eom)
    }

    #[test]
    fn test_builder_rejects_out_of_order_segments() {
        let config = GliderConfig::slocum();
        let trim = solve_trim(&config, -0.4).unwrap();
        let state = GliderState::at_rest(&config, &trim);
        let segment = quick_integrator().integrate(&state, 1, &RigidBodyKinematics).unwrap();

        let mut builder = TrajectoryBuilder::new();
        assert!(builder.append_segment(segment, trim).is_err());
        assert_eq!(builder.phase_count(), 0);
    }

    #[test]
    fn test_phase_rows_partition_trajectory() {
        let config = GliderConfig::slocum();
        let profile = GlideProfile::sawtooth(0.4, 3);
        let trajectory = quick_build(&config, &profile, &RigidBodyKinematics).unwrap();

        assert_eq!(trajectory.len(), 15);
        for phase in 0..3 {
            let (times, states) = trajectory.phase_rows(phase).unwrap();
            assert_eq!(times.len(), 5);
            assert_eq!(states.len(), 5);
            assert_eq!(times[0], phase as f64 * 20.0);
        }
        assert!(trajectory.phase_rows(3).is_none());
    }

    #[test]
    fn test_seam_rows_skip_the_terminal_state() {
        let config = GliderConfig::slocum();
        let profile = GlideProfile::sawtooth(0.4, 2);
        let trajectory = quick_build(&config, &profile, &RigidBodyKinematics).unwrap();
        let phases = trajectory.phases();

        let (dive_times, _) = trajectory.phase_rows(0).unwrap();
        let (climb_times, climb_states) = trajectory.phase_rows(1).unwrap();
        assert_relative_eq!(dive_times[4], 16.0, epsilon = 1e-12);
        assert_eq!(climb_times[0], 20.0);
        assert_eq!(climb_states[0], phases[1].initial_state);
        assert_eq!(
            phases[1].initial_state.position(),
            phases[0].terminal_state.position()
        );
    }

    #[test]
    fn test_kinematic_dive_descends() {
        let config = GliderConfig::slocum();
        let profile = GlideProfile::sawtooth(0.4, 1);
        let trajectory = quick_build(&config, &profile, &RigidBodyKinematics).unwrap();

        let final_state = trajectory.final_state().unwrap();
        assert!(final_state.depth() > 0.0);
        assert_relative_eq!(
            final_state.position().magnitude(),
            config.glide.speed * 20.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_trim_failure_names_phase_and_stops_recording() {
        let config = GliderConfig::slocum();
        let profile = GlideProfile::new(vec![-0.4, 0.01, -0.4]);
        let mut records: Vec<TrimRecord> = Vec::new();

        let result = TrajectoryAssembler::new(&config)
            .unwrap()
            .with_integrator(quick_integrator())
            .with_recorder(&mut records)
            .build_trajectory(&profile, &RigidBodyKinematics);

        match result {
            Err(SimulationError::Trim { phase, source }) => {
                assert_eq!(phase, 1);
                assert!(matches!(source, TrimError::OutsideEnvelope { .. }));
            }
            other => panic!("expected trim failure, got {:?}", other),
        }
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_divergence_names_phase() {
        let config = GliderConfig::slocum();
        let profile = GlideProfile::sawtooth(0.4, 2);
        let diverging = |t: f64, _s: &GliderState| {
            let rate = if t >= 25.0 { f64::INFINITY } else { 0.0 };
            GliderState::zeros().with_block(StateBlock::Position, Vector3D::new(rate, 0.0, 0.0))
        };

        let err = quick_build(&config, &profile, &diverging).unwrap_err();
        assert_eq!(err.phase(), Some(1));
        assert!(matches!(
            err,
            SimulationError::Integration {
                source: IntegrationError::NonFiniteDerivative { slot: 0, .. },
                ..
            }
        ));
    }
}
