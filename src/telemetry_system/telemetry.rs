use std::fs;
use std::path::Path;

use tracing::info;

use crate::constants::{BLOCK_SIZE, STATE_DIM};
use crate::control::trim::GlideDirection;
use crate::errors::SimulationError;
use crate::trajectory_system::assembler::Trajectory;
use crate::trajectory_system::state::StateBlock;

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseTelemetry {
    pub phase: usize,
    pub direction: GlideDirection,
    pub angle_of_attack_deg: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub start_depth: f64,
    pub end_depth: f64,
}

impl PhaseTelemetry {
    pub fn depth_change(&self) -> f64 {
        self.end_depth - self.start_depth
    }
}

/// Summary metrics of an assembled trajectory, plus CSV export for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryTelemetry {
    pub phases: Vec<PhaseTelemetry>,
    pub max_depth: f64,
    pub min_depth: f64,
    pub horizontal_range: f64,
    pub duration: f64,
}

impl TrajectoryTelemetry {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        let phases: Vec<PhaseTelemetry> = trajectory
            .phases()
            .iter()
            .enumerate()
            .map(|(phase, summary)| PhaseTelemetry {
                phase,
                direction: summary.trim.direction,
                angle_of_attack_deg: summary.trim.angle_of_attack.to_degrees(),
                start_time: summary.window.start,
                end_time: summary.window.end,
                start_depth: summary.initial_state.depth(),
                end_depth: summary.terminal_state.depth(),
            })
            .collect();

        let depths = trajectory
            .states()
            .iter()
            .chain(trajectory.final_state())
            .map(|s| s.depth());
        let (min_depth, max_depth) = depths.fold((f64::INFINITY, f64::NEG_INFINITY), |acc, d| {
            (acc.0.min(d), acc.1.max(d))
        });

        let horizontal_range = trajectory
            .final_state()
            .map(|s| {
                let p = s.position();
                p.x.hypot(p.y)
            })
            .unwrap_or(0.0);

        TrajectoryTelemetry {
            duration: phases.last().map_or(0.0, |p| p.end_time),
            phases,
            max_depth: if max_depth.is_finite() { max_depth } else { 0.0 },
            min_depth: if min_depth.is_finite() { min_depth } else { 0.0 },
            horizontal_range,
        }
    }

    fn format_time(elapsed_time: f64) -> String {
        if elapsed_time >= 3600.0 {
            let hours = (elapsed_time / 3600.0).floor();
            let minutes = ((elapsed_time % 3600.0) / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}h {:.0}m {:.2}s", hours, minutes, seconds)
        } else if elapsed_time >= 60.0 {
            let minutes = (elapsed_time / 60.0).floor();
            let seconds = elapsed_time % 60.0;
            format!("{:.0}m {:.2}s", minutes, seconds)
        } else {
            format!("{:.2}s", elapsed_time)
        }
    }

    pub fn display_data(&self) {
        for phase in &self.phases {
            info!(
                "Phase {} ({:?}) {} -> {}: depth {:.2} m -> {:.2} m, alpha {:.3}°",
                phase.phase,
                phase.direction,
                Self::format_time(phase.start_time),
                Self::format_time(phase.end_time),
                phase.start_depth,
                phase.end_depth,
                phase.angle_of_attack_deg
            );
        }
        info!(
            "Duration {}, depth range {:.2} m to {:.2} m, horizontal range {:.2} m",
            Self::format_time(self.duration),
            self.min_depth,
            self.max_depth,
            self.horizontal_range
        );
    }

    /// Column names for the CSV export: `time` then one column per slot.
    pub fn csv_header() -> Vec<String> {
        let mut header = Vec::with_capacity(STATE_DIM + 1);
        header.push("time".to_string());
        for block in StateBlock::ALL {
            for axis in 0..BLOCK_SIZE {
                header.push(format!("{}_{}", block.label(), axis + 1));
            }
        }
        header
    }

    /// Writes every sampled row, then the terminal state of the last phase.
    pub fn write_csv(trajectory: &Trajectory, path: &Path) -> Result<(), SimulationError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(Self::csv_header())?;

        let terminal = trajectory
            .phases()
            .last()
            .map(|p| (p.window.end, p.terminal_state));
        let rows = trajectory
            .times()
            .iter()
            .copied()
            .zip(trajectory.states().iter().copied())
            .chain(terminal);
        for (time, state) in rows {
            let mut record = Vec::with_capacity(STATE_DIM + 1);
            record.push(time.to_string());
            record.extend(state.as_slice().iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
