//! Per-phase trim records and the sinks that persist them.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::to_writer_pretty;
use tracing::debug;

use crate::control::configuration::GliderConfig;
use crate::control::trim::{GlideDirection, TrimState};
use crate::errors::SimulationError;

/// Trim solution of one phase with the configuration it was solved against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimRecord {
    pub phase: usize,
    pub glide_dir: GlideDirection,
    pub glide_angle_deg: f64,
    pub alpha_deg: f64,
    pub theta_deg: f64,
    pub lim_lower_deg: f64,
    pub lim_upper_deg: f64,
    pub mb_d: f64,
    pub m0_d: f64,
    pub v1_d: f64,
    pub v3_d: f64,
    pub rp1_d: f64,
    pub pp1_d: f64,
    pub pp3_d: f64,
    pub ballast_rate: f64,
    pub rp3: f64,
    pub rb1: f64,
    pub rb3: f64,
    pub phi: f64,
    pub theta0: f64,
    pub psi: f64,
    pub mf: [f64; 3],
    pub m: [f64; 3],
    pub j: [f64; 3],
    pub kl: f64,
    pub kl0: f64,
    pub kd: f64,
    pub kd0: f64,
    pub km: f64,
    pub km0: f64,
    pub k_omega1: f64,
    pub k_omega2: f64,
    pub desired_glide_speed: f64,
    pub mh: f64,
    pub mw: f64,
    pub mb: f64,
    pub mm: f64,
    pub ms: f64,
    pub m_displaced: f64,
    pub m0: f64,
    pub mt: f64,
}

impl TrimRecord {
    pub fn new(phase: usize, config: &GliderConfig, trim: &TrimState) -> Self {
        let h = &config.hydrodynamics;
        let mass = &config.mass;
        let attitude = config.initial_attitude();

        TrimRecord {
            phase,
            glide_dir: trim.direction,
            glide_angle_deg: trim.glide_angle.to_degrees(),
            alpha_deg: trim.angle_of_attack.to_degrees(),
            theta_deg: trim.pitch.to_degrees(),
            lim_lower_deg: trim.envelope.lower.to_degrees(),
            lim_upper_deg: trim.envelope.upper.to_degrees(),
            mb_d: trim.ballast_mass,
            m0_d: trim.buoyancy_offset,
            v1_d: trim.v_forward,
            v3_d: trim.v_vertical,
            rp1_d: trim.movable_mass_offset,
            pp1_d: trim.movable_mass_momentum.x,
            pp3_d: trim.movable_mass_momentum.z,
            ballast_rate: trim.ballast_rate,
            rp3: config.geometry.rp3,
            rb1: config.geometry.rb1,
            rb3: config.geometry.rb3,
            phi: attitude.x,
            theta0: attitude.y,
            psi: attitude.z,
            mf: mass.added_mass,
            m: config.mass_matrix(),
            j: config.inertia_matrix(),
            kl: h.kl,
            kl0: h.kl0,
            kd: h.kd,
            kd0: h.kd0,
            km: h.km,
            km0: h.km0,
            k_omega1: h.k_omega1,
            k_omega2: h.k_omega2,
            desired_glide_speed: config.glide.speed,
            mh: mass.hull,
            mw: mass.fixed_point,
            mb: mass.ballast,
            mm: mass.movable,
            ms: config.structural_mass(),
            m_displaced: mass.fluid_displaced,
            m0: config.buoyancy_offset(),
            mt: config.total_mass(),
        }
    }
}

/// Sink for trim records emitted as each phase is solved.
pub trait TrimRecorder {
    fn record(&mut self, record: &TrimRecord) -> Result<(), SimulationError>;
}

impl TrimRecorder for Vec<TrimRecord> {
    fn record(&mut self, record: &TrimRecord) -> Result<(), SimulationError> {
        self.push(record.clone());
        Ok(())
    }
}

/// Writes `trim_phase_<n>.json` files into a directory.
#[derive(Debug, Clone)]
pub struct JsonTrimRecorder {
    directory: PathBuf,
}

impl JsonTrimRecorder {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        JsonTrimRecorder {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, phase: usize) -> PathBuf {
        self.directory.join(format!("trim_phase_{}.json", phase))
    }
}

impl TrimRecorder for JsonTrimRecorder {
    fn record(&mut self, record: &TrimRecord) -> Result<(), SimulationError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(record.phase);
        to_writer_pretty(BufWriter::new(File::create(&path)?), record)?;
        debug!(path = %path.display(), "Trim record written");
        Ok(())
    }
}
