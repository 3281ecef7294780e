pub mod constants;
pub mod control;
pub mod errors;
pub mod telemetry_system;
pub mod trajectory_system;
pub mod utils;

pub use constants::*;
pub use control::configuration::GliderConfig;
pub use control::mission::GlideProfile;
pub use control::trim::{feasible_envelope, solve_trim, GlideDirection, GlideEnvelope, TrimState};
pub use errors::{ConfigError, IntegrationError, SimulationError, TrimError};

// Re-export commonly used items from trajectory_system
pub use trajectory_system::assembler::{
    build_trajectory, Trajectory, TrajectoryAssembler, TrajectoryBuilder,
};
pub use trajectory_system::dynamics::{EquationsOfMotion, RigidBodyKinematics};
pub use trajectory_system::integrator::{PhaseWindow, SegmentIntegrator, TrajectorySegment};
pub use trajectory_system::state::{GliderState, StateBlock};

// Re-export commonly used items from telemetry_system
pub use telemetry_system::telemetry::TrajectoryTelemetry;
pub use telemetry_system::trim_record::{JsonTrimRecorder, TrimRecord, TrimRecorder};

// Re-export commonly used utilities
pub use utils::vector3d::Vector3D;
