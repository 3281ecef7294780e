// Physical Constants
pub const GRAVITY: f64 = 9.81; // m/s²

// State Layout
pub const BLOCK_SIZE: usize = 3;
pub const STATE_BLOCKS: usize = 9;
pub const STATE_DIM: usize = BLOCK_SIZE * STATE_BLOCKS;

// Phase Windows
pub const PHASE_WINDOW: f64 = 375.0; // s per glide phase
pub const SAMPLES_PER_PHASE: usize = 50;

// Integrator Tolerances
pub const DEFAULT_RTOL: f64 = 1e-3;
pub const DEFAULT_ATOL: f64 = 1e-6;

// Step Control
pub const STEP_SAFETY: f64 = 0.9;
pub const MIN_STEP_FACTOR: f64 = 0.2;
pub const MAX_STEP_FACTOR: f64 = 10.0;

// Reference Profile
pub const DEFAULT_PHASES: usize = 4;
