use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration value `{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Configuration value `{field}` is not finite")]
    NonFinite { field: &'static str },

    #[error("Invalid integration settings: {reason}")]
    InvalidIntegration { reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum TrimError {
    #[error("Glide angle of zero has no direction")]
    ZeroGlideAngle,

    #[error("Glide angle is not finite")]
    NonFiniteGlideAngle,

    #[error("Glide angle {angle_deg:.3}° is vertical or steeper")]
    VerticalGlideAngle { angle_deg: f64 },

    #[error(
        "Glide angle {angle_deg:.3}° is outside the feasible envelope (no steady glide between {lower_deg:.3}° and {upper_deg:.3}°)"
    )]
    OutsideEnvelope {
        angle_deg: f64,
        lower_deg: f64,
        upper_deg: f64,
    },

    #[error("Angle-of-attack discriminant is negative ({discriminant:.6}) at {angle_deg:.3}°")]
    NegativeDiscriminant { angle_deg: f64, discriminant: f64 },
}

#[derive(Debug, Error, PartialEq)]
pub enum IntegrationError {
    #[error("Derivative slot {slot} is not finite at t = {time}")]
    NonFiniteDerivative { time: f64, slot: usize },

    #[error("Integrated state is not finite at t = {time}")]
    NonFiniteState { time: f64 },

    #[error("Step size {step:e} collapsed below machine resolution at t = {time}")]
    StepSizeTooSmall { time: f64, step: f64 },

    #[error("Invalid phase window: {0}")]
    InvalidWindow(String),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Phase {phase}: trim failed: {source}")]
    Trim {
        phase: usize,
        #[source]
        source: TrimError,
    },

    #[error("Phase {phase}: integration failed: {source}")]
    Integration {
        phase: usize,
        #[source]
        source: IntegrationError,
    },

    #[error("Glide profile error: {0}")]
    ProfileError(String),

    #[error("Record error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Telemetry export error: {0}")]
    Csv(#[from] csv::Error),
}

impl SimulationError {
    /// Phase index of a failed build, when the failure belongs to one.
    pub fn phase(&self) -> Option<usize> {
        match self {
            SimulationError::Trim { phase, .. } | SimulationError::Integration { phase, .. } => {
                Some(*phase)
            }
            _ => None,
        }
    }
}
