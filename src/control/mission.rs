use crate::control::configuration::GliderConfig;
use crate::errors::{SimulationError, TrimError};

/// Ordered glide-path angles (radians), one per phase.
#[derive(Clone, Debug, PartialEq)]
pub struct GlideProfile {
    angles: Vec<f64>,
}

impl GlideProfile {
    pub fn new(angles: Vec<f64>) -> Self {
        GlideProfile { angles }
    }

    /// Alternating dive/climb sequence starting with a dive.
    pub fn sawtooth(magnitude: f64, phases: usize) -> Self {
        let magnitude = magnitude.abs();
        let angles = (0..phases)
            .map(|i| if i % 2 == 0 { -magnitude } else { magnitude })
            .collect();
        GlideProfile { angles }
    }

    pub fn from_config(config: &GliderConfig, phases: usize) -> Self {
        Self::sawtooth(config.glide_angle(), phases)
    }

    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Rejects profiles no phase could run with: empty, zero or non-finite angles.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.angles.is_empty() {
            return Err(SimulationError::ProfileError(
                "glide profile has no phases".to_string(),
            ));
        }
        for (phase, angle) in self.angles.iter().enumerate() {
            if *angle == 0.0 {
                return Err(SimulationError::Trim {
                    phase,
                    source: TrimError::ZeroGlideAngle,
                });
            }
            if !angle.is_finite() {
                return Err(SimulationError::Trim {
                    phase,
                    source: TrimError::NonFiniteGlideAngle,
                });
            }
        }
        Ok(())
    }
}
