//! Vehicle configuration: masses, hydrodynamic coefficients, geometry and
//! the glide/attitude/integration settings a trajectory build reads.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_ATOL, DEFAULT_RTOL, PHASE_WINDOW, SAMPLES_PER_PHASE};
use crate::errors::ConfigError;
use crate::utils::vector3d::Vector3D;

/// Mass properties of the vehicle (kg, kg·m²).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassConfig {
    pub hull: f64,
    pub fixed_point: f64,
    pub ballast: f64,
    pub movable: f64,
    pub fluid_displaced: f64,
    /// Added-mass diagonal (MF1, MF2, MF3).
    pub added_mass: [f64; 3],
    /// Added-inertia diagonal (J1, J2, J3).
    pub inertia: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrodynamicsConfig {
    pub kl: f64,
    pub kl0: f64,
    pub kd: f64,
    pub kd0: f64,
    pub km: f64,
    pub km0: f64,
    pub k_omega1: f64,
    pub k_omega2: f64,
}

/// Body-axis offsets of the internal masses (m).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Fixed vertical offset of the movable mass.
    pub rp3: f64,
    pub rb1: f64,
    pub rb3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlideConfig {
    /// Magnitude of the commanded glide-path angle, degrees.
    pub angle_deg: f64,
    /// Desired steady glide speed, m/s.
    pub speed: f64,
    /// Nominal ballast pumping rate magnitude, kg/s.
    pub ballast_rate: f64,
}

/// Initial orientation, degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttitudeConfig {
    pub phi_deg: f64,
    pub theta_deg: f64,
    pub psi_deg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default = "default_window")]
    pub window: f64,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    pub atol: f64,
}

fn default_window() -> f64 {
    PHASE_WINDOW
}

fn default_samples() -> usize {
    SAMPLES_PER_PHASE
}

fn default_rtol() -> f64 {
    DEFAULT_RTOL
}

fn default_atol() -> f64 {
    DEFAULT_ATOL
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        IntegrationConfig {
            window: PHASE_WINDOW,
            samples: SAMPLES_PER_PHASE,
            rtol: DEFAULT_RTOL,
            atol: DEFAULT_ATOL,
        }
    }
}

/// Immutable parameter bundle for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GliderConfig {
    pub name: String,
    pub mass: MassConfig,
    pub hydrodynamics: HydrodynamicsConfig,
    pub geometry: GeometryConfig,
    pub glide: GlideConfig,
    pub attitude: AttitudeConfig,
    #[serde(default)]
    pub integration: IntegrationConfig,
}

impl GliderConfig {
    /// Reference Slocum vehicle.
    pub fn slocum() -> Self {
        GliderConfig {
            name: "SLOCUM".to_string(),
            mass: MassConfig {
                hull: 40.0,
                fixed_point: 0.5,
                ballast: 1.0,
                movable: 9.0,
                fluid_displaced: 50.0,
                added_mass: [5.0, 60.0, 70.0],
                inertia: [4.0, 12.0, 11.0],
            },
            hydrodynamics: HydrodynamicsConfig {
                kl: 132.5,
                kl0: 0.0,
                kd: 25.0,
                kd0: 2.15,
                km: -100.0,
                km0: 0.0,
                k_omega1: -50.0,
                k_omega2: -50.0,
            },
            geometry: GeometryConfig {
                rp3: 0.05,
                rb1: 0.0,
                rb3: 0.0,
            },
            glide: GlideConfig {
                angle_deg: 25.0,
                speed: 0.3,
                ballast_rate: 0.001,
            },
            attitude: AttitudeConfig {
                phi_deg: 0.0,
                theta_deg: -22.0,
                psi_deg: 0.0,
            },
            integration: IntegrationConfig::default(),
        }
    }

    /// Reads a TOML configuration and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(path = %path.display(), vehicle = %config.name, "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GliderConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let m = &self.mass;
        let positive = [
            ("mass.hull", m.hull),
            ("mass.fixed_point", m.fixed_point),
            ("mass.ballast", m.ballast),
            ("mass.movable", m.movable),
            ("mass.fluid_displaced", m.fluid_displaced),
            ("mass.added_mass[0]", m.added_mass[0]),
            ("mass.added_mass[1]", m.added_mass[1]),
            ("mass.added_mass[2]", m.added_mass[2]),
            ("mass.inertia[0]", m.inertia[0]),
            ("mass.inertia[1]", m.inertia[1]),
            ("mass.inertia[2]", m.inertia[2]),
            ("hydrodynamics.kl", self.hydrodynamics.kl),
            ("hydrodynamics.kd", self.hydrodynamics.kd),
            ("hydrodynamics.kd0", self.hydrodynamics.kd0),
            ("glide.speed", self.glide.speed),
        ];
        for (field, value) in positive {
            check_finite(field, value)?;
            if value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        let h = &self.hydrodynamics;
        let finite = [
            ("hydrodynamics.kl0", h.kl0),
            ("hydrodynamics.km", h.km),
            ("hydrodynamics.km0", h.km0),
            ("hydrodynamics.k_omega1", h.k_omega1),
            ("hydrodynamics.k_omega2", h.k_omega2),
            ("geometry.rp3", self.geometry.rp3),
            ("geometry.rb1", self.geometry.rb1),
            ("geometry.rb3", self.geometry.rb3),
            ("glide.angle_deg", self.glide.angle_deg),
            ("glide.ballast_rate", self.glide.ballast_rate),
            ("attitude.phi_deg", self.attitude.phi_deg),
            ("attitude.theta_deg", self.attitude.theta_deg),
            ("attitude.psi_deg", self.attitude.psi_deg),
        ];
        for (field, value) in finite {
            check_finite(field, value)?;
        }

        let integration = &self.integration;
        if !(integration.window.is_finite() && integration.window > 0.0) {
            return Err(ConfigError::InvalidIntegration {
                reason: format!("window must be positive, got {}", integration.window),
            });
        }
        if integration.samples < 2 {
            return Err(ConfigError::InvalidIntegration {
                reason: format!("at least 2 samples required, got {}", integration.samples),
            });
        }
        if !(integration.rtol > 0.0 && integration.atol > 0.0) {
            return Err(ConfigError::InvalidIntegration {
                reason: "tolerances must be positive".to_string(),
            });
        }

        Ok(())
    }

    /// Hull, fixed-point and ballast mass.
    pub fn structural_mass(&self) -> f64 {
        self.mass.hull + self.mass.fixed_point + self.mass.ballast
    }

    pub fn total_mass(&self) -> f64 {
        self.structural_mass() + self.mass.movable
    }

    /// Net weight in excess of the displaced fluid.
    pub fn buoyancy_offset(&self) -> f64 {
        self.total_mass() - self.mass.fluid_displaced
    }

    /// Rigid-body mass matrix diagonal, `hull·I + Mf`.
    pub fn mass_matrix(&self) -> [f64; 3] {
        let mf = self.mass.added_mass;
        [
            self.mass.hull + mf[0],
            self.mass.hull + mf[1],
            self.mass.hull + mf[2],
        ]
    }

    pub fn inertia_matrix(&self) -> [f64; 3] {
        self.mass.inertia
    }

    pub fn glide_angle(&self) -> f64 {
        self.glide.angle_deg.to_radians()
    }

    /// Initial (roll, pitch, yaw) in radians.
    pub fn initial_attitude(&self) -> Vector3D {
        Vector3D::new(
            self.attitude.phi_deg.to_radians(),
            self.attitude.theta_deg.to_radians(),
            self.attitude.psi_deg.to_radians(),
        )
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field })
    }
}
