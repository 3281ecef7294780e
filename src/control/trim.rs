//! Steady-glide trim: closed-form lift/drag/moment balance for a commanded
//! glide-path angle.

use std::f64::consts::FRAC_PI_2;

use tracing::{debug, info};

use crate::constants::GRAVITY;
use crate::control::configuration::GliderConfig;
use crate::errors::TrimError;
use crate::utils::vector3d::Vector3D;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum GlideDirection {
    Ascend,
    Descend,
}

impl GlideDirection {
    pub fn from_angle(glide_angle: f64) -> Option<Self> {
        if glide_angle > 0.0 {
            Some(GlideDirection::Ascend)
        } else if glide_angle < 0.0 {
            Some(GlideDirection::Descend)
        } else {
            None
        }
    }

    /// Sign of the ballast flow: expel to climb, take on to dive.
    pub fn ballast_flow_sign(self) -> f64 {
        match self {
            GlideDirection::Ascend => -1.0,
            GlideDirection::Descend => 1.0,
        }
    }
}

/// Shallowest achievable dive (`lower`) and climb (`upper`) angles, radians.
///
/// Steady flight needs `angle >= upper` or `angle <= lower`; the open band
/// between the bounds, around level flight, has no real angle of attack.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlideEnvelope {
    pub lower: f64,
    pub upper: f64,
}

impl GlideEnvelope {
    pub fn admits(&self, glide_angle: f64) -> bool {
        glide_angle >= self.upper || glide_angle <= self.lower
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrimState {
    pub glide_angle: f64,
    pub direction: GlideDirection,
    /// Signed ballast pumping rate for this phase.
    pub ballast_rate: f64,
    pub angle_of_attack: f64,
    pub ballast_mass: f64,
    pub buoyancy_offset: f64,
    pub pitch: f64,
    pub v_forward: f64,
    pub v_vertical: f64,
    /// Longitudinal trim offset of the movable mass (rp1).
    pub movable_mass_offset: f64,
    pub movable_mass_momentum: Vector3D,
    pub envelope: GlideEnvelope,
}

pub fn feasible_envelope(config: &GliderConfig) -> GlideEnvelope {
    let h = &config.hydrodynamics;
    let lift_ratio = h.kl0 / h.kl;
    let root = (lift_ratio.powi(2) + h.kd0 / h.kd).sqrt();
    let scale = 2.0 * (h.kd / h.kl);

    GlideEnvelope {
        lower: (scale * (lift_ratio - root)).atan(),
        upper: (scale * (lift_ratio + root)).atan(),
    }
}

/// Body-frame (forward, vertical) velocity at speed `speed` and angle of
/// attack `alpha`.
pub fn trim_velocity(speed: f64, alpha: f64) -> (f64, f64) {
    (speed * alpha.cos(), speed * alpha.sin())
}

/// Value under the square root of the angle-of-attack solution.
pub fn aoa_discriminant(config: &GliderConfig, glide_angle: f64) -> f64 {
    let h = &config.hydrodynamics;
    let cot = 1.0 / glide_angle.tan();
    1.0 - 4.0 * (h.kd / h.kl.powi(2)) * cot * (h.kd0 * cot + h.kl0)
}

pub fn solve_trim(config: &GliderConfig, glide_angle: f64) -> Result<TrimState, TrimError> {
    if glide_angle == 0.0 {
        return Err(TrimError::ZeroGlideAngle);
    }
    if !glide_angle.is_finite() {
        return Err(TrimError::NonFiniteGlideAngle);
    }
    if glide_angle.abs() >= FRAC_PI_2 {
        return Err(TrimError::VerticalGlideAngle {
            angle_deg: glide_angle.to_degrees(),
        });
    }
    let direction = GlideDirection::from_angle(glide_angle).ok_or(TrimError::ZeroGlideAngle)?;

    let envelope = feasible_envelope(config);
    debug!(
        lower_deg = envelope.lower.to_degrees(),
        upper_deg = envelope.upper.to_degrees(),
        "Glide envelope"
    );
    if !envelope.admits(glide_angle) {
        return Err(TrimError::OutsideEnvelope {
            angle_deg: glide_angle.to_degrees(),
            lower_deg: envelope.lower.to_degrees(),
            upper_deg: envelope.upper.to_degrees(),
        });
    }

    // Both checks are kept; they meet at the envelope bounds.
    let discriminant = aoa_discriminant(config, glide_angle);
    if discriminant < 0.0 {
        return Err(TrimError::NegativeDiscriminant {
            angle_deg: glide_angle.to_degrees(),
            discriminant,
        });
    }

    let h = &config.hydrodynamics;
    let m = &config.mass;
    let speed = config.glide.speed;
    let e = glide_angle;

    // Negative root: the lower-drag solution.
    let alpha = 0.5 * (h.kl / h.kd) * e.tan() * (-1.0 + discriminant.sqrt());

    let ballast_mass = (m.fluid_displaced - m.hull - m.movable)
        + (1.0 / GRAVITY)
            * (-e.sin() * (h.kd0 + h.kd * alpha.powi(2)) + e.cos() * (h.kl0 + h.kl * alpha))
            * speed.powi(2);
    let buoyancy_offset = ballast_mass + m.hull + m.movable - m.fluid_displaced;

    let pitch = e + alpha;
    let (v_forward, v_vertical) = trim_velocity(speed, alpha);

    let rp3 = config.geometry.rp3;
    let movable_mass_offset = -rp3 * pitch.tan()
        + (1.0 / (m.movable * GRAVITY * pitch.cos()))
            * ((m.added_mass[2] - m.added_mass[0]) * v_forward * v_vertical
                + (h.km0 + h.km * alpha) * speed.powi(2));

    let trim = TrimState {
        glide_angle,
        direction,
        ballast_rate: direction.ballast_flow_sign() * config.glide.ballast_rate.abs(),
        angle_of_attack: alpha,
        ballast_mass,
        buoyancy_offset,
        pitch,
        v_forward,
        v_vertical,
        movable_mass_offset,
        movable_mass_momentum: Vector3D::new(m.movable * v_forward, 0.0, m.movable * v_vertical),
        envelope,
    };

    info!(
        direction = ?trim.direction,
        glide_angle_deg = glide_angle.to_degrees(),
        alpha_deg = alpha.to_degrees(),
        "Trim solved"
    );

    Ok(trim)
}
