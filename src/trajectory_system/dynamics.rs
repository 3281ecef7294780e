use crate::trajectory_system::state::{GliderState, StateBlock};
use crate::utils::vector3d::Vector3D;

/// Time derivative of the full state. Implementations must be pure: the same
/// `(time, state)` always yields the same derivative.
pub trait EquationsOfMotion {
    fn derivative(&self, time: f64, state: &GliderState) -> GliderState;
}

impl<F> EquationsOfMotion for F
where
    F: Fn(f64, &GliderState) -> GliderState,
{
    fn derivative(&self, time: f64, state: &GliderState) -> GliderState {
        self(time, state)
    }
}

/// Rigid-body kinematics with no force model: position follows the body
/// velocity rotated into the inertial frame, Euler angles follow the body
/// angular velocity, every other block is held constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct RigidBodyKinematics;

impl RigidBodyKinematics {
    /// Z-Y-X Euler angle rates for body angular velocity `omega`.
    /// Non-finite at ±90° pitch.
    pub fn euler_rates(orientation: Vector3D, omega: Vector3D) -> Vector3D {
        let (sf, cf) = orientation.x.sin_cos();
        let theta = orientation.y;
        let (p, q, r) = (omega.x, omega.y, omega.z);

        Vector3D::new(
            p + (q * sf + r * cf) * theta.tan(),
            q * cf - r * sf,
            (q * sf + r * cf) / theta.cos(),
        )
    }
}

impl EquationsOfMotion for RigidBodyKinematics {
    fn derivative(&self, _time: f64, state: &GliderState) -> GliderState {
        let orientation = state.orientation();
        let position_rate =
            state
                .velocity()
                .body_to_inertial(orientation.x, orientation.y, orientation.z);
        let orientation_rate = Self::euler_rates(orientation, state.angular_velocity());

        GliderState::zeros()
            .with_block(StateBlock::Position, position_rate)
            .with_block(StateBlock::Orientation, orientation_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resting_vehicle_has_zero_derivative() {
        let derivative = RigidBodyKinematics.derivative(0.0, &GliderState::zeros());
        assert_eq!(derivative, GliderState::zeros());
    }

    #[test]
    fn test_nose_down_glide_gains_depth() {
        let state = GliderState::zeros()
            .with_block(
                StateBlock::Orientation,
                Vector3D::new(0.0, -25.0_f64.to_radians(), 0.0),
            )
            .with_block(StateBlock::Velocity, Vector3D::new(0.3, 0.0, 0.0));
        let derivative = RigidBodyKinematics.derivative(10.0, &state);
        let rate = derivative.position();

        assert!(rate.x > 0.0);
        assert!(rate.z > 0.0);
        assert_relative_eq!(rate.magnitude(), 0.3, epsilon = 1e-12);
        assert_eq!(derivative.velocity(), Vector3D::ZERO);
    }

    #[test]
    fn test_pitch_rate_integrates_into_pitch() {
        let rates = RigidBodyKinematics::euler_rates(
            Vector3D::ZERO,
            Vector3D::new(0.0, 0.01, 0.0),
        );
        assert_relative_eq!(rates.y, 0.01);
        assert_relative_eq!(rates.x, 0.0);
        assert_relative_eq!(rates.z, 0.0);
    }

    #[test]
    fn test_closures_are_equations_of_motion() {
        let decay = |_t: f64, s: &GliderState| GliderState::zeros().axpy(-1.0, s);
        let state = GliderState::zeros().with_block(StateBlock::Position, Vector3D::new(1.0, 2.0, 3.0));

        assert_eq!(
            decay.derivative(0.0, &state).position(),
            Vector3D::new(-1.0, -2.0, -3.0)
        );
    }
}
