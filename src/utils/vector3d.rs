use std::ops::Sub;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3D {
    pub const ZERO: Vector3D = Vector3D {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D { x, y, z }
    }

    pub fn from_slice(values: &[f64]) -> Self {
        Vector3D::new(values[0], values[1], values[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// Rotates a body-frame vector into the inertial frame for Z-Y-X
    /// (yaw, pitch, roll) Euler angles, with z pointing down.
    pub fn body_to_inertial(&self, roll: f64, pitch: f64, yaw: f64) -> Vector3D {
        let (sf, cf) = roll.sin_cos();
        let (st, ct) = pitch.sin_cos();
        let (sp, cp) = yaw.sin_cos();

        Vector3D::new(
            cp * ct * self.x + (cp * st * sf - sp * cf) * self.y + (cp * st * cf + sp * sf) * self.z,
            sp * ct * self.x + (sp * st * sf + cp * cf) * self.y + (sp * st * cf - cp * sf) * self.z,
            -st * self.x + ct * sf * self.y + ct * cf * self.z,
        )
    }
}

impl Sub for Vector3D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Vector3D::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}
