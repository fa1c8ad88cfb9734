//! Rotation helpers shared by the asset pipeline and the viewers
use nalgebra::{Matrix4, Rotation3, Vector3};

/// Rotation from an axis-angle vector: the direction is the axis and the
/// length is the angle in radians. A zero vector yields the identity.
pub fn rotation_from_axis_angle(axis_angle: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::new(*axis_angle)
}

/// Interactive model orientation as roll/pitch/yaw (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EulerAngles {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl EulerAngles {
    pub fn new(roll: f32, pitch: f32, yaw: f32) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn nudge(&mut self, droll: f32, dpitch: f32, dyaw: f32) {
        self.roll += droll;
        self.pitch += dpitch;
        self.yaw += dyaw;
    }

    /// Homogeneous model matrix applying roll about X, then pitch about Y,
    /// then yaw about Z
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Rotation3::from_euler_angles(self.roll, self.pitch, self.yaw).to_homogeneous()
    }
}
