// +X: Right, +Y: Up, +Z: Towards the viewer
// Tip-over axes are X and Z, rotation about Y (yaw) never tips an object over

pub mod constraints;
pub mod utils;

use glam::{Quat, Vec3A};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub use constraints::FreezeAxes;

/// A rigid transform in world space, or relative to some other pose
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    pub position: Vec3A,
    /// Unit quaternion
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3A::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3A, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: Vec3A) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
        }
    }

    /// `self ∘ offset`, treats `offset` as expressed in the local frame of `self`
    pub fn compose(self, offset: Pose) -> Pose {
        Pose {
            position: self.position + self.orientation * offset.position,
            orientation: (self.orientation * offset.orientation).normalize(),
        }
    }

    pub fn inverse(self) -> Pose {
        let orientation = self.orientation.inverse();

        Pose {
            position: orientation * -self.position,
            orientation,
        }
    }

    /// The offset of `self` in the local frame of `host`
    ///
    /// `host.compose(self.relative_to(host))` is `self` again
    #[instrument(level = "trace", ret)]
    pub fn relative_to(self, host: Pose) -> Pose {
        host.inverse().compose(self)
    }

    pub fn abs_diff_eq(&self, other: &Pose, max_abs_diff: f32) -> bool {
        // q and -q are the same rotation
        self.position.abs_diff_eq(other.position, max_abs_diff)
            && (self.orientation.abs_diff_eq(other.orientation, max_abs_diff)
                || self.orientation.abs_diff_eq(-other.orientation, max_abs_diff))
    }
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    /// m/s
    pub linear: Vec3A,
    /// rad/s
    pub angular: Vec3A,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity {
        linear: Vec3A::ZERO,
        angular: Vec3A::ZERO,
    };

    pub fn new(linear: Vec3A, angular: Vec3A) -> Self {
        Self { linear, angular }
    }

    pub fn linear(linear: Vec3A) -> Self {
        Self {
            linear,
            angular: Vec3A::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use glam::vec3a;

    use super::*;

    #[test]
    fn compose_rotates_offset_into_host_frame() {
        let host = Pose::new(vec3a(1.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let offset = Pose::from_position(vec3a(0.0, 0.0, 1.0));

        let world = host.compose(offset);

        // Quarter turn about +Y sends +Z to +X
        assert!(world.position.abs_diff_eq(vec3a(2.0, 0.0, 0.0), 1e-5));
        assert!(world
            .orientation
            .abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2), 1e-5));
    }

    #[test]
    fn relative_to_inverts_compose() {
        let host = Pose::new(
            vec3a(0.3, 1.2, -4.0),
            Quat::from_euler(glam::EulerRot::YXZ, 0.7, -0.2, 1.1),
        );
        let child = Pose::new(
            vec3a(-2.0, 0.5, 0.25),
            Quat::from_euler(glam::EulerRot::YXZ, -1.3, 0.4, 0.05),
        );

        let offset = child.relative_to(host);
        assert!(host.compose(offset).abs_diff_eq(&child, 1e-5));
    }

    #[test]
    fn inverse_cancels() {
        let pose = Pose::new(vec3a(5.0, -1.0, 2.0), Quat::from_rotation_x(0.9));

        assert!(pose.compose(pose.inverse()).abs_diff_eq(&Pose::IDENTITY, 1e-5));
        assert!(pose.inverse().compose(pose).abs_diff_eq(&Pose::IDENTITY, 1e-5));
    }

    #[test]
    fn pose_equality_ignores_quaternion_sign() {
        let a = Pose::new(Vec3A::ONE, Quat::from_rotation_z(0.5));
        let b = Pose::new(Vec3A::ONE, -Quat::from_rotation_z(0.5));

        assert!(a.abs_diff_eq(&b, 1e-6));
    }
}
