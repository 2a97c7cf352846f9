use bitflags::bitflags;
use glam::{vec3a, Vec3A};
use serde::{Deserialize, Serialize};

use crate::Velocity;

bitflags! {
    /// Per axis motion locks of a rigid body
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FreezeAxes: u8 {
        const POSITION_X = 1 << 0;
        const POSITION_Y = 1 << 1;
        const POSITION_Z = 1 << 2;
        const ROTATION_X = 1 << 3;
        const ROTATION_Y = 1 << 4;
        const ROTATION_Z = 1 << 5;

        const POSITION =
            Self::POSITION_X.bits() | Self::POSITION_Y.bits() | Self::POSITION_Z.bits();
        const ROTATION =
            Self::ROTATION_X.bits() | Self::ROTATION_Y.bits() | Self::ROTATION_Z.bits();
        const ALL = Self::POSITION.bits() | Self::ROTATION.bits();

        /// Locks the two axes an upright object tips over on, leaves yaw and all translation free
        const TIP_OVER = Self::ROTATION_X.bits() | Self::ROTATION_Z.bits();
    }
}

impl FreezeAxes {
    pub const NONE: FreezeAxes = FreezeAxes::empty();

    pub fn linear_mask(&self) -> Vec3A {
        vec3a(
            mask(self.contains(Self::POSITION_X)),
            mask(self.contains(Self::POSITION_Y)),
            mask(self.contains(Self::POSITION_Z)),
        )
    }

    pub fn angular_mask(&self) -> Vec3A {
        vec3a(
            mask(self.contains(Self::ROTATION_X)),
            mask(self.contains(Self::ROTATION_Y)),
            mask(self.contains(Self::ROTATION_Z)),
        )
    }

    /// Zeroes every velocity component that is locked
    pub fn apply(&self, velocity: Velocity) -> Velocity {
        Velocity {
            linear: velocity.linear * self.linear_mask(),
            angular: velocity.angular * self.angular_mask(),
        }
    }
}

fn mask(frozen: bool) -> f32 {
    if frozen {
        0.0
    } else {
        1.0
    }
}
