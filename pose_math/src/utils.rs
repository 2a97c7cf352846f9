use glam::{EulerRot, Quat, Vec3A};

use crate::Velocity;

/// Builds an orientation from yaw (about +Y), pitch (about +X) and roll (about +Z) in degrees
pub fn quat_from_degrees(yaw: f32, pitch: f32, roll: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw.to_radians(),
        pitch.to_radians(),
        roll.to_radians(),
    )
}

/// True when both the linear and the angular speed are strictly below `threshold`
pub fn is_below(velocity: Velocity, threshold: f32) -> bool {
    velocity.linear.length() < threshold && velocity.angular.length() < threshold
}

/// Height of `point` above a horizontal plane at `plane_y`
pub fn height_above(point: Vec3A, plane_y: f32) -> f32 {
    point.y - plane_y
}
