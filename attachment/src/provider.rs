//! Capabilities the host engine lends to the controller
//!
//! The controller never owns world state. Every operation borrows the
//! collaborators it needs for the duration of the call, so an engine can back
//! these traits with whatever storage it already has.

use pose_math::{FreezeAxes, Pose, Velocity};

use crate::ObjectId;

/// Rigid body and transform access
pub trait PhysicsProvider {
    /// Whether `id` has the body the controller drives. Checked once at registration
    fn has_body(&self, id: ObjectId) -> bool;

    fn pose(&self, id: ObjectId) -> Option<Pose>;
    fn set_pose(&mut self, id: ObjectId, pose: Pose);

    fn velocity(&self, id: ObjectId) -> Option<Velocity>;
    fn set_velocity(&mut self, id: ObjectId, velocity: Velocity);

    fn set_gravity(&mut self, id: ObjectId, enabled: bool);
    fn set_constraints(&mut self, id: ObjectId, frozen: FreezeAxes);
}

/// Spatial query used by the optional ground proximity check of the settle watchdog
pub trait GroundProbe {
    /// Distance from `pose` down to the nearest ground, `None` if nothing is below
    fn ground_distance(&self, pose: &Pose) -> Option<f32>;
}

/// Probe for scenes without a ground reference
#[derive(Debug, Copy, Clone, Default)]
pub struct NoGround;

impl GroundProbe for NoGround {
    fn ground_distance(&self, _pose: &Pose) -> Option<f32> {
        None
    }
}

/// Horizontal ground plane at a fixed height
#[derive(Debug, Copy, Clone, Default)]
pub struct GroundPlane(pub f32);

impl GroundProbe for GroundPlane {
    fn ground_distance(&self, pose: &Pose) -> Option<f32> {
        let height = pose_math::utils::height_above(pose.position, self.0);
        (height >= 0.0).then_some(height)
    }
}

/// Decides whether a reparent may happen right now, e.g. while a shared session is not live
pub trait SceneAuthority: Send + Sync {
    fn can_reparent(&self, entity: ObjectId, host: ObjectId) -> bool;
}

/// Authority for single user scenes, never vetoes
#[derive(Debug, Copy, Clone, Default)]
pub struct AlwaysActive;

impl SceneAuthority for AlwaysActive {
    fn can_reparent(&self, _entity: ObjectId, _host: ObjectId) -> bool {
        true
    }
}
