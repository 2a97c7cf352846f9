use pose_math::Pose;
use serde::{Deserialize, Serialize};

use crate::ObjectId;

/// Relationship between one entity and the host it follows
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttachmentRecord {
    pub host: ObjectId,
    /// Entity pose in the host's local frame, captured at attach time
    pub offset: Pose,
    pub active: bool,
}

impl AttachmentRecord {
    /// Captures the current relative pose, never reuses an older offset
    pub fn track(entity_pose: Pose, host: ObjectId, host_pose: Pose) -> Self {
        Self {
            host,
            offset: entity_pose.relative_to(host_pose),
            active: true,
        }
    }

    /// World pose of the entity for the given host pose, `None` once inactive
    pub fn follow(&self, host_pose: Pose) -> Option<Pose> {
        self.active.then(|| host_pose.compose(self.offset))
    }
}
