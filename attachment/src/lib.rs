//! Attach, detach and settle tracking for grabbable scene objects
//!
//! Engine agnostic: bodies, spatial queries and reparent permissions are
//! reached through the traits in [`provider`].

pub mod config;
pub mod constraints;
pub mod controller;
pub mod error;
pub mod provider;
pub mod record;
pub mod settle;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub use config::SettleConfig;
pub use constraints::{ConstraintState, Phase, SettleCause};
pub use controller::{AttachmentController, TickReport};
pub use error::{AttachError, AttachResult};
pub use provider::{GroundProbe, PhysicsProvider, SceneAuthority};
pub use record::AttachmentRecord;

/// Handle of a scene object, entities and hosts share one id space
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
