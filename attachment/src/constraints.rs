//! Mapping from attachment phase to the physics flags of a body
//!
//! Nothing else in the controller writes gravity or freeze flags, every
//! transition goes through [`ConstraintState::for_phase`] and [`apply`].

use pose_math::FreezeAxes;
use serde::{Deserialize, Serialize};

use crate::{provider::PhysicsProvider, ObjectId};

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Loose in the scene, `resting` once the settle watchdog froze it
    Free { resting: bool },
    Attached,
    Grabbed,
    /// Falling or sliding with the settle watchdog armed
    Settling(SettleCause),
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SettleCause {
    Detached,
    Released,
}

impl Phase {
    pub const FREE: Phase = Phase::Free { resting: false };
    pub const RESTING: Phase = Phase::Free { resting: true };

    pub fn is_grabbed(&self) -> bool {
        matches!(self, Phase::Grabbed)
    }

    pub fn is_settling(&self) -> bool {
        matches!(self, Phase::Settling(_))
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConstraintState {
    pub gravity: bool,
    pub frozen: FreezeAxes,
}

impl ConstraintState {
    pub const fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Free { resting: false } => Self {
                gravity: true,
                frozen: FreezeAxes::NONE,
            },
            Phase::Free { resting: true } => Self {
                gravity: true,
                frozen: FreezeAxes::ALL,
            },
            Phase::Attached => Self {
                gravity: false,
                frozen: FreezeAxes::ALL,
            },
            // The holder drives the body, physics must not fight it
            Phase::Grabbed => Self {
                gravity: false,
                frozen: FreezeAxes::NONE,
            },
            Phase::Settling(SettleCause::Detached) => Self {
                gravity: true,
                frozen: FreezeAxes::NONE,
            },
            Phase::Settling(SettleCause::Released) => Self {
                gravity: true,
                frozen: FreezeAxes::TIP_OVER,
            },
        }
    }
}

pub(crate) fn apply<P: PhysicsProvider + ?Sized>(physics: &mut P, id: ObjectId, phase: Phase) {
    let state = ConstraintState::for_phase(phase);

    physics.set_gravity(id, state.gravity);
    physics.set_constraints(id, state.frozen);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_settling_and_free_bodies_fall() {
        let falling = [
            Phase::FREE,
            Phase::RESTING,
            Phase::Settling(SettleCause::Detached),
            Phase::Settling(SettleCause::Released),
        ];

        for phase in falling {
            assert!(ConstraintState::for_phase(phase).gravity, "{phase:?}");
        }

        assert!(!ConstraintState::for_phase(Phase::Attached).gravity);
        assert!(!ConstraintState::for_phase(Phase::Grabbed).gravity);
    }

    #[test]
    fn released_bodies_can_fall_but_not_tip() {
        let state = ConstraintState::for_phase(Phase::Settling(SettleCause::Released));

        assert_eq!(state.frozen, FreezeAxes::TIP_OVER);
        assert!(!state.frozen.contains(FreezeAxes::POSITION_Y));
    }

    #[test]
    fn held_and_attached_are_opposites() {
        assert_eq!(
            ConstraintState::for_phase(Phase::Grabbed).frozen,
            FreezeAxes::NONE
        );
        assert_eq!(
            ConstraintState::for_phase(Phase::Attached).frozen,
            FreezeAxes::ALL
        );
    }
}
