use pose_math::{utils, Pose, Velocity};

use crate::{config::SettleConfig, provider::GroundProbe};

/// Debounced freeze of a body that has stopped moving
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Watchdog {
    /// State version of the entity when armed, any later transition cancels the watchdog
    version: u64,
    streak: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    Cancelled,
    Waiting,
    Settled,
}

impl Watchdog {
    pub fn arm(version: u64, below: bool) -> Self {
        Self {
            version,
            streak: below as u32,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn observe(&mut self, version: u64, below: bool, config: &SettleConfig) -> Verdict {
        if version != self.version {
            return Verdict::Cancelled;
        }

        if below {
            self.streak += 1;
        } else {
            self.streak = 0;
        }

        // The arming sample counts, so `settle_ticks` full ticks need `settle_ticks + 1` samples
        if self.streak > config.settle_ticks {
            Verdict::Settled
        } else {
            Verdict::Waiting
        }
    }
}

/// Whether a tick sample counts towards settling
pub fn at_rest<G: GroundProbe + ?Sized>(
    velocity: Velocity,
    pose: &Pose,
    ground: &G,
    config: &SettleConfig,
) -> bool {
    if !utils::is_below(velocity, config.velocity_threshold) {
        return false;
    }

    match config.ground_threshold {
        Some(threshold) => ground
            .ground_distance(pose)
            .is_some_and(|distance| distance <= threshold),
        None => true,
    }
}
