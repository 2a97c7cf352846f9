use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SettleConfig {
    /// m/s for linear motion, rad/s for angular motion
    pub velocity_threshold: f32,
    /// When set, a body only counts as settled within this distance of the ground
    pub ground_threshold: Option<f32>,
    /// Full ticks a body must stay below the threshold after the arming sample
    pub settle_ticks: u32,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 0.1,
            ground_threshold: None,
            settle_ticks: 1,
        }
    }
}
