use std::{fs, path::Path, time::Duration};

use ahash::HashMap;
use anyhow::Context;
use attachment::{ObjectId, SettleConfig};
use bevy::ecs::system::Resource;
use glam::{Quat, Vec3A};
use pose_math::{utils::quat_from_degrees, Pose};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    pub name: String,
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
    /// Fixed steps to simulate before exiting
    pub run_ticks: u64,
    #[serde(default)]
    pub floor_y: f32,

    #[serde(default)]
    pub settle: SettleConfig,
    #[serde(default)]
    pub physics: PhysicsDefinition,
    #[serde(default)]
    pub session: SessionDefinition,

    pub objects: HashMap<String, ObjectDefinition>,
    #[serde(default)]
    pub attachments: Vec<AttachmentDefinition>,
    #[serde(default)]
    pub table_snap: Vec<TableSnapDefinition>,
    #[serde(default)]
    pub script: Vec<ScriptedInput>,
}

fn default_tick_hz() -> f64 {
    60.0
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDefinition {
    pub position: [f32; 3],
    /// Yaw, pitch, roll in degrees
    #[serde(default)]
    pub rotation: [f32; 3],

    #[serde(default)]
    pub grabbable: bool,
    #[serde(default)]
    pub host: bool,
    /// Moved only by the script, never by gravity
    #[serde(default)]
    pub kinematic: bool,
    /// Objects without a rigid body cannot be driven by the attachment controller
    #[serde(default = "yes")]
    pub rigid_body: bool,

    #[serde(default)]
    pub trigger_radius: Option<f32>,
    /// Entities this host's trigger volume picks up
    #[serde(default)]
    pub accepts: Vec<String>,
}

impl ObjectDefinition {
    pub fn pose(&self) -> Pose {
        let [yaw, pitch, roll] = self.rotation;
        Pose::new(Vec3A::from(self.position), quat_from_degrees(yaw, pitch, roll))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentDefinition {
    pub entity: String,
    pub host: String,
}

/// Attach every grabbable object within `radius` of `host` once the session starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSnapDefinition {
    pub host: String,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedInput {
    pub tick: u64,
    pub object: String,
    pub action: ScriptAction,

    #[serde(default)]
    pub position: Option<[f32; 3]>,
    #[serde(default)]
    pub rotation: Option<[f32; 3]>,
}

impl ScriptedInput {
    pub fn target_pose(&self) -> Option<Pose> {
        let position = Vec3A::from(self.position?);
        let orientation = self
            .rotation
            .map(|[yaw, pitch, roll]| quat_from_degrees(yaw, pitch, roll))
            .unwrap_or(Quat::IDENTITY);

        Some(Pose::new(position, orientation))
    }
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScriptAction {
    Grab,
    Release,
    MoveTo,
    Destroy,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsDefinition {
    /// m/s^2, pulls towards -Y
    pub gravity: f32,
    pub restitution: f32,
    /// Per second, applied while touching the floor
    pub friction: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
}

impl Default for PhysicsDefinition {
    fn default() -> Self {
        Self {
            gravity: 9.81,
            restitution: 0.2,
            friction: 6.0,
            linear_drag: 0.1,
            angular_drag: 0.5,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDefinition {
    /// Reparenting is vetoed until this many fixed steps have passed
    pub activate_after_ticks: u64,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{context} references unknown object `{name}`")]
    UnknownReference { context: String, name: String },
    #[error("{context}: `{name}` is not grabbable")]
    NotGrabbable { context: String, name: String },
    #[error("{context}: `{name}` is not a host")]
    NotHost { context: String, name: String },
    #[error("Script step at tick {tick} moves `{name}` without a position")]
    MissingPosition { tick: u64, name: String },
    #[error("Tick rate must be positive, got {0}")]
    InvalidTickRate(f64),
}

impl SceneConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Read scene config {}", path.display()))?;
        let config: SceneConfig = toml::from_str(&raw).context("Parse scene config")?;
        config.validate().context("Validate scene config")?;

        Ok(config)
    }

    /// Length of one fixed step, only meaningful after [`SceneConfig::validate`]
    pub fn timestep(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz)
    }

    /// Stable ids, assigned in name order
    pub fn object_ids(&self) -> Vec<(ObjectId, &str)> {
        let mut names = self.objects.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort();

        names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (ObjectId(idx as u32 + 1), name))
            .collect()
    }

    /// Every reference must resolve before the scene starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The fixed step must be a positive, representable duration
        let step = Duration::try_from_secs_f64(1.0 / self.tick_hz);
        if !self.tick_hz.is_finite() || !matches!(step, Ok(step) if !step.is_zero()) {
            return Err(ConfigError::InvalidTickRate(self.tick_hz));
        }

        for (name, object) in &self.objects {
            let context = format!("Object `{name}`");

            if (object.trigger_radius.is_some() || !object.accepts.is_empty()) && !object.host {
                return Err(ConfigError::NotHost {
                    context,
                    name: name.clone(),
                });
            }

            for accepted in &object.accepts {
                self.grabbable(&context, accepted)?;
            }
        }

        for attachment in &self.attachments {
            let context = format!("Attachment of `{}`", attachment.entity);

            self.grabbable(&context, &attachment.entity)?;
            self.host(&context, &attachment.host)?;
        }

        for snap in &self.table_snap {
            self.host("Table snap", &snap.host)?;
        }

        for step in &self.script {
            let context = format!("Script step at tick {}", step.tick);

            match step.action {
                ScriptAction::Grab | ScriptAction::Release => {
                    self.grabbable(&context, &step.object)?;
                }
                ScriptAction::MoveTo => {
                    self.object(&context, &step.object)?;

                    if step.position.is_none() {
                        return Err(ConfigError::MissingPosition {
                            tick: step.tick,
                            name: step.object.clone(),
                        });
                    }
                }
                ScriptAction::Destroy => {
                    self.object(&context, &step.object)?;
                }
            }
        }

        Ok(())
    }

    fn object(&self, context: &str, name: &str) -> Result<&ObjectDefinition, ConfigError> {
        self.objects
            .get(name)
            .ok_or_else(|| ConfigError::UnknownReference {
                context: context.to_owned(),
                name: name.to_owned(),
            })
    }

    fn grabbable(&self, context: &str, name: &str) -> Result<&ObjectDefinition, ConfigError> {
        let object = self.object(context, name)?;

        if !object.grabbable {
            return Err(ConfigError::NotGrabbable {
                context: context.to_owned(),
                name: name.to_owned(),
            });
        }

        Ok(object)
    }

    fn host(&self, context: &str, name: &str) -> Result<&ObjectDefinition, ConfigError> {
        let object = self.object(context, name)?;

        if !object.host {
            return Err(ConfigError::NotHost {
                context: context.to_owned(),
                name: name.to_owned(),
            });
        }

        Ok(object)
    }
}
