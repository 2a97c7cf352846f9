use ahash::HashMap;
use attachment::{ObjectId, Phase};
use bevy::ecs::{component::Component, entity::Entity, system::Resource};
use pose_math::{FreezeAxes, Pose, Velocity};

#[derive(Component, Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
}

/// Rigid body state owned by the stand-in physics step
#[derive(Component, Debug, Copy, Clone, PartialEq)]
pub struct Body {
    pub pose: Pose,
    pub velocity: Velocity,
    pub gravity: bool,
    pub frozen: FreezeAxes,

    /// Only moved by scripted input
    pub kinematic: bool,
    /// Driven by a hand, physics keeps its hands off
    pub held: bool,
}

impl Body {
    pub fn new(pose: Pose, kinematic: bool) -> Self {
        Self {
            pose,
            velocity: Velocity::ZERO,
            gravity: !kinematic,
            frozen: FreezeAxes::NONE,
            kinematic,
            held: false,
        }
    }
}

#[derive(Component, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Grabbable;

#[derive(Component, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Host;

/// Spherical trigger around a host, reports accepted entities inside it every step
#[derive(Component, Debug, Clone, PartialEq)]
pub struct TriggerVolume {
    pub radius: f32,
    pub accepts: Vec<ObjectId>,
}

/// Copy of the controller's phase for an entity, written after every step
#[derive(Component, Debug, Copy, Clone, PartialEq, Eq)]
pub struct PhaseMirror(pub Phase);

/// Name, id and ECS entity of every spawned scene object
#[derive(Resource, Debug, Clone, Default)]
pub struct ObjectRegistry {
    entities: HashMap<ObjectId, Entity>,
    names: HashMap<String, ObjectId>,
}

impl ObjectRegistry {
    pub fn insert(&mut self, id: ObjectId, name: &str, entity: Entity) {
        self.entities.insert(id, entity);
        self.names.insert(name.to_owned(), id);
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<Entity> {
        self.names.retain(|_, it| *it != id);
        self.entities.remove(&id)
    }

    pub fn entity(&self, id: ObjectId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn id(&self, name: &str) -> Option<ObjectId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: ObjectId) -> Option<&str> {
        self.names
            .iter()
            .find(|(_, it)| **it == id)
            .map(|(name, _)| name.as_str())
    }
}
