pub mod attachments;
pub mod input;
pub mod objects;
pub mod physics;
pub mod stop;
pub mod triggers;

use bevy::{app::PluginGroupBuilder, prelude::*};

pub struct SimulationPlugins;

impl PluginGroup for SimulationPlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(SimulationSchedulePlugin)
            .add(objects::ObjectsPlugin)
            .add(input::InputPlugin)
            .add(physics::PhysicsPlugin)
            .add(triggers::TriggerPlugin)
            .add(attachments::AttachmentPlugin)
            .add(stop::StopPlugin)
            .build()
    }
}

/// Order of work inside one fixed step
///
/// Input events must be applied before the physics step and the attachment
/// tick so pose following and constraints never lag a grab by a step.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Input,
    Interaction,
    Physics,
    Triggers,
    Attachment,
    Report,
}

/// Completed fixed steps
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickCounter(pub u64);

struct SimulationSchedulePlugin;

impl Plugin for SimulationSchedulePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TickCounter>();

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Input,
                SimulationSet::Interaction,
                SimulationSet::Physics,
                SimulationSet::Triggers,
                SimulationSet::Attachment,
                SimulationSet::Report,
            )
                .chain(),
        );
    }
}
