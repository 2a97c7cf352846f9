use bevy::prelude::*;

use crate::{
    components::{Host, SceneObject, TriggerVolume},
    plugins::core::{
        error::{report_attach, ErrorEvent},
        session::Session,
    },
};

use super::{attachments::Attachments, physics::SceneBodies, SimulationSet};

pub struct TriggerPlugin;

impl Plugin for TriggerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, check_triggers.in_set(SimulationSet::Triggers));
    }
}

/// Overlap test between each host's trigger sphere and the bodies it accepts.
/// Overlaps are reported every step while they last, the controller ignores repeats
fn check_triggers(
    session: Res<Session>,
    mut attachments: ResMut<Attachments>,
    mut bodies: SceneBodies,
    volumes: Query<(&SceneObject, &TriggerVolume), With<Host>>,
    mut errors: EventWriter<ErrorEvent>,
) {
    // Every overlap would be vetoed anyway
    if !session.is_active() {
        return;
    }

    for (host, volume) in &volumes {
        let Some(center) = bodies.body(host.id).map(|it| it.pose.position) else {
            continue;
        };

        for &entity in &volume.accepts {
            let inside = bodies.body(entity).is_some_and(|body| {
                !body.held && body.pose.position.distance(center) <= volume.radius
            });

            if inside {
                report_attach(
                    attachments.on_trigger_enter(&mut bodies, entity, host.id),
                    &mut errors,
                );
            }
        }
    }
}
