use bevy::{app::AppExit, prelude::*};

use crate::{
    components::{Body, SceneObject},
    config::SceneConfig,
};

use super::{attachments::Attachments, SimulationSet, TickCounter};

pub struct StopPlugin;

impl Plugin for StopPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (count_ticks, stop_after_run_ticks)
                .chain()
                .in_set(SimulationSet::Report),
        );
    }
}

fn count_ticks(mut ticks: ResMut<TickCounter>) {
    ticks.0 += 1;
}

fn stop_after_run_ticks(
    mut stopped: Local<bool>,
    ticks: Res<TickCounter>,
    config: Res<SceneConfig>,
    attachments: Res<Attachments>,
    objects: Query<(&SceneObject, Option<&Body>)>,
    mut exit: EventWriter<AppExit>,
) {
    if *stopped || ticks.0 < config.run_ticks {
        return;
    }
    *stopped = true;

    info!("---------- Scene `{}` after {} ticks ----------", config.name, ticks.0);

    let mut objects = objects.iter().collect::<Vec<_>>();
    objects.sort_by_key(|(object, _)| object.id);

    for (object, body) in objects {
        let phase = attachments.phase(object.id);
        let host = attachments.host_of(object.id);
        let position = body.map(|it| it.pose.position);

        info!(
            "`{}`: phase={phase:?} host={host:?} position={position:?}",
            object.name
        );
    }

    exit.send(AppExit);
}
