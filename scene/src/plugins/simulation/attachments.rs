use attachment::{provider::GroundPlane, AttachmentController, ObjectId};
use bevy::prelude::*;

use crate::{
    components::{Grabbable, Host, ObjectRegistry, PhaseMirror, SceneObject},
    config::SceneConfig,
    plugins::core::{
        error::{report_attach, ErrorEvent},
        session::{Session, SessionStarted},
    },
};

use super::{
    input::{Destroyed, Grabbed, Released},
    physics::SceneBodies,
    SimulationSet,
};

pub struct AttachmentPlugin;

impl Plugin for AttachmentPlugin {
    fn build(&self, app: &mut App) {
        let settle = app.world.resource::<SceneConfig>().settle;
        let session = app.world.get_resource_or_insert_with(Session::default).clone();

        app.insert_resource(Attachments(
            AttachmentController::new(settle).with_authority(session),
        ));

        app.add_systems(Startup, register_objects);
        app.add_systems(
            FixedUpdate,
            (
                (
                    initial_attachments,
                    handle_grabs,
                    handle_releases,
                    handle_destroyed,
                )
                    .chain()
                    .in_set(SimulationSet::Interaction),
                step_controller.in_set(SimulationSet::Attachment),
                (mirror_phases, log_phase_transition)
                    .chain()
                    .in_set(SimulationSet::Report),
            ),
        );
    }
}

#[derive(Resource, Debug, Deref, DerefMut)]
pub struct Attachments(pub AttachmentController);

fn register_objects(
    mut attachments: ResMut<Attachments>,
    mut bodies: SceneBodies,
    entities: Query<&SceneObject, With<Grabbable>>,
    hosts: Query<&SceneObject, With<Host>>,
    mut errors: EventWriter<ErrorEvent>,
) {
    for object in &hosts {
        attachments.register_host(object.id);
    }

    for object in &entities {
        report_attach(
            attachments.register_entity(&mut bodies, object.id),
            &mut errors,
        );
    }

    info!(
        "Registered {} entities and {} hosts",
        entities.iter().count(),
        hosts.iter().count()
    );
}

/// Scene authored attachments, applied once the session allows reparenting
fn initial_attachments(
    mut started: EventReader<SessionStarted>,
    config: Res<SceneConfig>,
    mut attachments: ResMut<Attachments>,
    mut bodies: SceneBodies,
    entities: Query<&SceneObject, With<Grabbable>>,
    mut errors: EventWriter<ErrorEvent>,
) {
    if started.read().count() == 0 {
        return;
    }

    for definition in &config.attachments {
        let (Some(entity), Some(host)) = (
            bodies.registry().id(&definition.entity),
            bodies.registry().id(&definition.host),
        ) else {
            continue;
        };

        report_attach(attachments.attach(&mut bodies, entity, host), &mut errors);
    }

    for snap in &config.table_snap {
        let Some(host) = bodies.registry().id(&snap.host) else {
            continue;
        };
        let Some(host_position) = bodies.body(host).map(|it| it.pose.position) else {
            warn!("Table snap host `{}` has no body", snap.host);
            continue;
        };

        let nearby = entities
            .iter()
            .filter(|object| object.id != host && !attachments.is_attached(object.id))
            .filter(|object| {
                bodies.body(object.id).is_some_and(|body| {
                    body.pose.position.distance(host_position) <= snap.radius
                })
            })
            .map(|object| object.id)
            .collect::<Vec<_>>();

        debug!("Snapping {} objects onto `{}`", nearby.len(), snap.host);

        for entity in nearby {
            report_attach(attachments.attach(&mut bodies, entity, host), &mut errors);
        }
    }
}

fn handle_grabs(
    mut grabbed: EventReader<Grabbed>,
    mut attachments: ResMut<Attachments>,
    mut bodies: SceneBodies,
    mut errors: EventWriter<ErrorEvent>,
) {
    for &Grabbed(id) in grabbed.read() {
        if let Some(mut body) = bodies.body_mut(id) {
            body.held = true;
        }

        report_attach(attachments.on_grabbed(&mut bodies, id), &mut errors);
    }
}

fn handle_releases(
    mut released: EventReader<Released>,
    mut attachments: ResMut<Attachments>,
    mut bodies: SceneBodies,
    mut errors: EventWriter<ErrorEvent>,
) {
    for &Released(id) in released.read() {
        if let Some(mut body) = bodies.body_mut(id) {
            body.held = false;
        }

        report_attach(attachments.on_released(&mut bodies, id), &mut errors);
    }
}

fn handle_destroyed(
    mut cmds: Commands,
    mut destroyed: EventReader<Destroyed>,
    mut attachments: ResMut<Attachments>,
    mut bodies: SceneBodies,
    mut errors: EventWriter<ErrorEvent>,
) {
    for &Destroyed(id) in destroyed.read() {
        let released = attachments.attached_to(id);
        report_attach(attachments.remove_object(&mut bodies, id), &mut errors);

        if !released.is_empty() {
            info!("Destroyed host {id} released {released:?}");
        }

        if let Some(entity) = bodies.registry().entity(id) {
            cmds.entity(entity).despawn();
        }

        cmds.add(move |world: &mut World| {
            world.resource_mut::<ObjectRegistry>().remove(id);
        });
    }
}

fn step_controller(
    config: Res<SceneConfig>,
    mut attachments: ResMut<Attachments>,
    mut bodies: SceneBodies,
) {
    let report = attachments.tick(&mut bodies, &GroundPlane(config.floor_y));

    for id in report.settled {
        info!("`{}` came to rest", name_of(bodies.registry(), id));
    }

    for id in report.orphaned {
        warn!("`{}` lost its host", name_of(bodies.registry(), id));
    }
}

fn mirror_phases(
    attachments: Res<Attachments>,
    mut objects: Query<(&SceneObject, &mut PhaseMirror)>,
) {
    for (object, mut mirror) in &mut objects {
        let Some(phase) = attachments.phase(object.id) else {
            continue;
        };

        mirror.set_if_neq(PhaseMirror(phase));
    }
}

fn log_phase_transition(objects: Query<(&SceneObject, Ref<PhaseMirror>)>) {
    for (object, mirror) in &objects {
        if mirror.is_changed() && !mirror.is_added() {
            info!("`{}` phase: {:?}", object.name, mirror.0);
        }
    }
}

fn name_of(registry: &ObjectRegistry, id: ObjectId) -> String {
    registry
        .name(id)
        .map(str::to_owned)
        .unwrap_or_else(|| id.to_string())
}
