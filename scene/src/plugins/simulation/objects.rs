use attachment::Phase;
use bevy::prelude::*;

use crate::{
    components::{Body, Grabbable, Host, ObjectRegistry, PhaseMirror, SceneObject, TriggerVolume},
    config::SceneConfig,
};

pub struct ObjectsPlugin;

impl Plugin for ObjectsPlugin {
    fn build(&self, app: &mut App) {
        let config = app.world.resource::<SceneConfig>().clone();
        let mut registry = ObjectRegistry::default();

        let ids = config.object_ids();
        for &(id, name) in &ids {
            let definition = &config.objects[name];

            let mut object = app.world.spawn((
                SceneObject {
                    id,
                    name: name.to_owned(),
                },
                Name::new(name.to_owned()),
            ));

            if definition.rigid_body {
                object.insert(Body::new(definition.pose(), definition.kinematic));
            } else {
                warn!("Object `{name}` has no rigid body");
            }

            if definition.grabbable {
                object.insert((Grabbable, PhaseMirror(Phase::FREE)));
            }

            if definition.host {
                object.insert(Host);
            }

            if let Some(radius) = definition.trigger_radius {
                // Names were validated on load
                let accepts = definition
                    .accepts
                    .iter()
                    .filter_map(|accepted| {
                        ids.iter()
                            .find(|(_, it)| *it == accepted.as_str())
                            .map(|(id, _)| *id)
                    })
                    .collect();

                object.insert(TriggerVolume { radius, accepts });
            }

            registry.insert(id, name, object.id());
        }

        app.insert_resource(registry);
    }
}
