//! Scripted stand-in for XR controllers
//!
//! Replays the `script` timeline from the scene config as edge triggered
//! grab and release events, and moves held objects the way a tracked hand would.

use attachment::ObjectId;
use bevy::prelude::*;
use pose_math::Velocity;

use crate::config::{ScriptAction, SceneConfig};

use super::{physics::SceneBodies, SimulationSet, TickCounter};

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Grabbed>()
            .add_event::<Released>()
            .add_event::<Destroyed>();

        app.add_systems(FixedUpdate, replay_script.in_set(SimulationSet::Input));
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grabbed(pub ObjectId);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Released(pub ObjectId);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destroyed(pub ObjectId);

fn replay_script(
    config: Res<SceneConfig>,
    ticks: Res<TickCounter>,
    time: Res<Time<Fixed>>,
    mut bodies: SceneBodies,
    mut grabbed: EventWriter<Grabbed>,
    mut released: EventWriter<Released>,
    mut destroyed: EventWriter<Destroyed>,
) {
    let dt = time.timestep().as_secs_f32();

    for step in config.script.iter().filter(|it| it.tick == ticks.0) {
        let Some(id) = bodies.registry().id(&step.object) else {
            // Already destroyed
            debug!("Skipping script step for missing `{}`", step.object);
            continue;
        };

        match step.action {
            ScriptAction::Grab => {
                debug!("Hand grabs `{}`", step.object);
                grabbed.send(Grabbed(id));
            }
            ScriptAction::Release => {
                debug!("Hand releases `{}`", step.object);
                released.send(Released(id));
            }
            ScriptAction::MoveTo => {
                let Some(target) = step.target_pose() else {
                    continue;
                };
                let Some(mut body) = bodies.body_mut(id) else {
                    continue;
                };

                // A hand imparts the velocity it moved with, so releases can throw
                if body.held {
                    let moved = target.position - body.pose.position;
                    body.velocity = Velocity::linear(moved / dt.max(f32::EPSILON));
                }
                body.pose = target;
            }
            ScriptAction::Destroy => {
                info!("Destroying `{}`", step.object);
                destroyed.send(Destroyed(id));
            }
        }
    }
}
