pub mod components;
pub mod config;
pub mod plugins;

use std::env;

use anyhow::Context;
use bevy::{app::ScheduleRunnerPlugin, prelude::*};
use config::SceneConfig;
use plugins::{core::CorePlugins, simulation::SimulationPlugins};
use tracing::Level;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "scene_config.toml".to_owned());
    let config = SceneConfig::load(&path).with_context(|| format!("Load scene from {path}"))?;

    info!("---------- Starting scene `{}` ----------", config.name);

    let step = config.timestep();

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(step)))
        .insert_resource(Time::<Fixed>::from_duration(step))
        .insert_resource(config)
        .add_plugins((CorePlugins, SimulationPlugins))
        .run();

    info!("---------- Scene stopped ----------");

    Ok(())
}

#[cfg(test)]
mod tests {
    use attachment::{Phase, SettleCause};
    use glam::vec3a;

    use crate::{
        components::{Body, ObjectRegistry},
        plugins::{core::ctrlc::CtrlCPlugin, simulation::attachments::Attachments},
    };

    use super::*;

    const SCENE: &str = r#"
        name = "kitchen"
        run_ticks = 1000

        [session]
        activate_after_ticks = 3

        # Bounce apexes are slow too
        [settle]
        ground_threshold = 0.01

        [objects.table]
        position = [0.0, 0.8, 0.0]
        host = true
        kinematic = true

        [objects.cup]
        position = [0.0, 0.9, 0.0]
        grabbable = true

        [objects.vase]
        position = [1.0, 0.0, 0.0]
        grabbable = true
        host = true
        trigger_radius = 0.15
        accepts = ["flower"]

        [objects.flower]
        position = [-1.0, 0.0, 0.0]
        grabbable = true

        [[table_snap]]
        host = "table"
        radius = 0.5

        [[script]]
        tick = 10
        object = "cup"
        action = "grab"

        [[script]]
        tick = 11
        object = "cup"
        action = "move_to"
        position = [0.0, 1.0, 0.5]

        [[script]]
        tick = 12
        object = "cup"
        action = "move_to"
        position = [0.0, 1.0, 0.5]

        [[script]]
        tick = 13
        object = "cup"
        action = "release"

        [[script]]
        tick = 20
        object = "flower"
        action = "grab"

        [[script]]
        tick = 21
        object = "flower"
        action = "move_to"
        position = [1.0, 0.1, 0.0]

        [[script]]
        tick = 22
        object = "flower"
        action = "move_to"
        position = [1.0, 0.1, 0.0]

        [[script]]
        tick = 23
        object = "flower"
        action = "release"

        [[script]]
        tick = 40
        object = "vase"
        action = "destroy"
    "#;

    fn scene_app() -> anyhow::Result<App> {
        let config: SceneConfig = toml::from_str(SCENE)?;
        config.validate()?;

        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(Time::<Fixed>::from_hz(config.tick_hz))
            .insert_resource(config)
            .add_plugins((
                CorePlugins.build().disable::<CtrlCPlugin>(),
                SimulationPlugins,
            ));

        // Runs startup
        app.update();

        Ok(app)
    }

    fn step(app: &mut App, ticks: usize) {
        for _ in 0..ticks {
            app.world.run_schedule(FixedUpdate);
        }
    }

    fn phase(app: &App, name: &str) -> Option<Phase> {
        let id = app.world.resource::<ObjectRegistry>().id(name)?;
        app.world.resource::<Attachments>().phase(id)
    }

    fn body(app: &App, name: &str) -> Option<Body> {
        let entity = app
            .world
            .resource::<ObjectRegistry>()
            .id(name)
            .and_then(|id| app.world.resource::<ObjectRegistry>().entity(id))?;

        app.world.get::<Body>(entity).copied()
    }

    #[test]
    fn table_snap_waits_for_session() -> anyhow::Result<()> {
        let mut app = scene_app()?;

        step(&mut app, 2);
        assert_eq!(phase(&app, "cup"), Some(Phase::FREE));

        step(&mut app, 3);
        assert_eq!(phase(&app, "cup"), Some(Phase::Attached));

        Ok(())
    }

    #[test]
    fn released_cup_comes_to_rest_on_the_floor() -> anyhow::Result<()> {
        let mut app = scene_app()?;

        step(&mut app, 12);
        assert_eq!(phase(&app, "cup"), Some(Phase::Grabbed));

        step(&mut app, 200);
        assert_eq!(phase(&app, "cup"), Some(Phase::RESTING));

        let cup = body(&app, "cup").expect("cup body");
        assert!(cup.pose.position.abs_diff_eq(vec3a(0.0, 0.0, 0.5), 1e-2));

        Ok(())
    }

    #[test]
    fn vase_trigger_catches_dropped_flower() -> anyhow::Result<()> {
        let mut app = scene_app()?;

        step(&mut app, 30);
        assert_eq!(phase(&app, "flower"), Some(Phase::Attached));

        let vase = app.world.resource::<ObjectRegistry>().id("vase");
        let flower = app.world.resource::<ObjectRegistry>().id("flower");
        assert!(flower.is_some());
        assert_eq!(
            flower.and_then(|id| app.world.resource::<Attachments>().host_of(id)),
            vase
        );

        Ok(())
    }

    #[test]
    fn destroyed_vase_drops_its_flower() -> anyhow::Result<()> {
        let mut app = scene_app()?;

        step(&mut app, 40);
        assert_eq!(phase(&app, "flower"), Some(Phase::Attached));

        // The script destroys the vase on this step
        step(&mut app, 1);
        assert_eq!(
            phase(&app, "flower"),
            Some(Phase::Settling(SettleCause::Detached))
        );

        let registry = app.world.resource::<ObjectRegistry>();
        assert_eq!(registry.id("vase"), None);

        let flower = registry.id("flower").expect("flower id");
        assert_eq!(app.world.resource::<Attachments>().host_of(flower), None);
        assert!(body(&app, "flower").is_some());

        Ok(())
    }
}
