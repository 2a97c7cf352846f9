use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use attachment::{ObjectId, SceneAuthority};
use bevy::prelude::*;

use crate::{config::SceneConfig, plugins::simulation::{SimulationSet, TickCounter}};

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SessionStarted>();
        app.insert_resource(Session::default());

        app.add_systems(FixedUpdate, activate_session.in_set(SimulationSet::Input));
    }
}

/// Shared view of whether the scene is live, reparenting is refused until it is
#[derive(Resource, Debug, Clone, Default)]
pub struct Session(Arc<AtomicBool>);

impl Session {
    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn activate(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }
}

impl SceneAuthority for Session {
    fn can_reparent(&self, _entity: ObjectId, _host: ObjectId) -> bool {
        self.is_active()
    }
}

#[derive(Event, Debug, Clone, Copy)]
pub struct SessionStarted;

fn activate_session(
    session: Res<Session>,
    config: Res<SceneConfig>,
    ticks: Res<TickCounter>,
    mut started: EventWriter<SessionStarted>,
) {
    if session.is_active() || ticks.0 < config.session.activate_after_ticks {
        return;
    }

    if session.activate() {
        info!("Session active after {} ticks", ticks.0);
        started.send(SessionStarted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_follows_activation() {
        let session = Session::default();
        let authority = session.clone();

        assert!(!authority.can_reparent(ObjectId(1), ObjectId(2)));
        assert!(session.activate());
        assert!(!session.activate());
        assert!(authority.can_reparent(ObjectId(1), ObjectId(2)));
    }
}
