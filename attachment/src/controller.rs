use std::fmt::{Debug, Formatter};

use ahash::{HashMap, HashSet};
use glam::Vec3A;
use pose_math::{utils, Velocity};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    config::SettleConfig,
    constraints::{self, ConstraintState, Phase, SettleCause},
    error::{AttachError, AttachResult},
    provider::{AlwaysActive, GroundProbe, PhysicsProvider, SceneAuthority},
    record::AttachmentRecord,
    settle::{self, Verdict, Watchdog},
    ObjectId,
};

#[derive(Debug, Clone)]
struct EntityState {
    phase: Phase,
    /// Bumped on every phase change
    version: u64,
    /// Kept after detach, only trusted while active
    record: Option<AttachmentRecord>,
    watchdog: Option<Watchdog>,
}

impl EntityState {
    fn active_host(&self) -> Option<ObjectId> {
        self.record.filter(|it| it.active).map(|it| it.host)
    }

    fn enter<P: PhysicsProvider + ?Sized>(&mut self, physics: &mut P, id: ObjectId, phase: Phase) {
        let previous = self.phase;

        self.phase = phase;
        self.version += 1;
        constraints::apply(physics, id, phase);

        info!("Entity {id}: {previous:?} -> {phase:?}");
    }

    fn arm<P: PhysicsProvider + ?Sized>(&mut self, physics: &P, id: ObjectId, threshold: f32) {
        let velocity = physics.velocity(id).unwrap_or_default();
        let below = utils::is_below(velocity, threshold);

        self.watchdog = Some(Watchdog::arm(self.version, below));
        debug!("Armed settle watchdog for {id}, quiet: {below}");
    }
}

/// What a single [`AttachmentController::tick`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub followed: usize,
    pub settled: Vec<ObjectId>,
    /// Entities force detached because their host had no pose
    pub orphaned: Vec<ObjectId>,
}

pub struct AttachmentController {
    config: SettleConfig,
    authority: Box<dyn SceneAuthority>,

    entities: HashMap<ObjectId, EntityState>,
    hosts: HashSet<ObjectId>,
    disabled: HashSet<ObjectId>,
}

impl Debug for AttachmentController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentController")
            .field("config", &self.config)
            .field("entities", &self.entities)
            .field("hosts", &self.hosts)
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Default for AttachmentController {
    fn default() -> Self {
        Self::new(SettleConfig::default())
    }
}

impl AttachmentController {
    pub fn new(config: SettleConfig) -> Self {
        Self {
            config,
            authority: Box::new(AlwaysActive),
            entities: HashMap::default(),
            hosts: HashSet::default(),
            disabled: HashSet::default(),
        }
    }

    pub fn with_authority(mut self, authority: impl SceneAuthority + 'static) -> Self {
        self.authority = Box::new(authority);
        self
    }

    pub fn register_entity<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        id: ObjectId,
    ) -> AttachResult<()> {
        if self.disabled.contains(&id) {
            return Err(AttachError::Disabled(id));
        }

        if self.entities.contains_key(&id) {
            debug!("Entity {id} is already registered");
            return Ok(());
        }

        if !physics.has_body(id) {
            error!("Entity {id} has no rigid body, disabling its controller");
            self.disabled.insert(id);

            return Err(AttachError::MissingComponent(id, "rigid body"));
        }

        let state = EntityState {
            phase: Phase::FREE,
            version: 0,
            record: None,
            watchdog: None,
        };
        constraints::apply(physics, id, state.phase);
        self.entities.insert(id, state);

        debug!("Registered entity {id}");

        Ok(())
    }

    pub fn register_host(&mut self, id: ObjectId) {
        if self.hosts.insert(id) {
            debug!("Registered host {id}");
        }
    }

    /// Drops an entity, detaching it first if needed
    pub fn unregister_entity<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        id: ObjectId,
    ) -> AttachResult<()> {
        if self.disabled.remove(&id) {
            return Ok(());
        }

        self.detach(physics, id)?;
        self.entities.remove(&id);

        debug!("Unregistered entity {id}");

        Ok(())
    }

    /// Drops a host, every entity still attached to it is detached. Returns those entities
    pub fn remove_host<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        host: ObjectId,
    ) -> Vec<ObjectId> {
        if !self.hosts.remove(&host) {
            return Vec::new();
        }

        let attached = self.attached_to(host);
        for entity in &attached {
            if let Err(err) = self.detach(physics, *entity) {
                warn!("Could not detach {entity} from removed host {host}: {err}");
            }
        }

        info!("Removed host {host}, released {} entities", attached.len());

        attached
    }

    /// Removes both roles of an object that left the scene
    pub fn remove_object<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        id: ObjectId,
    ) -> AttachResult<()> {
        self.remove_host(physics, id);

        if self.entities.contains_key(&id) || self.disabled.contains(&id) {
            self.unregister_entity(physics, id)?;
        }

        Ok(())
    }

    #[instrument(level = "debug", skip(self, physics))]
    pub fn attach<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        entity: ObjectId,
        host: ObjectId,
    ) -> AttachResult<()> {
        let state = self.entity(entity)?;

        if !self.hosts.contains(&host) {
            return Err(AttachError::UnknownHost(host));
        }

        if let Some(current) = state.active_host() {
            if current == host {
                debug!("Entity {entity} is already attached to {host}");
                return Ok(());
            }

            return Err(AttachError::AlreadyAttached {
                entity,
                host: current,
                requested: host,
            });
        }

        if state.phase.is_grabbed() {
            return Err(AttachError::Grabbed(entity));
        }

        if self.would_cycle(entity, host) {
            return Err(AttachError::AttachCycle { entity, host });
        }

        if !self.authority.can_reparent(entity, host) {
            warn!("Cannot attach {entity} to {host}, scene authority is not active");
            return Err(AttachError::Vetoed { entity, host });
        }

        let entity_pose = physics
            .pose(entity)
            .ok_or(AttachError::MissingComponent(entity, "pose"))?;
        let host_pose = physics
            .pose(host)
            .ok_or(AttachError::MissingComponent(host, "pose"))?;

        let state = self.entity_mut(entity)?;
        state.record = Some(AttachmentRecord::track(entity_pose, host, host_pose));

        physics.set_velocity(entity, Velocity::ZERO);
        state.enter(physics, entity, Phase::Attached);

        info!("Attached {entity} to {host}");

        Ok(())
    }

    #[instrument(level = "debug", skip(self, physics))]
    pub fn detach<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        entity: ObjectId,
    ) -> AttachResult<()> {
        let threshold = self.config.velocity_threshold;
        let state = self.entity_mut(entity)?;

        let Some(record) = state.record.as_mut().filter(|it| it.active) else {
            debug!("Entity {entity} is not attached");
            return Ok(());
        };
        record.active = false;
        let host = record.host;

        physics.set_velocity(entity, Velocity::ZERO);
        state.enter(physics, entity, Phase::Settling(SettleCause::Detached));
        state.arm(physics, entity, threshold);

        info!("Detached {entity} from {host}");

        Ok(())
    }

    /// Grabbing always wins over staying attached
    pub fn on_grabbed<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        entity: ObjectId,
    ) -> AttachResult<()> {
        let state = self.entity(entity)?;

        if state.phase.is_grabbed() {
            debug!("Entity {entity} is already grabbed");
            return Ok(());
        }

        if state.active_host().is_some() {
            self.detach(physics, entity)?;
        }

        let state = self.entity_mut(entity)?;
        state.enter(physics, entity, Phase::Grabbed);

        Ok(())
    }

    pub fn on_released<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        entity: ObjectId,
    ) -> AttachResult<()> {
        let threshold = self.config.velocity_threshold;
        let state = self.entity_mut(entity)?;

        if !state.phase.is_grabbed() {
            debug!("Entity {entity} released without being grabbed");
            return Ok(());
        }

        let velocity = physics.velocity(entity).unwrap_or_default();
        physics.set_velocity(
            entity,
            Velocity {
                angular: Vec3A::ZERO,
                ..velocity
            },
        );

        state.enter(physics, entity, Phase::Settling(SettleCause::Released));
        state.arm(physics, entity, threshold);

        Ok(())
    }

    /// A host's trigger volume reported `entity` inside it
    pub fn on_trigger_enter<P: PhysicsProvider + ?Sized>(
        &mut self,
        physics: &mut P,
        entity: ObjectId,
        host: ObjectId,
    ) -> AttachResult<()> {
        let state = self.entity(entity)?;

        if state.phase.is_grabbed() || state.active_host().is_some() {
            return Ok(());
        }

        debug!("Trigger of {host} caught {entity}");
        self.attach(physics, entity, host)
    }

    /// Runs once per simulation step, after grab and release events were applied
    #[instrument(level = "trace", skip_all)]
    pub fn tick<P, G>(&mut self, physics: &mut P, ground: &G) -> TickReport
    where
        P: PhysicsProvider + ?Sized,
        G: GroundProbe + ?Sized,
    {
        let mut report = TickReport::default();

        // Only watchdogs armed before this tick get a sample
        let mut armed = self
            .entities
            .iter()
            .filter(|(_, state)| state.watchdog.is_some())
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        armed.sort();

        // Hosts that are themselves attached move first
        let mut followers = self
            .entities
            .iter()
            .filter_map(|(id, state)| {
                let record = state.record.filter(|it| it.active)?;
                Some((self.depth(*id), *id, record))
            })
            .collect::<Vec<_>>();
        followers.sort_by_key(|(depth, id, _)| (*depth, *id));

        for (_, entity, record) in followers {
            match physics
                .pose(record.host)
                .and_then(|host_pose| record.follow(host_pose))
            {
                Some(pose) => {
                    physics.set_pose(entity, pose);
                    report.followed += 1;
                }
                None => {
                    warn!("Host {} of {entity} has no pose, detaching", record.host);
                    report.orphaned.push(entity);
                }
            }
        }

        for entity in &report.orphaned {
            if let Err(err) = self.detach(physics, *entity) {
                warn!("Could not detach orphaned {entity}: {err}");
            }
        }

        let config = self.config;

        for entity in armed {
            // Armed during this tick, the first full tick is the next one
            if report.orphaned.contains(&entity) {
                continue;
            }

            let Some(state) = self.entities.get_mut(&entity) else {
                continue;
            };
            let Some(watchdog) = state.watchdog.as_mut() else {
                continue;
            };

            let below = match (physics.velocity(entity), physics.pose(entity)) {
                (Some(velocity), Some(pose)) => settle::at_rest(velocity, &pose, ground, &config),
                _ => false,
            };

            match watchdog.observe(state.version, below, &config) {
                Verdict::Cancelled => {
                    debug!("Settle watchdog of {entity} cancelled by a later transition");
                    state.watchdog = None;
                }
                Verdict::Waiting => {}
                Verdict::Settled => {
                    state.watchdog = None;
                    state.enter(physics, entity, Phase::RESTING);
                    report.settled.push(entity);
                }
            }
        }

        report
    }

    pub fn phase(&self, id: ObjectId) -> Option<Phase> {
        self.entities.get(&id).map(|it| it.phase)
    }

    pub fn version(&self, id: ObjectId) -> Option<u64> {
        self.entities.get(&id).map(|it| it.version)
    }

    pub fn record(&self, id: ObjectId) -> Option<AttachmentRecord> {
        self.entities.get(&id).and_then(|it| it.record)
    }

    pub fn constraint_state(&self, id: ObjectId) -> Option<ConstraintState> {
        self.phase(id).map(ConstraintState::for_phase)
    }

    pub fn host_of(&self, id: ObjectId) -> Option<ObjectId> {
        self.entities.get(&id).and_then(EntityState::active_host)
    }

    pub fn is_attached(&self, id: ObjectId) -> bool {
        self.host_of(id).is_some()
    }

    pub fn is_watchdog_armed(&self, id: ObjectId) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|it| it.watchdog.is_some_and(|dog| dog.version() == it.version))
    }

    pub fn is_disabled(&self, id: ObjectId) -> bool {
        self.disabled.contains(&id)
    }

    /// Entities currently attached to `host`, ordered by id
    pub fn attached_to(&self, host: ObjectId) -> Vec<ObjectId> {
        let mut attached = self
            .entities
            .iter()
            .filter(|(_, state)| state.active_host() == Some(host))
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();
        attached.sort();

        attached
    }

    fn entity(&self, id: ObjectId) -> AttachResult<&EntityState> {
        if self.disabled.contains(&id) {
            return Err(AttachError::Disabled(id));
        }

        self.entities
            .get(&id)
            .ok_or(AttachError::UnknownEntity(id))
    }

    fn entity_mut(&mut self, id: ObjectId) -> AttachResult<&mut EntityState> {
        if self.disabled.contains(&id) {
            return Err(AttachError::Disabled(id));
        }

        self.entities
            .get_mut(&id)
            .ok_or(AttachError::UnknownEntity(id))
    }

    /// Whether `host` rides on `entity`, directly or through other attachments
    fn would_cycle(&self, entity: ObjectId, host: ObjectId) -> bool {
        let mut cursor = Some(host);

        for _ in 0..=self.entities.len() {
            match cursor {
                Some(id) if id == entity => return true,
                Some(id) => cursor = self.host_of(id),
                None => return false,
            }
        }

        true
    }

    fn depth(&self, entity: ObjectId) -> usize {
        let mut depth = 0;
        let mut cursor = self.host_of(entity);

        while let Some(host) = cursor {
            depth += 1;
            if depth > self.entities.len() {
                break;
            }

            cursor = self.host_of(host);
        }

        depth
    }
}
