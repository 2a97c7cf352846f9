//! Minimal rigid body step standing in for the engine's physics
//!
//! Integrates gravity and drag, resolves contact with a single floor plane and
//! honours per axis freeze flags. Held and kinematic bodies are left alone.

use attachment::{ObjectId, PhysicsProvider};
use bevy::{ecs::system::SystemParam, prelude::*};
use glam::Quat;
use pose_math::{FreezeAxes, Pose, Velocity};

use crate::{
    components::{Body, ObjectRegistry},
    config::{PhysicsDefinition, SceneConfig},
};

use super::SimulationSet;

/// Bodies this close to the floor count as touching it
const CONTACT_SLOP: f32 = 0.005;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, step_bodies.in_set(SimulationSet::Physics));
    }
}

fn step_bodies(mut bodies: Query<&mut Body>, config: Res<SceneConfig>, time: Res<Time<Fixed>>) {
    let dt = time.timestep().as_secs_f32();

    for mut body in &mut bodies {
        integrate(&mut body, &config.physics, config.floor_y, dt);
    }
}

pub fn integrate(body: &mut Body, physics: &PhysicsDefinition, floor_y: f32, dt: f32) {
    if body.kinematic || body.held {
        return;
    }

    let mut velocity = body.velocity;
    if body.gravity {
        velocity.linear.y -= physics.gravity * dt;
    }
    velocity.linear /= 1.0 + physics.linear_drag * dt;
    velocity.angular /= 1.0 + physics.angular_drag * dt;
    velocity = body.frozen.apply(velocity);

    let mut pose = body.pose;
    pose.position += velocity.linear * dt;

    let spin = velocity.angular * dt;
    if spin.length_squared() > 0.0 {
        pose.orientation = (Quat::from_scaled_axis(spin.into()) * pose.orientation).normalize();
    }

    if pose.position.y < floor_y {
        pose.position.y = floor_y;

        if velocity.linear.y < 0.0 {
            velocity.linear.y *= -physics.restitution;

            // Too slow to leave the floor again within a step
            if velocity.linear.y < physics.gravity * dt {
                velocity.linear.y = 0.0;
            }
        }
    }

    if pose.position.y - floor_y <= CONTACT_SLOP {
        let keep = (1.0 - physics.friction * dt).max(0.0);

        velocity.linear.x *= keep;
        velocity.linear.z *= keep;
        velocity.angular *= keep;
    }

    body.pose = pose;
    body.velocity = velocity;
}

/// [`PhysicsProvider`] over the ECS bodies of the scene
#[derive(SystemParam)]
pub struct SceneBodies<'w, 's> {
    registry: Res<'w, ObjectRegistry>,
    bodies: Query<'w, 's, &'static mut Body>,
}

impl SceneBodies<'_, '_> {
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn body(&self, id: ObjectId) -> Option<&Body> {
        let entity = self.registry.entity(id)?;
        self.bodies.get(entity).ok()
    }

    pub fn body_mut(&mut self, id: ObjectId) -> Option<Mut<'_, Body>> {
        let entity = self.registry.entity(id)?;
        self.bodies.get_mut(entity).ok()
    }
}

impl PhysicsProvider for SceneBodies<'_, '_> {
    fn has_body(&self, id: ObjectId) -> bool {
        self.body(id).is_some()
    }

    fn pose(&self, id: ObjectId) -> Option<Pose> {
        self.body(id).map(|it| it.pose)
    }

    fn set_pose(&mut self, id: ObjectId, pose: Pose) {
        if let Some(mut body) = self.body_mut(id) {
            body.pose = pose;
        }
    }

    fn velocity(&self, id: ObjectId) -> Option<Velocity> {
        self.body(id).map(|it| it.velocity)
    }

    fn set_velocity(&mut self, id: ObjectId, velocity: Velocity) {
        if let Some(mut body) = self.body_mut(id) {
            body.velocity = velocity;
        }
    }

    fn set_gravity(&mut self, id: ObjectId, enabled: bool) {
        if let Some(mut body) = self.body_mut(id) {
            body.gravity = enabled;
        }
    }

    fn set_constraints(&mut self, id: ObjectId, frozen: FreezeAxes) {
        if let Some(mut body) = self.body_mut(id) {
            body.frozen = frozen;
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::{vec3a, Vec3A};

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn dropped_body_comes_to_rest_on_floor() {
        let physics = PhysicsDefinition::default();
        let mut body = Body::new(Pose::from_position(vec3a(0.3, 1.0, 0.0)), false);

        for _ in 0..240 {
            integrate(&mut body, &physics, 0.0, DT);
        }

        assert!(body.pose.position.abs_diff_eq(vec3a(0.3, 0.0, 0.0), 1e-3));
        assert!(body.velocity.linear.length() < 0.1);
    }

    #[test]
    fn frozen_and_held_bodies_stay_put() {
        let physics = PhysicsDefinition::default();
        let start = Pose::from_position(vec3a(0.0, 1.0, 0.0));

        let mut frozen = Body::new(start, false);
        frozen.frozen = FreezeAxes::ALL;
        frozen.velocity = Velocity::linear(Vec3A::X);

        let mut held = Body::new(start, false);
        held.held = true;

        for _ in 0..10 {
            integrate(&mut frozen, &physics, 0.0, DT);
            integrate(&mut held, &physics, 0.0, DT);
        }

        assert_eq!(frozen.pose, start);
        assert_eq!(held.pose, start);
    }

    #[test]
    fn tip_over_lock_still_falls() {
        let physics = PhysicsDefinition::default();
        let mut body = Body::new(Pose::from_position(vec3a(0.0, 1.0, 0.0)), false);
        body.frozen = FreezeAxes::TIP_OVER;
        body.velocity = Velocity::new(Vec3A::ZERO, vec3a(3.0, 0.0, 3.0));

        for _ in 0..10 {
            integrate(&mut body, &physics, 0.0, DT);
        }

        assert!(body.pose.position.y < 1.0);
        assert_eq!(body.pose.orientation, Quat::IDENTITY);
    }
}
