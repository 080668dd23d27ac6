//! Physics backend abstraction.
//!
//! The state machine reads the body's position/velocity and writes back a
//! velocity (and, while snapping onto a ladder, a position) through the
//! [`CharacterBody`] trait. Inside bevy, [`BackendBody`] implements that trait on
//! top of a [`PlatformerPhysicsBackend`], which lets the physics engine be
//! swapped (Rapier2D, a plain kinematic integrator, custom, etc.).

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::PlatformerSet;

/// The moving body a controller drives: the velocity sink.
pub trait CharacterBody {
    /// Current position of the body's pivot.
    fn position(&self) -> Vec2;

    /// Current physical velocity, as integrated by the physics engine.
    fn velocity(&self) -> Vec2;

    /// Teleport the body.
    fn set_position(&mut self, position: Vec2);

    /// Velocity to apply for this tick.
    fn set_velocity(&mut self, velocity: Vec2);
}

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the platformer
/// controller. Collision probing is provided by the backend's plugin, which
/// fills each controller's `CollisionReport` during
/// [`PlatformerSet::Sensors`].
///
/// For an example implementation, see the `rapier` module's `Rapier2dBackend`.
pub trait PlatformerPhysicsBackend: 'static + Send + Sync {
    /// The velocity component type used by this backend.
    type VelocityComponent: Component;

    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Move an entity.
    fn set_position(world: &mut World, entity: Entity, position: Vec2);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        fixed_timestep(world)
    }
}

/// Fixed timestep from `Time<Fixed>`, falling back to 60 Hz when the resource
/// is missing or has not advanced yet.
pub fn fixed_timestep(world: &World) -> f32 {
    world
        .get_resource::<Time<Fixed>>()
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0)
}

/// [`CharacterBody`] view of one entity through backend `B`.
pub struct BackendBody<'w, B: PlatformerPhysicsBackend> {
    world: &'w mut World,
    entity: Entity,
    _backend: PhantomData<B>,
}

impl<'w, B: PlatformerPhysicsBackend> BackendBody<'w, B> {
    pub fn new(world: &'w mut World, entity: Entity) -> Self {
        Self {
            world,
            entity,
            _backend: PhantomData,
        }
    }
}

impl<B: PlatformerPhysicsBackend> CharacterBody for BackendBody<'_, B> {
    fn position(&self) -> Vec2 {
        B::get_position(self.world, self.entity)
    }

    fn velocity(&self) -> Vec2 {
        B::get_velocity(self.world, self.entity)
    }

    fn set_position(&mut self, position: Vec2) {
        B::set_position(self.world, self.entity, position);
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        B::set_velocity(self.world, self.entity, velocity);
    }
}

/// Stand-alone body without any physics engine.
///
/// Useful for headless simulation. Call [`KinematicBody::integrate`] after each
/// controller tick to advance the position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KinematicBody {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl KinematicBody {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }

    /// Advance the position by the current velocity.
    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }
}

impl CharacterBody for KinematicBody {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn velocity(&self) -> Vec2 {
        self.velocity
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }
}

/// Velocity of an entity driven by [`KinematicBackend`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct KinematicVelocity(pub Vec2);

/// Backend that moves `Transform`s directly, with no collision response.
///
/// It has no sensors of its own: something else (level code, a custom
/// probe, tests) must keep each controller's `CollisionReport` up to date.
pub struct KinematicBackend;

impl PlatformerPhysicsBackend for KinematicBackend {
    type VelocityComponent = KinematicVelocity;

    fn plugin() -> impl Plugin {
        KinematicBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<KinematicVelocity>(entity)
            .map(|v| v.0)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<KinematicVelocity>(entity) {
            vel.0 = velocity;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .unwrap_or(Vec2::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec2) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation.x = position.x;
            transform.translation.y = position.y;
        }
    }
}

/// Plugin integrating [`KinematicVelocity`] into `Transform`.
pub struct KinematicBackendPlugin;

impl Plugin for KinematicBackendPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<KinematicVelocity>();
        app.add_systems(
            FixedUpdate,
            integrate_kinematic_bodies.in_set(PlatformerSet::FinalApplication),
        );
    }
}

fn integrate_kinematic_bodies(
    time: Option<Res<Time<Fixed>>>,
    mut q: Query<(&KinematicVelocity, &mut Transform)>,
) {
    let dt = time
        .map(|t| t.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0);

    for (velocity, mut transform) in &mut q {
        transform.translation += (velocity.0 * dt).extend(0.0);
    }
}
