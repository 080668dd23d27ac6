//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::parry::shape::{Cuboid, SharedShape};
use bevy_rapier2d::prelude::*;

use crate::backend::PlatformerPhysicsBackend;
use crate::collision::{CollisionData, ShapeHits};
use crate::config::ControllerStats;
use crate::controller::PlatformerController;
use crate::detection::{check_collisions, BodyBounds, CollisionProbe, CollisionReport, ProbeFilter};
use crate::PlatformerSet;

/// Rapier2D physics backend for the platformer controller.
///
/// Velocities are written straight into Rapier's [`Velocity`]. Collision
/// probing (shape casts, overlaps, rays) is handled by a dedicated system
/// that receives `RapierContext` as a system parameter.
pub struct Rapier2dBackend;

impl PlatformerPhysicsBackend for Rapier2dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec2) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation.x = position.x;
            transform.translation.y = position.y;
        }
    }
}

/// Plugin that sets up Rapier2D-specific systems for the platformer controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            rapier_collision_detection.in_set(PlatformerSet::Sensors),
        );
    }
}

/// Half width and half height of a collider's local bounding box.
pub fn collider_half_extents(collider: &Collider) -> Vec2 {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let half = (segment.a() - segment.b()).abs() / 2.0;
        half + Vec2::splat(capsule.radius())
    } else if let Some(ball) = collider.as_ball() {
        Vec2::splat(ball.radius())
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents()
    } else {
        // Unknown shape: treat as a point
        Vec2::ZERO
    }
}

/// Build a Rapier query filter for one probe query.
fn query_filter(exclude_entity: Entity, filter: ProbeFilter) -> QueryFilter<'static> {
    let mut query = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(filter.mask),
        ));

    if !filter.hit_triggers {
        query = query.exclude_sensors();
    }

    query
}

/// [`CollisionProbe`] backed by a `RapierContext`.
///
/// `locate` resolves the world position of an overlapped collider, which
/// becomes the hit's `point` (ladders snap to it).
pub struct RapierProbe<'a, 'c, F> {
    pub context: &'a RapierContext<'c>,
    pub entity: Entity,
    pub shape: &'a Collider,
    pub position: Vec2,
    pub rotation: f32,
    pub locate: F,
}

impl<F> CollisionProbe for RapierProbe<'_, '_, F>
where
    F: Fn(Entity) -> Option<Vec2>,
{
    fn cast_body(&self, direction: Vec2, distance: f32, filter: ProbeFilter) -> ShapeHits {
        let mut hits = ShapeHits::none();
        let mut query = query_filter(self.entity, filter);

        // Rapier reports the closest hit only; exclude it and cast again
        while !hits.is_full() {
            let Some((hit_entity, hit)) = self.context.cast_shape(
                self.position,
                self.rotation,
                direction,
                self.shape,
                ShapeCastOptions {
                    max_time_of_impact: distance,
                    stop_at_penetration: false,
                    ..default()
                },
                query,
            ) else {
                break;
            };

            let normal = hit.details.map(|d| d.normal1).unwrap_or(-direction);
            let point = self.position + direction * hit.time_of_impact;
            hits.push(CollisionData::new(
                hit.time_of_impact,
                normal,
                point,
                Some(hit_entity),
            ));
            query = query.exclude_collider(hit_entity);
        }

        hits
    }

    fn overlap_box(&self, center: Vec2, size: Vec2, filter: ProbeFilter) -> ShapeHits {
        let cuboid = Cuboid::new((size / 2.0).into());
        let mut hits = ShapeHits::none();

        self.context.intersections_with_shape(
            center,
            0.0,
            &Collider::from(SharedShape::new(cuboid)),
            query_filter(self.entity, filter),
            |hit_entity| {
                let point = (self.locate)(hit_entity).unwrap_or(center);
                hits.push(CollisionData::new(0.0, Vec2::ZERO, point, Some(hit_entity)))
            },
        );

        hits
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        distance: f32,
        filter: ProbeFilter,
    ) -> Option<CollisionData> {
        self.context
            .cast_ray_and_get_normal(
                origin,
                direction,
                distance,
                true,
                query_filter(self.entity, filter),
            )
            .map(|(hit_entity, hit)| {
                CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
            })
    }
}

/// Rapier-specific collision detection, filling each controller's
/// [`CollisionReport`] for this tick.
fn rapier_collision_detection(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<
        (
            Entity,
            &GlobalTransform,
            &ControllerStats,
            &Collider,
            &mut CollisionReport,
        ),
        With<PlatformerController>,
    >,
    q_transforms: Query<&GlobalTransform>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    let locate = |hit_entity: Entity| {
        q_transforms
            .get(hit_entity)
            .ok()
            .map(|t| t.translation().xy())
    };

    for (entity, transform, stats, collider, mut report) in &mut q_controllers {
        let position = transform.translation().xy();
        let (_, rotation, _) = transform.to_scale_rotation_translation();
        let (_, _, angle) = rotation.to_euler(EulerRot::XYZ);

        let probe = RapierProbe {
            context: &context,
            entity,
            shape: collider,
            position,
            rotation: angle,
            locate,
        };
        let bounds = BodyBounds::new(position, collider_half_extents(collider));

        *report = check_collisions(&probe, &bounds, stats);
    }
}

/// Physics components for a Rapier-driven platformer character.
///
/// The controller owns gravity and friction-like deceleration itself, so the
/// body ignores Rapier's gravity and has no friction.
///
/// Level colliders should carry [`CollisionGroups`] matching the stats'
/// layer masks (ground colliders on `ground_layer`, ladder sensors on
/// `ladder_layer`), since colliders without groups belong to every layer.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use platformer_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         PlatformerController::default(),
///         ControllerStats::new(StatsConfig::climber()),
///         ControlIntent::default(),
///         Rapier2dPlatformerBundle::new(),
///         Collider::capsule_y(0.5, 0.25),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dPlatformerBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`].
    pub rigid_body: RigidBody,
    /// Written by the controller every tick while it has control.
    pub velocity: Velocity,
    /// Rotation is locked so the character stays upright.
    pub locked_axes: LockedAxes,
    /// Zero: the controller applies its own fall acceleration.
    pub gravity_scale: GravityScale,
    /// Zero: sliding along walls and floors is handled by the controller.
    pub friction: Friction,
}

impl Default for Rapier2dPlatformerBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dPlatformerBundle {
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::zero(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            gravity_scale: GravityScale(0.0),
            friction: Friction::coefficient(0.0),
        }
    }

    /// Set the rigid body type for the character.
    ///
    /// ```ignore
    /// let bundle = Rapier2dPlatformerBundle::new()
    ///     .with_body(RigidBody::KinematicVelocityBased);
    /// ```
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the friction coefficient against level geometry.
    pub fn with_friction(mut self, coefficient: f32) -> Self {
        self.friction = Friction::coefficient(coefficient);
        self
    }
}
