//! Collision probing.
//!
//! The controller never talks to a physics engine directly. Each tick, a
//! [`CollisionProbe`] implementation is queried by [`check_collisions`] and the
//! answers are gathered into a [`CollisionReport`], which the state machine
//! then consumes. All queries are read-only.
//!
//! Whether trigger (sensor) colliders are visible to a query is part of each
//! query's [`ProbeFilter`], never a global toggle, so the ladder query cannot
//! leak trigger visibility into the ground or ceiling probes.

use bevy::prelude::*;

use crate::collision::{CollisionData, ShapeHits};
use crate::config::StatsConfig;

/// Per-query filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeFilter {
    /// Layer bits the query may hit.
    pub mask: u32,
    /// Whether trigger/sensor colliders are reported.
    pub hit_triggers: bool,
}

impl ProbeFilter {
    /// Solid colliders on `mask`, triggers ignored.
    pub fn solid(mask: u32) -> Self {
        Self {
            mask,
            hit_triggers: false,
        }
    }

    /// Trigger volumes (and solids) on `mask`.
    pub fn triggers(mask: u32) -> Self {
        Self {
            mask,
            hit_triggers: true,
        }
    }
}

/// Axis-aligned footprint of the character's collider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyBounds {
    /// Collider centre in world space.
    pub center: Vec2,
    /// Half width and half height.
    pub half_extents: Vec2,
}

impl BodyBounds {
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Bottom-centre of the footprint.
    #[inline]
    pub fn feet(&self) -> Vec2 {
        self.center - Vec2::new(0.0, self.half_extents.y)
    }
}

/// Capability to query the environment around one character.
///
/// Implementations know the character's own collider (used for the shape
/// casts) and must exclude the character from every result.
pub trait CollisionProbe {
    /// Sweep the character's collider along `direction` for `distance`.
    fn cast_body(&self, direction: Vec2, distance: f32, filter: ProbeFilter) -> ShapeHits;

    /// Colliders overlapping an axis-aligned box.
    ///
    /// Each hit's `point` is the position of the overlapped collider.
    fn overlap_box(&self, center: Vec2, size: Vec2, filter: ProbeFilter) -> ShapeHits;

    /// Single ray, returning the first hit with its surface normal.
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        distance: f32,
        filter: ProbeFilter,
    ) -> Option<CollisionData>;
}

/// Everything the state machine needs to know about the surroundings for one tick.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionReport {
    /// Hits from the downward body cast.
    pub ground: ShapeHits,
    /// Hits from the upward body cast.
    pub ceiling: ShapeHits,
    /// Solid colliders inside the wall detector box.
    pub walls: ShapeHits,
    /// Ladder volume overlapping the detector box, if any.
    pub ladder: Option<CollisionData>,
    /// Normal of the ground directly below the feet. `None` when nothing is hit.
    pub ground_normal: Option<Vec2>,
}

impl CollisionReport {
    /// No contact at all.
    pub fn airborne() -> Self {
        Self::default()
    }

    /// Standing on ground with the given surface normal.
    pub fn grounded(normal: Vec2) -> Self {
        Self::default().with_ground(normal)
    }

    /// Builder: add a ground contact with `normal`.
    pub fn with_ground(mut self, normal: Vec2) -> Self {
        self.ground
            .push(CollisionData::new(0.0, normal, Vec2::ZERO, None));
        self.ground_normal = Some(normal);
        self
    }

    /// Builder: add a ceiling contact.
    pub fn with_ceiling(mut self) -> Self {
        self.ceiling
            .push(CollisionData::new(0.0, Vec2::NEG_Y, Vec2::ZERO, None));
        self
    }

    /// Builder: add a wall contact.
    pub fn with_wall(mut self) -> Self {
        self.walls
            .push(CollisionData::new(0.0, Vec2::ZERO, Vec2::ZERO, None));
        self
    }

    /// Builder: overlap a ladder centred at `center`.
    pub fn with_ladder(mut self, center: Vec2) -> Self {
        self.ladder = Some(CollisionData::new(0.0, Vec2::ZERO, center, None));
        self
    }

    #[inline]
    pub fn touching_ground(&self) -> bool {
        !self.ground.is_empty()
    }

    #[inline]
    pub fn touching_ceiling(&self) -> bool {
        !self.ceiling.is_empty()
    }

    #[inline]
    pub fn touching_wall(&self) -> bool {
        !self.walls.is_empty()
    }

    #[inline]
    pub fn overlapping_ladder(&self) -> bool {
        self.ladder.is_some()
    }
}

/// Run every probe query for one tick.
///
/// Ground and ceiling casts sweep the body's own collider by
/// `grounder_distance`, ignoring the player's layer and all triggers. The
/// ladder query is the only one that sees triggers and only runs when ladders
/// are enabled. The ground normal comes from a ray fired downward from just
/// above the feet, reaching `grounder_distance` below them.
pub fn check_collisions<P: CollisionProbe>(
    probe: &P,
    bounds: &BodyBounds,
    stats: &StatsConfig,
) -> CollisionReport {
    let solid = ProbeFilter::solid(!stats.player_layer);

    let ground = probe.cast_body(Vec2::NEG_Y, stats.grounder_distance, solid);
    let ceiling = probe.cast_body(Vec2::Y, stats.grounder_distance, solid);

    let walls = probe.overlap_box(
        bounds.center,
        stats.wall_detector_size,
        ProbeFilter::solid(stats.ground_layer & !stats.player_layer),
    );

    let ladder = if stats.allow_ladders {
        probe
            .overlap_box(
                bounds.center,
                stats.wall_detector_size,
                ProbeFilter::triggers(stats.ladder_layer),
            )
            .first()
            .copied()
    } else {
        None
    };

    let ray_origin = bounds.feet() + Vec2::new(0.0, stats.grounder_distance);
    let ground_normal = probe
        .raycast(
            ray_origin,
            Vec2::NEG_Y,
            stats.grounder_distance * 2.0,
            solid,
        )
        .map(|hit| hit.normal);

    CollisionReport {
        ground,
        ceiling,
        walls,
        ladder,
        ground_normal,
    }
}
