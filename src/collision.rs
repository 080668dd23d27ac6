//! Raw collision query results.
//!
//! [`CollisionData`] describes a single hit; [`ShapeHits`] is the bounded,
//! ordered hit list returned by shape casts and overlap queries.

use bevy::prelude::*;

/// Maximum number of hits retained per probe query.
pub const MAX_SHAPE_HITS: usize = 2;

/// Information about a raycast/shapecast/overlap hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance travelled along the cast before the hit (zero for overlaps).
    pub distance: f32,
    /// Normal of the surface at hit point.
    pub normal: Vec2,
    /// World position of the hit point. For overlaps, the position of the
    /// overlapped collider.
    pub point: Vec2,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a collision result.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// Ordered list of at most [`MAX_SHAPE_HITS`] hits.
///
/// No contact is an empty list, never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeHits {
    hits: [CollisionData; MAX_SHAPE_HITS],
    count: usize,
}

impl ShapeHits {
    /// An empty hit list.
    pub fn none() -> Self {
        Self::default()
    }

    /// A list holding exactly one hit.
    pub fn single(hit: CollisionData) -> Self {
        let mut hits = Self::default();
        hits.push(hit);
        hits
    }

    /// Append a hit. Returns `false` (and drops the hit) when full.
    pub fn push(&mut self, hit: CollisionData) -> bool {
        if self.is_full() {
            return false;
        }
        self.hits[self.count] = hit;
        self.count += 1;
        true
    }

    /// Number of hits recorded.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == MAX_SHAPE_HITS
    }

    /// Closest (first recorded) hit.
    pub fn first(&self) -> Option<&CollisionData> {
        self.as_slice().first()
    }

    pub fn as_slice(&self) -> &[CollisionData] {
        &self.hits[..self.count]
    }

    pub fn iter(&self) -> impl Iterator<Item = &CollisionData> {
        self.as_slice().iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_data_new() {
        let cast = CollisionData::new(5.0, Vec2::Y, Vec2::new(10.0, 0.0), None);

        assert_eq!(cast.distance, 5.0);
        assert_eq!(cast.normal, Vec2::Y);
        assert_eq!(cast.point, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn collision_data_with_entity() {
        let entity = Entity::from_raw(42);
        let cast = CollisionData::new(3.0, Vec2::X, Vec2::ZERO, Some(entity));

        assert_eq!(cast.entity, Some(entity));
    }

    #[test]
    fn shape_hits_are_bounded() {
        let mut hits = ShapeHits::none();
        assert!(hits.is_empty());
        assert!(hits.first().is_none());

        assert!(hits.push(CollisionData::new(0.1, Vec2::Y, Vec2::ZERO, None)));
        assert!(hits.push(CollisionData::new(0.2, Vec2::Y, Vec2::ZERO, None)));
        assert!(!hits.push(CollisionData::new(0.3, Vec2::Y, Vec2::ZERO, None)));

        assert_eq!(hits.count(), MAX_SHAPE_HITS);
        assert!(hits.is_full());
        assert_eq!(hits.first().map(|h| h.distance), Some(0.1));
        assert_eq!(hits.iter().count(), 2);
    }

    #[test]
    fn single_holds_one_hit() {
        let hits = ShapeHits::single(CollisionData::new(0.0, Vec2::Y, Vec2::ONE, None));
        assert_eq!(hits.count(), 1);
        assert_eq!(hits.as_slice()[0].point, Vec2::ONE);
    }
}
