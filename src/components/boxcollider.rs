use bevy_ecs::prelude::Component;
use glam::Vec2;
use serde::Deserialize;

/// Axis-aligned box centered on the entity position plus `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Component, Deserialize)]
pub struct BoxCollider {
    pub size: Vec2,
    #[serde(default)]
    pub offset: Vec2,
}

impl BoxCollider {
    /// Create a BoxCollider with given size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::ZERO,
        }
    }

    /// Modify BoxCollider with given size and offset
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Returns (min, max) of the collider AABB for a given entity position.
    /// Handles negative size by normalizing to proper min/max.
    pub fn aabb(&self, position: Vec2) -> (Vec2, Vec2) {
        let center = position + self.offset;
        let half = self.size.abs() * 0.5;
        (center - half, center + half)
    }

    /// Same as [`aabb`](Self::aabb) but shrunk by `amount` on every side.
    pub fn inset_aabb(&self, position: Vec2, amount: f32) -> (Vec2, Vec2) {
        let (min, max) = self.aabb(position);
        let inset = Vec2::splat(amount).min((max - min) * 0.5);
        (min + inset, max - inset)
    }

    /// AABB vs AABB overlap test against another BoxCollider at a different entity position.
    pub fn overlaps(&self, position: Vec2, other: &Self, other_position: Vec2) -> bool {
        let (min_a, max_a) = self.aabb(position);
        let (min_b, max_b) = other.aabb(other_position);
        aabb_overlap(min_a, max_a, min_b, max_b)
    }

    /// Point containment in world space.
    pub fn contains_point(&self, position: Vec2, point: Vec2) -> bool {
        let (min, max) = self.aabb(position);
        point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
    }
}

/// Strict overlap of two boxes given as (min, max); touching edges do not count.
pub fn aabb_overlap(min_a: Vec2, max_a: Vec2, min_b: Vec2, max_b: Vec2) -> bool {
    min_a.x < max_b.x && max_a.x > min_b.x && min_a.y < max_b.y && max_a.y > min_b.y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_is_centered_on_position() {
        let collider = BoxCollider::new(2.0, 4.0);
        let (min, max) = collider.aabb(Vec2::new(1.0, 1.0));
        assert_eq!(min, Vec2::new(0.0, -1.0));
        assert_eq!(max, Vec2::new(2.0, 3.0));
    }

    #[test]
    fn offset_moves_the_box() {
        let collider = BoxCollider::new(1.0, 1.0).with_offset(Vec2::new(0.5, 0.0));
        let (min, max) = collider.aabb(Vec2::ZERO);
        assert_eq!(min, Vec2::new(0.0, -0.5));
        assert_eq!(max, Vec2::new(1.0, 0.5));
    }

    #[test]
    fn inset_never_inverts_the_box() {
        let collider = BoxCollider::new(0.1, 2.0);
        let (min, max) = collider.inset_aabb(Vec2::ZERO, 0.5);
        assert!(min.x <= max.x);
        assert!((max.y - min.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn overlap_excludes_touching_edges() {
        let a = BoxCollider::new(1.0, 1.0);
        let b = BoxCollider::new(1.0, 1.0);
        assert!(a.overlaps(Vec2::ZERO, &b, Vec2::new(0.9, 0.0)));
        assert!(!a.overlaps(Vec2::ZERO, &b, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn contains_point_includes_edges() {
        let collider = BoxCollider::new(2.0, 2.0);
        assert!(collider.contains_point(Vec2::ZERO, Vec2::new(1.0, 1.0)));
        assert!(!collider.contains_point(Vec2::ZERO, Vec2::new(1.1, 0.0)));
    }
}
