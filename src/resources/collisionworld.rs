//! Raycast world used by every collision body.
//!
//! The [`CollisionWorld`] resource stores two kinds of convex shapes:
//!
//! - **static** shapes built once from the level geometry (boxes, slopes,
//!   tile grids)
//! - **dynamic** shapes mirroring the [`BoxCollider`] of entities, keyed by
//!   entity and refreshed every frame by
//!   [`sync_collision_world`](crate::systems::collisionworld::sync_collision_world)
//!
//! Queries filter shapes by [`LayerMask`] and can exclude one entity (the
//! caller). A ray that starts inside a shape reports a hit at distance zero,
//! which the collision bodies never resolve against.
//!
//! [`BoxCollider`]: crate::components::boxcollider::BoxCollider

use bevy_ecs::prelude::{Component, Entity, Resource};
use glam::Vec2;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::components::boxcollider::aabb_overlap;
use crate::components::collisionlayer::{Layer, LayerMask};

const PARALLEL_EPSILON: f32 = 1e-9;

/// How a shape reacts to bodies moving onto it.
///
/// Also used as a component on entities whose collider is mirrored, e.g.
/// one-way moving platforms.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Blocks from every side.
    #[default]
    Solid,
    /// One-way: only blocks bodies falling onto it. Can be dropped through.
    Through,
    /// Never blocks; purely decorative.
    Fake,
}

/// Identity of a collider returned by queries.
///
/// Ordered statics first, then by entity. Raycasts use this order to pick
/// among hits at the same distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColliderRef {
    /// Index into the static shape list.
    Static(usize),
    /// Entity whose collider is mirrored.
    Entity(Entity),
}

impl ColliderRef {
    pub fn entity(self) -> Option<Entity> {
        match self {
            ColliderRef::Entity(entity) => Some(entity),
            ColliderRef::Static(_) => None,
        }
    }
}

/// Convex polygon with counter-clockwise winding.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexShape {
    vertices: SmallVec<[Vec2; 4]>,
    normals: SmallVec<[Vec2; 4]>,
    min: Vec2,
    max: Vec2,
}

impl ConvexShape {
    pub fn from_box(min: Vec2, max: Vec2) -> Self {
        let (min, max) = (min.min(max), min.max(max));
        let vertices: SmallVec<[Vec2; 4]> = SmallVec::from_buf([
            min,
            Vec2::new(max.x, min.y),
            max,
            Vec2::new(min.x, max.y),
        ]);
        Self::from_ccw(vertices)
    }

    /// Build a polygon from arbitrary-order points.
    ///
    /// Clockwise input is reversed. Fails on fewer than three points, zero
    /// area, or a non-convex outline.
    pub fn from_points(points: &[Vec2]) -> Result<Self, String> {
        if points.len() < 3 {
            return Err(format!("Polygon needs at least 3 points, got {}", points.len()));
        }
        let area = signed_area(points);
        if area.abs() <= f32::EPSILON {
            return Err("Polygon has zero area".to_string());
        }
        let mut vertices: SmallVec<[Vec2; 4]> = points.iter().copied().collect();
        if area < 0.0 {
            vertices.reverse();
        }
        let count = vertices.len();
        for i in 0..count {
            let a = vertices[i];
            let b = vertices[(i + 1) % count];
            let c = vertices[(i + 2) % count];
            if (b - a).perp_dot(c - b) < -f32::EPSILON {
                return Err("Polygon is not convex".to_string());
            }
        }
        Ok(Self::from_ccw(vertices))
    }

    fn from_ccw(vertices: SmallVec<[Vec2; 4]>) -> Self {
        let count = vertices.len();
        let normals = (0..count)
            .map(|i| {
                let edge = vertices[(i + 1) % count] - vertices[i];
                Vec2::new(edge.y, -edge.x).normalize_or_zero()
            })
            .collect();
        let (min, max) = vertices
            .iter()
            .fold((Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        Self {
            vertices,
            normals,
            min,
            max,
        }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Bounding box as (min, max).
    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.min, self.max)
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        self.vertices
            .iter()
            .zip(self.normals.iter())
            .all(|(v, n)| n.dot(point - *v) <= 0.0)
    }

    /// Cast a ray against the polygon.
    ///
    /// Returns the hit distance along `direction` (expected normalized) and
    /// the outward normal of the entered edge. Origins inside the polygon
    /// hit at distance zero with the normal opposing the ray.
    pub fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<(f32, Vec2)> {
        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_normal = -direction;

        for (vertex, normal) in self.vertices.iter().zip(self.normals.iter()) {
            let offset = normal.dot(origin - *vertex);
            let rate = normal.dot(direction);
            if rate.abs() <= PARALLEL_EPSILON {
                if offset > 0.0 {
                    return None;
                }
                continue;
            }
            let t = -offset / rate;
            if rate < 0.0 {
                if t > t_enter {
                    t_enter = t;
                    enter_normal = *normal;
                }
            } else if t < t_exit {
                t_exit = t;
            }
            if t_enter > t_exit {
                return None;
            }
        }

        if t_exit < 0.0 {
            return None;
        }
        if t_enter <= 0.0 {
            return Some((0.0, -direction));
        }
        if t_enter > max_distance {
            return None;
        }
        Some((t_enter, enter_normal))
    }
}

fn signed_area(points: &[Vec2]) -> f32 {
    let count = points.len();
    (0..count)
        .map(|i| points[i].perp_dot(points[(i + 1) % count]))
        .sum::<f32>()
        * 0.5
}

/// A shape registered in the world with its filtering data.
#[derive(Debug, Clone)]
pub struct ShapeEntry {
    pub shape: ConvexShape,
    pub layer: Layer,
    pub platform: PlatformKind,
}

/// Result of a successful raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec2,
    pub normal: Vec2,
    pub layer: Layer,
    pub platform: PlatformKind,
    pub collider: ColliderRef,
}

impl RayHit {
    pub fn entity(&self) -> Option<Entity> {
        self.collider.entity()
    }
}

/// Static and dynamic collision geometry queried by raycasts.
#[derive(Resource, Debug, Default, Clone)]
pub struct CollisionWorld {
    statics: Vec<ShapeEntry>,
    dynamics: FxHashMap<Entity, ShapeEntry>,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a static shape and return its index.
    pub fn add_static(&mut self, shape: ConvexShape, layer: Layer, platform: PlatformKind) -> usize {
        self.statics.push(ShapeEntry {
            shape,
            layer,
            platform,
        });
        self.statics.len() - 1
    }

    pub fn statics(&self) -> &[ShapeEntry] {
        &self.statics
    }

    pub fn static_shape(&self, index: usize) -> Option<&ShapeEntry> {
        self.statics.get(index)
    }

    /// Layer of the collider behind `collider`, if it still exists.
    pub fn layer_of(&self, collider: ColliderRef) -> Option<Layer> {
        match collider {
            ColliderRef::Static(index) => self.statics.get(index).map(|entry| entry.layer),
            ColliderRef::Entity(entity) => self.dynamics.get(&entity).map(|entry| entry.layer),
        }
    }

    /// Insert or replace the box mirrored for `entity`.
    pub fn set_dynamic(
        &mut self,
        entity: Entity,
        min: Vec2,
        max: Vec2,
        layer: Layer,
        platform: PlatformKind,
    ) {
        self.dynamics.insert(
            entity,
            ShapeEntry {
                shape: ConvexShape::from_box(min, max),
                layer,
                platform,
            },
        );
    }

    /// Move an already mirrored box to new bounds, keeping its layer data.
    pub fn move_dynamic(&mut self, entity: Entity, min: Vec2, max: Vec2) -> bool {
        if let Some(entry) = self.dynamics.get_mut(&entity) {
            entry.shape = ConvexShape::from_box(min, max);
            true
        } else {
            false
        }
    }

    pub fn remove_dynamic(&mut self, entity: Entity) {
        self.dynamics.remove(&entity);
    }

    /// Drop every dynamic shape whose entity fails `keep`.
    pub fn retain_dynamics(&mut self, mut keep: impl FnMut(Entity) -> bool) {
        self.dynamics.retain(|entity, _| keep(*entity));
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamics.len()
    }

    pub fn dynamics(&self) -> impl Iterator<Item = (Entity, &ShapeEntry)> {
        self.dynamics.iter().map(|(entity, entry)| (*entity, entry))
    }

    /// Remove all geometry.
    pub fn clear(&mut self) {
        self.statics.clear();
        self.dynamics.clear();
    }

    fn entries(&self) -> impl Iterator<Item = (ColliderRef, &ShapeEntry)> {
        self.statics
            .iter()
            .enumerate()
            .map(|(i, entry)| (ColliderRef::Static(i), entry))
            .chain(
                self.dynamics
                    .iter()
                    .map(|(entity, entry)| (ColliderRef::Entity(*entity), entry)),
            )
    }

    /// Nearest hit along the ray among shapes on `mask`, ignoring `exclude`.
    pub fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        self.raycast_filtered(origin, direction, max_distance, mask, exclude, |_| true)
    }

    /// Like [`raycast`](Self::raycast) but only shapes whose platform kind
    /// passes `accept` can block the ray.
    pub fn raycast_filtered(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
        exclude: Option<Entity>,
        accept: impl Fn(PlatformKind) -> bool,
    ) -> Option<RayHit> {
        let direction = direction.normalize_or_zero();
        if direction == Vec2::ZERO || max_distance < 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for (collider, entry) in self.entries() {
            if !mask.contains_layer(entry.layer) {
                continue;
            }
            if exclude.is_some() && collider.entity() == exclude {
                continue;
            }
            if !accept(entry.platform) {
                continue;
            }
            let Some((distance, normal)) = entry.shape.raycast(origin, direction, max_distance)
            else {
                continue;
            };
            let nearer = best.is_none_or(|hit| {
                distance < hit.distance || (distance == hit.distance && collider < hit.collider)
            });
            if nearer {
                best = Some(RayHit {
                    distance,
                    point: origin + direction * distance,
                    normal,
                    layer: entry.layer,
                    platform: entry.platform,
                    collider,
                });
            }
        }
        best
    }

    /// Colliders on `mask` whose bounds strictly overlap the box (min, max).
    pub fn overlap_box(
        &self,
        min: Vec2,
        max: Vec2,
        mask: LayerMask,
        exclude: Option<Entity>,
    ) -> SmallVec<[ColliderRef; 8]> {
        self.entries()
            .filter(|(collider, entry)| {
                mask.contains_layer(entry.layer)
                    && !(exclude.is_some() && collider.entity() == exclude)
            })
            .filter(|(_, entry)| {
                let (shape_min, shape_max) = entry.shape.bounds();
                aabb_overlap(min, max, shape_min, shape_max)
            })
            .map(|(collider, _)| collider)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    const EPSILON: f32 = 1e-5;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn ground_mask() -> LayerMask {
        LayerMask::from_layers(&[Layer::Ground])
    }

    // ==================== SHAPE TESTS ====================

    #[test]
    fn box_normals_point_outwards() {
        let shape = ConvexShape::from_box(Vec2::ZERO, Vec2::new(2.0, 1.0));
        let (distance, normal) = shape
            .raycast(Vec2::new(1.0, 3.0), Vec2::new(0.0, -1.0), 10.0)
            .unwrap();
        assert!(approx_eq(distance, 2.0));
        assert_eq!(normal, Vec2::Y);

        let (distance, normal) = shape
            .raycast(Vec2::new(-1.0, 0.5), Vec2::X, 10.0)
            .unwrap();
        assert!(approx_eq(distance, 1.0));
        assert_eq!(normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn ray_inside_shape_hits_at_zero() {
        let shape = ConvexShape::from_box(Vec2::ZERO, Vec2::ONE);
        let (distance, normal) = shape.raycast(Vec2::splat(0.5), Vec2::X, 1.0).unwrap();
        assert_eq!(distance, 0.0);
        assert_eq!(normal, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn ray_respects_max_distance_and_direction() {
        let shape = ConvexShape::from_box(Vec2::new(5.0, 0.0), Vec2::new(6.0, 1.0));
        assert!(shape.raycast(Vec2::new(0.0, 0.5), Vec2::X, 4.9).is_none());
        assert!(shape.raycast(Vec2::new(0.0, 0.5), Vec2::X, 5.0).is_some());
        assert!(shape.raycast(Vec2::new(0.0, 0.5), -Vec2::X, 100.0).is_none());
        assert!(shape.raycast(Vec2::new(0.0, 2.0), Vec2::X, 100.0).is_none());
    }

    #[test]
    fn slope_normal_is_diagonal() {
        // 45 degree ramp rising to the right.
        let shape = ConvexShape::from_points(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 2.0),
        ])
        .unwrap();
        let (distance, normal) = shape
            .raycast(Vec2::new(1.5, 5.0), Vec2::new(0.0, -1.0), 10.0)
            .unwrap();
        assert!(approx_eq(distance, 3.5));
        assert!(approx_eq(normal.x, -std::f32::consts::FRAC_1_SQRT_2));
        assert!(approx_eq(normal.y, std::f32::consts::FRAC_1_SQRT_2));
    }

    #[test]
    fn clockwise_points_are_reordered() {
        let shape = ConvexShape::from_points(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ])
        .unwrap();
        assert!(shape.contains_point(Vec2::splat(0.5)));
        assert!(!shape.contains_point(Vec2::new(1.5, 0.5)));
    }

    #[test]
    fn degenerate_and_concave_polygons_are_rejected() {
        assert!(ConvexShape::from_points(&[Vec2::ZERO, Vec2::X]).is_err());
        assert!(ConvexShape::from_points(&[Vec2::ZERO, Vec2::X, Vec2::new(2.0, 0.0)]).is_err());
        let concave = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(1.0, 0.5),
            Vec2::new(2.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        assert!(ConvexShape::from_points(&concave).is_err());
    }

    // ==================== WORLD QUERY TESTS ====================

    #[test]
    fn raycast_returns_nearest_hit() {
        let mut world = CollisionWorld::new();
        world.add_static(
            ConvexShape::from_box(Vec2::new(5.0, 0.0), Vec2::new(6.0, 1.0)),
            Layer::Ground,
            PlatformKind::Solid,
        );
        let near = world.add_static(
            ConvexShape::from_box(Vec2::new(2.0, 0.0), Vec2::new(3.0, 1.0)),
            Layer::Ground,
            PlatformKind::Solid,
        );
        let hit = world
            .raycast(Vec2::new(0.0, 0.5), Vec2::X, 10.0, ground_mask(), None)
            .unwrap();
        assert_eq!(hit.collider, ColliderRef::Static(near));
        assert!(approx_eq(hit.distance, 2.0));
        assert!(approx_eq(hit.point.x, 2.0));
    }

    #[test]
    fn raycast_filters_by_mask() {
        let mut world = CollisionWorld::new();
        world.add_static(
            ConvexShape::from_box(Vec2::new(2.0, 0.0), Vec2::new(3.0, 1.0)),
            Layer::Wall,
            PlatformKind::Solid,
        );
        assert!(
            world
                .raycast(Vec2::new(0.0, 0.5), Vec2::X, 10.0, ground_mask(), None)
                .is_none()
        );
        assert!(
            world
                .raycast(Vec2::new(0.0, 0.5), Vec2::X, 10.0, LayerMask::ALL, None)
                .is_some()
        );
    }

    #[test]
    fn raycast_excludes_caller_entity() {
        let mut world = CollisionWorld::new();
        let mut ecs = World::new();
        let me = ecs.spawn_empty().id();
        let other = ecs.spawn_empty().id();
        world.set_dynamic(me, Vec2::new(-0.5, -0.5), Vec2::new(0.5, 0.5), Layer::Player, PlatformKind::Solid);
        world.set_dynamic(other, Vec2::new(2.0, -0.5), Vec2::new(3.0, 0.5), Layer::Player, PlatformKind::Solid);
        let mask = LayerMask::from_layers(&[Layer::Player]);
        let hit = world
            .raycast(Vec2::ZERO, Vec2::X, 10.0, mask, Some(me))
            .unwrap();
        assert_eq!(hit.entity(), Some(other));
        let hit = world.raycast(Vec2::ZERO, Vec2::X, 10.0, mask, None).unwrap();
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn equal_distance_hits_resolve_by_collider_order() {
        let mut world = CollisionWorld::new();
        let mut ecs = World::new();
        let entities: Vec<Entity> = (0..16).map(|_| ecs.spawn_empty().id()).collect();
        for entity in entities.iter().rev() {
            world.set_dynamic(*entity, Vec2::new(2.0, -0.5), Vec2::new(3.0, 0.5), Layer::Wall, PlatformKind::Solid);
        }
        let mask = LayerMask::from_layers(&[Layer::Wall]);
        let hit = world.raycast(Vec2::ZERO, Vec2::X, 10.0, mask, None).unwrap();
        assert_eq!(hit.entity(), Some(entities[0]));
        let hit = world
            .raycast(Vec2::ZERO, Vec2::X, 10.0, mask, Some(entities[0]))
            .unwrap();
        assert_eq!(hit.entity(), Some(entities[1]));

        let wall = world.add_static(
            ConvexShape::from_box(Vec2::new(2.0, -1.0), Vec2::new(2.5, 1.0)),
            Layer::Wall,
            PlatformKind::Solid,
        );
        let hit = world.raycast(Vec2::ZERO, Vec2::X, 10.0, mask, None).unwrap();
        assert_eq!(hit.collider, ColliderRef::Static(wall));
    }

    #[test]
    fn dynamic_shapes_can_move_and_be_removed() {
        let mut world = CollisionWorld::new();
        let entity = World::new().spawn_empty().id();
        world.set_dynamic(entity, Vec2::ZERO, Vec2::ONE, Layer::Platform, PlatformKind::Solid);
        assert!(world.move_dynamic(entity, Vec2::new(4.0, 0.0), Vec2::new(5.0, 1.0)));
        let mask = LayerMask::from_layers(&[Layer::Platform]);
        let hit = world
            .raycast(Vec2::new(0.0, 0.5), Vec2::X, 10.0, mask, None)
            .unwrap();
        assert!(approx_eq(hit.distance, 4.0));

        world.retain_dynamics(|e| e != entity);
        assert_eq!(world.dynamic_count(), 0);
        assert!(!world.move_dynamic(entity, Vec2::ZERO, Vec2::ONE));
    }

    #[test]
    fn filtered_raycast_sees_through_rejected_platforms() {
        let mut world = CollisionWorld::new();
        world.add_static(
            ConvexShape::from_box(Vec2::new(-1.0, -1.0), Vec2::new(1.0, -0.5)),
            Layer::Platform,
            PlatformKind::Through,
        );
        let solid = world.add_static(
            ConvexShape::from_box(Vec2::new(-1.0, -3.0), Vec2::new(1.0, -2.0)),
            Layer::Ground,
            PlatformKind::Solid,
        );
        let mask = LayerMask::from_layers(&[Layer::Ground, Layer::Platform]);
        let hit = world
            .raycast(Vec2::ZERO, Vec2::new(0.0, -1.0), 10.0, mask, None)
            .unwrap();
        assert_eq!(hit.platform, PlatformKind::Through);
        let hit = world
            .raycast_filtered(Vec2::ZERO, Vec2::new(0.0, -1.0), 10.0, mask, None, |kind| {
                kind == PlatformKind::Solid
            })
            .unwrap();
        assert_eq!(hit.collider, ColliderRef::Static(solid));
        assert!(approx_eq(hit.distance, 2.0));
    }

    #[test]
    fn infinite_ray_reaches_far_ground() {
        let mut world = CollisionWorld::new();
        world.add_static(
            ConvexShape::from_box(Vec2::new(-10.0, -100.0), Vec2::new(10.0, -99.0)),
            Layer::Ground,
            PlatformKind::Solid,
        );
        let hit = world
            .raycast(Vec2::ZERO, Vec2::new(0.0, -1.0), f32::INFINITY, ground_mask(), None)
            .unwrap();
        assert!(approx_eq(hit.distance, 99.0));
    }

    #[test]
    fn overlap_box_lists_touching_colliders() {
        let mut world = CollisionWorld::new();
        world.add_static(ConvexShape::from_box(Vec2::ZERO, Vec2::ONE), Layer::Hazard, PlatformKind::Solid);
        world.add_static(ConvexShape::from_box(Vec2::splat(5.0), Vec2::splat(6.0)), Layer::Hazard, PlatformKind::Solid);
        let hits = world.overlap_box(
            Vec2::splat(0.5),
            Vec2::splat(1.5),
            LayerMask::from_layers(&[Layer::Hazard]),
            None,
        );
        assert_eq!(hits.as_slice(), &[ColliderRef::Static(0)]);
    }
}
