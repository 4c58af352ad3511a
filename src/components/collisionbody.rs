//! Raycast collision body shared by every moving controller.
//!
//! A [`CollisionBody`] turns a requested displacement into one that does not
//! penetrate the [`CollisionWorld`]. Rays are cast from the corners of the
//! collider shrunk by `skin_width`:
//!
//! - a horizontal fan along the facing direction, spaced over the height
//! - a vertical fan along the vertical motion, spaced over the width and
//!   shifted by the already corrected horizontal motion
//!
//! Slopes up to `max_slope` degrees are climbed and descended smoothly.
//! Steeper slopes make the body slide. One-way platforms only block from
//! above, and can be dropped through by holding down.
//!
//! The body keeps no position; callers pass position and collider each frame
//! and translate by the returned displacement.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::components::boxcollider::BoxCollider;
use crate::components::collisionlayer::{Layer, LayerMask};
use crate::math::{angle_from_up, sign};
use crate::resources::collisionworld::{ColliderRef, CollisionWorld, PlatformKind, RayHit};

/// Target distance between two parallel rays.
pub const RAY_SPACING: f32 = 0.25;
/// Seconds a body ignores one-way platforms after dropping through one.
pub const FALL_THROUGH_TIME: f32 = 0.5;

const DEFAULT_SKIN_WIDTH: f32 = 0.015;
const DEFAULT_MAX_SLOPE: f32 = 60.0;

fn default_skin_width() -> f32 {
    DEFAULT_SKIN_WIDTH
}

fn default_max_slope() -> f32 {
    DEFAULT_MAX_SLOPE
}

fn default_collision_mask() -> LayerMask {
    LayerMask::from_layers(&[Layer::Ground, Layer::Wall, Layer::Platform])
}

/// Tunables of a collision body.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CollisionAttributes {
    #[serde(default = "default_skin_width")]
    pub skin_width: f32,
    /// Steepest walkable slope in degrees.
    #[serde(default = "default_max_slope")]
    pub max_slope: f32,
    #[serde(default = "default_collision_mask")]
    pub collision_mask: LayerMask,
    #[serde(default)]
    pub climbable_wall_mask: LayerMask,
}

impl Default for CollisionAttributes {
    fn default() -> Self {
        Self {
            skin_width: DEFAULT_SKIN_WIDTH,
            max_slope: DEFAULT_MAX_SLOPE,
            collision_mask: default_collision_mask(),
            climbable_wall_mask: LayerMask::NONE,
        }
    }
}

/// Side of the body a collision happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionDirection {
    Left,
    Right,
    Up,
    Down,
}

/// One collider touched this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionInfo {
    pub direction: CollisionDirection,
    pub collider: ColliderRef,
}

/// Result of the last [`CollisionBody::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionData {
    pub is_colliding_left: bool,
    pub is_colliding_right: bool,
    pub is_colliding_above: bool,
    pub is_colliding_below: bool,
    pub collided: SmallVec<[CollisionInfo; 4]>,
    /// -1 or +1. Survives resets.
    pub face_direction: i32,
    pub previous_velocity: Vec2,
    pub slope_normal: Vec2,
    pub current_slope_angle: f32,
    pub previous_slope_angle: f32,
    pub is_ascending_slope: bool,
    pub is_descending_slope: bool,
    pub is_sliding_down_slope: bool,
    pub is_falling_through_platform: bool,
    pub is_adjacent_to_climbable_wall: bool,
}

impl Default for CollisionData {
    fn default() -> Self {
        Self {
            is_colliding_left: false,
            is_colliding_right: false,
            is_colliding_above: false,
            is_colliding_below: false,
            collided: SmallVec::new(),
            face_direction: 1,
            previous_velocity: Vec2::ZERO,
            slope_normal: Vec2::ZERO,
            current_slope_angle: 0.0,
            previous_slope_angle: 0.0,
            is_ascending_slope: false,
            is_descending_slope: false,
            is_sliding_down_slope: false,
            is_falling_through_platform: false,
            is_adjacent_to_climbable_wall: false,
        }
    }
}

impl CollisionData {
    fn reset(&mut self) {
        self.is_colliding_left = false;
        self.is_colliding_right = false;
        self.is_colliding_above = false;
        self.is_colliding_below = false;
        self.collided.clear();
        self.slope_normal = Vec2::ZERO;
        self.previous_slope_angle = self.current_slope_angle;
        self.current_slope_angle = 0.0;
        self.is_ascending_slope = false;
        self.is_descending_slope = false;
        self.is_sliding_down_slope = false;
        self.is_adjacent_to_climbable_wall = false;
    }

    fn record(&mut self, direction: CollisionDirection, collider: ColliderRef) {
        let info = CollisionInfo { direction, collider };
        if !self.collided.contains(&info) {
            self.collided.push(info);
        }
    }

    pub fn is_grounded(&self) -> bool {
        self.is_colliding_below
    }

    /// True when blocked on either side.
    pub fn is_colliding_sideways(&self) -> bool {
        self.is_colliding_left || self.is_colliding_right
    }

    /// Entities touched this frame, optionally only on one side.
    pub fn collided_entities(
        &self,
        direction: Option<CollisionDirection>,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.collided
            .iter()
            .filter(move |info| direction.is_none_or(|d| d == info.direction))
            .filter_map(|info| info.collider.entity())
    }
}

/// Corners of the collider shrunk by the skin width.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyBounds {
    pub bottom_left: Vec2,
    pub bottom_right: Vec2,
    pub top_left: Vec2,
    pub top_right: Vec2,
}

impl BodyBounds {
    pub fn from_collider(position: Vec2, collider: &BoxCollider, skin_width: f32) -> Self {
        let (min, max) = collider.inset_aabb(position, skin_width);
        Self {
            bottom_left: min,
            bottom_right: Vec2::new(max.x, min.y),
            top_left: Vec2::new(min.x, max.y),
            top_right: max,
        }
    }
}

/// Ray count for one side of the box: at least two, one every [`RAY_SPACING`].
fn ray_fan(extent: f32) -> (usize, f32) {
    let count = ((extent / RAY_SPACING).round() as usize).max(2);
    (count, extent / (count - 1) as f32)
}

#[derive(Component, Debug, Clone)]
pub struct CollisionBody {
    pub attributes: CollisionAttributes,
    pub data: CollisionData,
    bounds: BodyBounds,
    horizontal_ray_count: usize,
    vertical_ray_count: usize,
    horizontal_ray_spacing: f32,
    vertical_ray_spacing: f32,
    fall_through_timer: f32,
}

impl CollisionBody {
    pub fn new(attributes: CollisionAttributes, collider: &BoxCollider) -> Self {
        let mut body = Self {
            attributes,
            data: CollisionData::default(),
            bounds: BodyBounds::default(),
            horizontal_ray_count: 2,
            vertical_ray_count: 2,
            horizontal_ray_spacing: 0.0,
            vertical_ray_spacing: 0.0,
            fall_through_timer: 0.0,
        };
        body.setup_rays(collider);
        body
    }

    /// Recompute ray counts and spacing from the collider size.
    pub fn setup_rays(&mut self, collider: &BoxCollider) {
        let size = (collider.size.abs() - Vec2::splat(2.0 * self.attributes.skin_width)).max(Vec2::ZERO);
        (self.horizontal_ray_count, self.horizontal_ray_spacing) = ray_fan(size.y);
        (self.vertical_ray_count, self.vertical_ray_spacing) = ray_fan(size.x);
    }

    pub fn ray_counts(&self) -> (usize, usize) {
        (self.horizontal_ray_count, self.vertical_ray_count)
    }

    pub fn bounds(&self) -> BodyBounds {
        self.bounds
    }

    /// Refresh the ray origins without resolving any movement.
    pub fn update_bounds(&mut self, position: Vec2, collider: &BoxCollider) {
        self.bounds = BodyBounds::from_collider(position, collider, self.attributes.skin_width);
    }

    /// Origins of the horizontal fan on the `direction` side, bottom up.
    pub fn horizontal_ray_origins(&self, direction: f32) -> impl Iterator<Item = Vec2> + '_ {
        let base = if direction < 0.0 {
            self.bounds.bottom_left
        } else {
            self.bounds.bottom_right
        };
        (0..self.horizontal_ray_count).map(move |i| base + Vec2::Y * (self.horizontal_ray_spacing * i as f32))
    }

    /// Origins of the vertical fan on the `direction` side, left to right.
    pub fn vertical_ray_origins(&self, direction: f32) -> impl Iterator<Item = Vec2> + '_ {
        let base = if direction < 0.0 {
            self.bounds.bottom_left
        } else {
            self.bounds.top_left
        };
        (0..self.vertical_ray_count).map(move |i| base + Vec2::X * (self.vertical_ray_spacing * i as f32))
    }

    /// Advance the fall-through window.
    pub fn tick(&mut self, delta: f32) {
        if self.data.is_falling_through_platform {
            self.fall_through_timer -= delta;
            if self.fall_through_timer <= 0.0 {
                self.fall_through_timer = 0.0;
                self.data.is_falling_through_platform = false;
            }
        }
    }

    /// Correct `displacement` against the world and return the result.
    ///
    /// `input_direction` is only used for dropping through one-way
    /// platforms (y == -1). `owner` is excluded from every query.
    pub fn resolve(
        &mut self,
        world: &CollisionWorld,
        position: Vec2,
        collider: &BoxCollider,
        displacement: Vec2,
        input_direction: Vec2,
        owner: Option<Entity>,
    ) -> Vec2 {
        self.bounds = BodyBounds::from_collider(position, collider, self.attributes.skin_width);
        self.data.reset();

        let mut velocity = displacement;
        self.data.previous_velocity = velocity;

        if velocity.y < 0.0 {
            self.descend_slope(world, &mut velocity, owner);
        }

        if velocity.x != 0.0 {
            self.data.face_direction = sign(velocity.x) as i32;
        }

        self.horizontal_collisions(world, &mut velocity, owner);

        if velocity.y != 0.0 {
            self.vertical_collisions(world, &mut velocity, input_direction, owner);
        }

        velocity
    }

    /// Whether a ray from `origin` hits anything on `mask` within `length`.
    pub fn check_for_collision(
        &self,
        world: &CollisionWorld,
        origin: Vec2,
        direction: Vec2,
        length: f32,
        mask: LayerMask,
        owner: Option<Entity>,
    ) -> bool {
        world.raycast(origin, direction, length, mask, owner).is_some()
    }

    fn cast(
        &self,
        world: &CollisionWorld,
        origin: Vec2,
        direction: Vec2,
        length: f32,
        owner: Option<Entity>,
        accept_through: bool,
    ) -> Option<RayHit> {
        world.raycast_filtered(
            origin,
            direction,
            length,
            self.attributes.collision_mask,
            owner,
            |kind| match kind {
                PlatformKind::Solid => true,
                PlatformKind::Through => accept_through,
                PlatformKind::Fake => false,
            },
        )
    }

    fn horizontal_collisions(&mut self, world: &CollisionWorld, velocity: &mut Vec2, owner: Option<Entity>) {
        let skin = self.attributes.skin_width;
        let max_slope = self.attributes.max_slope;
        let direction_x = self.data.face_direction as f32;
        let mut ray_length = velocity.x.abs() + skin;
        if velocity.x.abs() < skin {
            ray_length = 2.0 * skin;
        }

        let mut wall_hits = 0;
        for i in 0..self.horizontal_ray_count {
            let corner = if direction_x < 0.0 {
                self.bounds.bottom_left
            } else {
                self.bounds.bottom_right
            };
            let origin = corner + Vec2::Y * (self.horizontal_ray_spacing * i as f32);

            let Some(hit) = self.cast(world, origin, Vec2::X * direction_x, ray_length, owner, false)
            else {
                continue;
            };
            if hit.distance == 0.0 {
                continue;
            }

            let side = if direction_x < 0.0 {
                CollisionDirection::Left
            } else {
                CollisionDirection::Right
            };
            self.data.record(side, hit.collider);

            let slope_angle = angle_from_up(hit.normal);

            if i == 0 && slope_angle <= max_slope {
                if self.data.is_descending_slope {
                    self.data.is_descending_slope = false;
                    *velocity = self.data.previous_velocity;
                }
                let mut distance_to_slope_start = 0.0;
                if slope_angle != self.data.previous_slope_angle {
                    distance_to_slope_start = hit.distance - skin;
                    velocity.x -= distance_to_slope_start * direction_x;
                }
                self.ascend_slope(velocity, slope_angle, hit.normal);
                velocity.x += distance_to_slope_start * direction_x;
            }

            if !self.data.is_ascending_slope || slope_angle > max_slope {
                velocity.x = (hit.distance - skin) * direction_x;
                ray_length = hit.distance;

                if self.data.is_ascending_slope {
                    velocity.y = self.data.current_slope_angle.to_radians().tan() * velocity.x.abs();
                }

                self.data.is_colliding_left = direction_x < 0.0;
                self.data.is_colliding_right = direction_x > 0.0;

                if self.attributes.climbable_wall_mask.contains_layer(hit.layer) {
                    wall_hits += 1;
                }
            }
        }

        self.data.is_adjacent_to_climbable_wall =
            wall_hits > 0 && wall_hits >= self.horizontal_ray_count / 2;
    }

    fn vertical_collisions(
        &mut self,
        world: &CollisionWorld,
        velocity: &mut Vec2,
        input_direction: Vec2,
        owner: Option<Entity>,
    ) {
        let skin = self.attributes.skin_width;
        let direction_y = sign(velocity.y);
        let mut ray_length = velocity.y.abs() + skin;

        for i in 0..self.vertical_ray_count {
            let corner = if direction_y < 0.0 {
                self.bounds.bottom_left
            } else {
                self.bounds.top_left
            };
            let origin = corner + Vec2::X * (self.vertical_ray_spacing * i as f32 + velocity.x);

            let mut accept_through = direction_y < 0.0 && !self.data.is_falling_through_platform;
            let hit = loop {
                let Some(hit) =
                    self.cast(world, origin, Vec2::Y * direction_y, ray_length, owner, accept_through)
                else {
                    break None;
                };
                if hit.platform == PlatformKind::Through && input_direction.y == -1.0 {
                    self.data.is_falling_through_platform = true;
                    self.fall_through_timer = FALL_THROUGH_TIME;
                    accept_through = false;
                    continue;
                }
                break Some(hit);
            };
            let Some(hit) = hit else {
                continue;
            };
            // Starting inside a collider abandons the pass, slope probe included.
            if hit.distance == 0.0 {
                return;
            }

            let side = if direction_y < 0.0 {
                CollisionDirection::Down
            } else {
                CollisionDirection::Up
            };
            self.data.record(side, hit.collider);

            velocity.y = (hit.distance - skin) * direction_y;
            ray_length = hit.distance;

            if self.data.is_ascending_slope {
                velocity.x = velocity.y / self.data.current_slope_angle.to_radians().tan() * sign(velocity.x);
            }

            self.data.is_colliding_below = direction_y < 0.0;
            self.data.is_colliding_above = direction_y > 0.0;
        }

        if self.data.is_ascending_slope {
            self.probe_slope_change(world, velocity, owner);
        }
    }

    /// While climbing, look ahead at the new height for a change of slope.
    fn probe_slope_change(&mut self, world: &CollisionWorld, velocity: &mut Vec2, owner: Option<Entity>) {
        let skin = self.attributes.skin_width;
        let direction_x = sign(velocity.x);
        let ray_length = velocity.x.abs() + skin;
        let corner = if direction_x < 0.0 {
            self.bounds.bottom_left
        } else {
            self.bounds.bottom_right
        };
        let origin = corner + Vec2::Y * velocity.y;

        if let Some(hit) = self.cast(world, origin, Vec2::X * direction_x, ray_length, owner, false) {
            if hit.distance == 0.0 {
                return;
            }
            let slope_angle = angle_from_up(hit.normal);
            if slope_angle != self.data.current_slope_angle {
                velocity.x = (hit.distance - skin) * direction_x;
                self.data.current_slope_angle = slope_angle;
                self.data.slope_normal = hit.normal;
            }
        }
    }

    fn ascend_slope(&mut self, velocity: &mut Vec2, slope_angle: f32, slope_normal: Vec2) {
        let move_distance = velocity.x.abs();
        let radians = slope_angle.to_radians();
        let climb_velocity_y = radians.sin() * move_distance;

        if velocity.y <= climb_velocity_y {
            velocity.x = radians.cos() * move_distance * sign(velocity.x);
            velocity.y = climb_velocity_y;

            self.data.is_colliding_below = true;
            self.data.is_ascending_slope = true;
            self.data.current_slope_angle = slope_angle;
            self.data.slope_normal = slope_normal;
        }
    }

    fn descend_slope(&mut self, world: &CollisionWorld, velocity: &mut Vec2, owner: Option<Entity>) {
        let skin = self.attributes.skin_width;
        let accept_through = !self.data.is_falling_through_platform;
        let probe_length = velocity.y.abs() + skin;

        let hit_left = self.cast(world, self.bounds.bottom_left, -Vec2::Y, probe_length, owner, accept_through);
        let hit_right = self.cast(world, self.bounds.bottom_right, -Vec2::Y, probe_length, owner, accept_through);

        if hit_left.is_some() != hit_right.is_some() {
            for hit in hit_left.iter().chain(hit_right.iter()) {
                self.slide_down_slope(hit, velocity);
            }
        }

        if self.data.is_sliding_down_slope {
            return;
        }

        let direction_x = sign(velocity.x);
        let origin = if direction_x < 0.0 {
            self.bounds.bottom_right
        } else {
            self.bounds.bottom_left
        };

        let Some(hit) = self.cast(world, origin, -Vec2::Y, f32::INFINITY, owner, accept_through) else {
            return;
        };
        let slope_angle = angle_from_up(hit.normal);
        if slope_angle == 0.0 || slope_angle > self.attributes.max_slope {
            return;
        }
        if sign(hit.normal.x) != direction_x {
            return;
        }
        let radians = slope_angle.to_radians();
        if hit.distance - skin <= radians.tan() * velocity.x.abs() {
            let descend_distance = velocity.x.abs();
            let descend_velocity_y = radians.sin() * descend_distance;

            velocity.x = radians.cos() * descend_distance * sign(velocity.x);
            velocity.y -= descend_velocity_y;

            self.data.is_colliding_below = true;
            self.data.is_descending_slope = true;
            self.data.slope_normal = hit.normal;
            self.data.current_slope_angle = slope_angle;
        }
    }

    fn slide_down_slope(&mut self, hit: &RayHit, velocity: &mut Vec2) {
        let slope_angle = angle_from_up(hit.normal);
        if slope_angle <= self.attributes.max_slope {
            return;
        }
        velocity.x = sign(hit.normal.x) * (velocity.y.abs() - hit.distance) / slope_angle.to_radians().tan();

        self.data.slope_normal = hit.normal;
        self.data.current_slope_angle = slope_angle;
        self.data.is_colliding_below = true;
        self.data.is_sliding_down_slope = true;
    }
}
