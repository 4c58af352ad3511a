//! Waypoint platforms that carry passengers.
//!
//! Each frame the platform computes its displacement, finds passengers with
//! ray fans on its own [`CollisionBody`] bounds, moves the passengers that
//! must go first, moves itself, then moves the rest.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::components::collisionbody::CollisionBody;
use crate::components::collisionlayer::LayerMask;
use crate::math::sign;
use crate::resources::collisionworld::CollisionWorld;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovingPlatformAttributes {
    /// Waypoints relative to the spawn point.
    pub waypoints: Vec<Vec2>,
    pub speed: f32,
    /// 0 is linear, 2 is a strong ease in and out.
    #[serde(default)]
    pub easing: f32,
    #[serde(default)]
    pub wait_time: f32,
    /// Loop back to the first waypoint instead of reversing.
    #[serde(default)]
    pub cyclic: bool,
    #[serde(default)]
    pub passenger_mask: LayerMask,
}

/// Movement owed to one passenger this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassengerMove {
    pub entity: Entity,
    pub displacement: Vec2,
    pub standing_on_platform: bool,
    pub move_before_platform: bool,
}

pub type PassengerMoves = SmallVec<[PassengerMove; 4]>;

#[derive(Component, Debug, Clone)]
pub struct MovingPlatform {
    pub attributes: MovingPlatformAttributes,
    waypoints: Vec<Vec2>,
    from_index: usize,
    percent: f32,
    wait_remaining: f32,
}

impl MovingPlatform {
    pub fn new(attributes: MovingPlatformAttributes, origin: Vec2) -> Self {
        let waypoints = attributes.waypoints.iter().map(|local| *local + origin).collect();
        Self {
            attributes,
            waypoints,
            from_index: 0,
            percent: 0.0,
            wait_remaining: 0.0,
        }
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    pub fn is_waiting(&self) -> bool {
        self.wait_remaining > 0.0
    }

    fn ease(&self, x: f32) -> f32 {
        let a = self.attributes.easing.clamp(0.0, 2.0) + 1.0;
        let xa = x.powf(a);
        xa / (xa + (1.0 - x).powf(a))
    }

    /// Displacement from `position` to this frame's point on the path.
    pub fn next_displacement(&mut self, position: Vec2, delta: f32) -> Vec2 {
        if self.wait_remaining > 0.0 {
            self.wait_remaining -= delta;
            return Vec2::ZERO;
        }
        let count = self.waypoints.len();
        if count < 2 {
            return Vec2::ZERO;
        }

        self.from_index %= count;
        let to_index = (self.from_index + 1) % count;
        let from = self.waypoints[self.from_index];
        let to = self.waypoints[to_index];

        let distance = from.distance(to);
        self.percent = if distance > 0.0 {
            (self.percent + delta * self.attributes.speed / distance).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let target = from.lerp(to, self.ease(self.percent));

        if self.percent >= 1.0 {
            self.percent = 0.0;
            self.from_index += 1;
            if !self.attributes.cyclic && self.from_index >= count - 1 {
                self.from_index = 0;
                self.waypoints.reverse();
            }
            self.wait_remaining = self.attributes.wait_time;
        }

        target - position
    }

    /// Find the passengers touched by a platform moving by `velocity`.
    ///
    /// `body` must have bounds for the platform's position before the move.
    pub fn passenger_moves(
        &self,
        body: &CollisionBody,
        world: &CollisionWorld,
        velocity: Vec2,
        owner: Entity,
    ) -> PassengerMoves {
        let mut moves = PassengerMoves::new();
        let mask = self.attributes.passenger_mask;
        let skin = body.attributes.skin_width;
        let direction_x = sign(velocity.x);
        let direction_y = sign(velocity.y);

        let push = |moves: &mut PassengerMoves, entity: Entity, displacement: Vec2, standing: bool, before: bool| {
            if !moves.iter().any(|moved| moved.entity == entity) {
                moves.push(PassengerMove {
                    entity,
                    displacement,
                    standing_on_platform: standing,
                    move_before_platform: before,
                });
            }
        };

        // Riders above a rising platform, or bodies below a sinking one.
        if velocity.y != 0.0 {
            let length = velocity.y.abs() + skin;
            for origin in body.vertical_ray_origins(direction_y) {
                let Some(hit) = world.raycast(origin, Vec2::Y * direction_y, length, mask, Some(owner)) else {
                    continue;
                };
                let Some(entity) = hit.entity() else { continue };
                if hit.distance == 0.0 {
                    continue;
                }
                let push_x = if direction_y == 1.0 { velocity.x } else { 0.0 };
                let push_y = velocity.y - (hit.distance - skin) * direction_y;
                push(&mut moves, entity, Vec2::new(push_x, push_y), direction_y == 1.0, true);
            }
        }

        // Bodies pushed from the side.
        if velocity.x != 0.0 {
            let length = velocity.x.abs() + skin;
            for origin in body.horizontal_ray_origins(direction_x) {
                let Some(hit) = world.raycast(origin, Vec2::X * direction_x, length, mask, Some(owner)) else {
                    continue;
                };
                let Some(entity) = hit.entity() else { continue };
                if hit.distance == 0.0 {
                    continue;
                }
                let push_x = velocity.x - (hit.distance - skin) * direction_x;
                push(&mut moves, entity, Vec2::new(push_x, -skin), false, true);
            }
        }

        // Riders on top of a sideways or sinking platform.
        if direction_y == -1.0 || (velocity.y == 0.0 && velocity.x != 0.0) {
            let length = skin * 2.0;
            for origin in body.vertical_ray_origins(1.0) {
                let Some(hit) = world.raycast(origin, Vec2::Y, length, mask, Some(owner)) else {
                    continue;
                };
                let Some(entity) = hit.entity() else { continue };
                if hit.distance == 0.0 {
                    continue;
                }
                push(&mut moves, entity, velocity, true, false);
            }
        }

        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::boxcollider::BoxCollider;
    use crate::components::collisionbody::CollisionAttributes;
    use crate::components::collisionlayer::Layer;
    use crate::resources::collisionworld::PlatformKind;
    use bevy_ecs::world::World;

    const EPSILON: f32 = 1e-4;

    fn approx_eq(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < EPSILON
    }

    fn attributes(waypoints: Vec<Vec2>) -> MovingPlatformAttributes {
        MovingPlatformAttributes {
            waypoints,
            speed: 2.0,
            easing: 0.0,
            wait_time: 0.0,
            cyclic: false,
            passenger_mask: LayerMask::from_layers(&[Layer::Player]),
        }
    }

    #[test]
    fn easing_is_symmetric() {
        let mut platform = MovingPlatform::new(attributes(vec![Vec2::ZERO, Vec2::X]), Vec2::ZERO);
        platform.attributes.easing = 1.0;
        assert!((platform.ease(0.5) - 0.5).abs() < EPSILON);
        assert!(platform.ease(0.25) < 0.25);
        assert!((platform.ease(0.25) + platform.ease(0.75) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn linear_path_moves_at_speed() {
        let mut platform = MovingPlatform::new(attributes(vec![Vec2::ZERO, Vec2::new(4.0, 0.0)]), Vec2::new(1.0, 1.0));
        let step = platform.next_displacement(Vec2::new(1.0, 1.0), 0.5);
        assert!(approx_eq(step, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn ping_pong_reverses_and_waits() {
        let mut attrs = attributes(vec![Vec2::ZERO, Vec2::new(2.0, 0.0)]);
        attrs.wait_time = 0.5;
        let mut platform = MovingPlatform::new(attrs, Vec2::ZERO);
        let mut position = Vec2::ZERO;

        // 2 units at speed 2: one second.
        for _ in 0..4 {
            position += platform.next_displacement(position, 0.25);
        }
        assert!(approx_eq(position, Vec2::new(2.0, 0.0)));
        assert!(platform.is_waiting());

        assert_eq!(platform.next_displacement(position, 0.25), Vec2::ZERO);
        assert_eq!(platform.next_displacement(position, 0.25), Vec2::ZERO);
        position += platform.next_displacement(position, 0.25);
        assert!(position.x < 2.0);
    }

    #[test]
    fn cyclic_path_wraps_to_start() {
        let mut attrs = attributes(vec![Vec2::ZERO, Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0)]);
        attrs.cyclic = true;
        let mut platform = MovingPlatform::new(attrs, Vec2::ZERO);
        let mut position = Vec2::ZERO;
        // A long step finishes a whole leg.
        let mut visited = Vec::new();
        for _ in 0..4 {
            position += platform.next_displacement(position, 10.0);
            visited.push(position);
        }
        assert_eq!(
            visited,
            vec![Vec2::new(2.0, 0.0), Vec2::new(2.0, 2.0), Vec2::ZERO, Vec2::new(2.0, 0.0)]
        );
        assert_eq!(platform.waypoints()[0], Vec2::ZERO);
    }

    #[test]
    fn single_waypoint_never_moves() {
        let mut platform = MovingPlatform::new(attributes(vec![Vec2::ZERO]), Vec2::ZERO);
        assert_eq!(platform.next_displacement(Vec2::ZERO, 1.0), Vec2::ZERO);
    }

    // ==================== PASSENGERS ====================

    fn platform_fixture() -> (World, Entity, Entity, CollisionWorld, CollisionBody) {
        let mut ecs = World::new();
        let platform = ecs.spawn_empty().id();
        let rider = ecs.spawn_empty().id();

        let collider = BoxCollider::new(3.0, 0.5);
        let mut body = CollisionBody::new(CollisionAttributes::default(), &collider);
        body.update_bounds(Vec2::ZERO, &collider);

        let mut world = CollisionWorld::new();
        world.set_dynamic(platform, Vec2::new(-1.5, -0.25), Vec2::new(1.5, 0.25), Layer::Ground, PlatformKind::Solid);
        // Rider resting on top.
        world.set_dynamic(rider, Vec2::new(-0.5, 0.25), Vec2::new(0.5, 1.25), Layer::Player, PlatformKind::Solid);
        (ecs, platform, rider, world, body)
    }

    #[test]
    fn rising_platform_lifts_rider_first() {
        let (_ecs, platform_entity, rider, world, body) = platform_fixture();
        let platform = MovingPlatform::new(attributes(vec![Vec2::ZERO, Vec2::Y]), Vec2::ZERO);
        let moves = platform.passenger_moves(&body, &world, Vec2::new(0.1, 0.1), platform_entity);
        assert_eq!(moves.len(), 1);
        let passenger = moves[0];
        assert_eq!(passenger.entity, rider);
        assert!(passenger.standing_on_platform);
        assert!(passenger.move_before_platform);
        // hit at skin distance: push y = 0.1 - (skin - skin)
        assert!(approx_eq(passenger.displacement, Vec2::new(0.1, 0.1)));
    }

    #[test]
    fn sideways_platform_carries_rider_after_moving() {
        let (_ecs, platform_entity, rider, world, body) = platform_fixture();
        let platform = MovingPlatform::new(attributes(vec![Vec2::ZERO, Vec2::X]), Vec2::ZERO);
        let moves = platform.passenger_moves(&body, &world, Vec2::new(0.2, 0.0), platform_entity);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].entity, rider);
        assert!(!moves[0].move_before_platform);
        assert!(moves[0].standing_on_platform);
        assert_eq!(moves[0].displacement, Vec2::new(0.2, 0.0));
    }

    #[test]
    fn platform_pushes_body_from_the_side() {
        let mut ecs = World::new();
        let platform_entity = ecs.spawn_empty().id();
        let body_entity = ecs.spawn_empty().id();

        let collider = BoxCollider::new(3.0, 0.5);
        let mut body = CollisionBody::new(CollisionAttributes::default(), &collider);
        body.update_bounds(Vec2::ZERO, &collider);

        let mut world = CollisionWorld::new();
        world.set_dynamic(body_entity, Vec2::new(1.6, -0.5), Vec2::new(2.6, 0.5), Layer::Player, PlatformKind::Solid);

        let platform = MovingPlatform::new(attributes(vec![Vec2::ZERO, Vec2::X]), Vec2::ZERO);
        let moves = platform.passenger_moves(&body, &world, Vec2::new(0.3, 0.0), platform_entity);
        assert_eq!(moves.len(), 1);
        let skin = body.attributes.skin_width;
        // Gap from the inset edge is 0.1 + skin.
        let expected_x = 0.3 - 0.1;
        assert!((moves[0].displacement.x - expected_x).abs() < EPSILON);
        assert_eq!(moves[0].displacement.y, -skin);
        assert!(!moves[0].standing_on_platform);
        assert!(moves[0].move_before_platform);
    }
}
