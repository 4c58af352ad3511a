//! Moving platforms and their passengers.
//!
//! Each platform computes its displacement for the frame, collects the
//! passengers its rays touch, and moves them through their own collision
//! bodies either before or after moving itself. Passengers standing on the
//! platform are marked grounded.
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::boxcollider::BoxCollider;
use crate::components::collisionbody::CollisionBody;
use crate::components::mapposition::MapPosition;
use crate::components::movingplatform::{MovingPlatform, PassengerMove};
use crate::resources::collisionworld::CollisionWorld;
use crate::resources::worldtime::WorldTime;
use crate::systems::collisionworld::move_body;

type PlatformParts = (
    Entity,
    &'static mut MovingPlatform,
    &'static mut CollisionBody,
    &'static mut MapPosition,
    &'static BoxCollider,
);

type PassengerParts = (
    &'static mut CollisionBody,
    &'static mut MapPosition,
    &'static BoxCollider,
);

fn move_passengers(
    collision_world: &mut CollisionWorld,
    passengers: &mut Query<PassengerParts, Without<MovingPlatform>>,
    moves: &[PassengerMove],
    before_platform: bool,
) {
    for passenger in moves.iter().filter(|m| m.move_before_platform == before_platform) {
        let Ok((mut body, mut position, collider)) = passengers.get_mut(passenger.entity) else {
            continue;
        };
        move_body(
            collision_world,
            passenger.entity,
            &mut body,
            &mut position,
            collider,
            passenger.displacement,
            Vec2::ZERO,
        );
        if passenger.standing_on_platform {
            body.data.is_colliding_below = true;
        }
    }
}

pub fn moving_platform_system(
    time: Res<WorldTime>,
    mut collision_world: ResMut<CollisionWorld>,
    mut platforms: Query<PlatformParts>,
    mut passengers: Query<PassengerParts, Without<MovingPlatform>>,
) {
    for (entity, mut platform, mut body, mut position, collider) in platforms.iter_mut() {
        body.update_bounds(position.pos, collider);
        let velocity = platform.next_displacement(position.pos, time.delta);
        if velocity == Vec2::ZERO {
            continue;
        }

        let moves = platform.passenger_moves(&body, &collision_world, velocity, entity);

        move_passengers(&mut collision_world, &mut passengers, &moves, true);

        position.translate(velocity);
        let (min, max) = collider.aabb(position.pos);
        collision_world.move_dynamic(entity, min, max);

        move_passengers(&mut collision_world, &mut passengers, &moves, false);
    }
}
