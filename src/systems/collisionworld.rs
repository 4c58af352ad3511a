//! Mirroring entity colliders into the [`CollisionWorld`].
//!
//! [`sync_collision_world`] runs before any controller so that every query
//! of the frame sees current boxes. Controllers that move a body during the
//! frame go through [`move_body`], which also refreshes the mirrored box
//! right away so later bodies collide with the new position.
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::boxcollider::BoxCollider;
use crate::components::collisionbody::CollisionBody;
use crate::components::collisionlayer::CollisionLayer;
use crate::components::mapposition::MapPosition;
use crate::resources::collisionworld::{CollisionWorld, PlatformKind};

pub fn sync_collision_world(
    mut collision_world: ResMut<CollisionWorld>,
    colliders: Query<(Entity, &MapPosition, &BoxCollider, &CollisionLayer, Option<&PlatformKind>)>,
) {
    collision_world.retain_dynamics(|entity| colliders.contains(entity));
    for (entity, position, collider, layer, platform) in colliders.iter() {
        let (min, max) = collider.aabb(position.pos);
        collision_world.set_dynamic(entity, min, max, layer.0, platform.copied().unwrap_or_default());
    }
}

/// Resolve `displacement` for `entity` through its body, apply it, and
/// refresh the mirrored box. Returns the displacement actually applied.
pub fn move_body(
    collision_world: &mut CollisionWorld,
    entity: Entity,
    body: &mut CollisionBody,
    position: &mut MapPosition,
    collider: &BoxCollider,
    displacement: Vec2,
    input_direction: Vec2,
) -> Vec2 {
    let moved = body.resolve(
        collision_world,
        position.pos,
        collider,
        displacement,
        input_direction,
        Some(entity),
    );
    position.translate(moved);
    let (min, max) = collider.aabb(position.pos);
    collision_world.move_dynamic(entity, min, max);
    moved
}
