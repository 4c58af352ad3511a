use bevy_ecs::prelude::*;

use crate::components::boxcollider::BoxCollider;
use crate::components::collisionbody::CollisionBody;
use crate::components::mapposition::MapPosition;
use crate::components::physicsobject::PhysicsObject;
use crate::components::staticvelocity::StaticVelocity;
use crate::resources::collisionworld::CollisionWorld;
use crate::resources::worldtime::WorldTime;
use crate::systems::collisionworld::move_body;

type ObjectParts = (
    Entity,
    &'static mut PhysicsObject,
    &'static mut CollisionBody,
    &'static mut MapPosition,
    &'static BoxCollider,
    Option<&'static mut StaticVelocity>,
);

/// Let loose objects fall, or slide them while knocked back.
pub fn physics_object_system(
    time: Res<WorldTime>,
    mut collision_world: ResMut<CollisionWorld>,
    mut objects: Query<ObjectParts>,
) {
    let delta = time.delta;
    for (entity, mut object, mut body, mut position, collider, mut static_velocity) in objects.iter_mut() {
        body.tick(delta);
        let displacement = match static_velocity.as_deref_mut().and_then(|sv| sv.step(delta)) {
            Some(displacement) => {
                object.velocity = glam::Vec2::ZERO;
                displacement
            }
            None => {
                object.apply_gravity(delta);
                object.velocity * delta
            }
        };
        move_body(
            &mut collision_world,
            entity,
            &mut body,
            &mut position,
            collider,
            displacement,
            glam::Vec2::ZERO,
        );
        object.after_move(&body.data, delta);
    }
}
