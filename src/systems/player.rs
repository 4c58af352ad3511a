//! Per-frame player movement.
//!
//! Velocity is built up from input, gravity, wall sliding and dashing, then
//! resolved through the collision body. A running [`StaticVelocity`]
//! (knockback, attack lunge) replaces the controller's own velocity for the
//! frame. Afterwards the animation signals are refreshed.
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::attack::AttackController;
use crate::components::boxcollider::BoxCollider;
use crate::components::collisionbody::CollisionBody;
use crate::components::mapposition::MapPosition;
use crate::components::playercontroller::{PlayerController, PlayerState};
use crate::components::signals::Signals;
use crate::components::staticvelocity::StaticVelocity;
use crate::resources::collisionworld::CollisionWorld;
use crate::resources::worldtime::WorldTime;
use crate::systems::collisionworld::move_body;

type PlayerParts = (
    Entity,
    &'static mut PlayerController,
    &'static mut CollisionBody,
    &'static mut MapPosition,
    &'static BoxCollider,
    Option<&'static mut StaticVelocity>,
    Option<&'static AttackController>,
    Option<&'static mut Signals>,
);

fn state_name(state: PlayerState) -> &'static str {
    match state {
        PlayerState::Grounded => "grounded",
        PlayerState::Airborne => "airborne",
        PlayerState::WallSliding => "wall_sliding",
        PlayerState::Dashing => "dashing",
        PlayerState::Attacking => "attacking",
    }
}

pub fn player_controller_system(
    time: Res<WorldTime>,
    mut collision_world: ResMut<CollisionWorld>,
    mut players: Query<PlayerParts>,
) {
    let delta = time.delta;

    for (entity, mut controller, mut body, mut position, collider, mut static_velocity, attack, signals) in
        players.iter_mut()
    {
        body.tick(delta);
        let is_attacking = attack.is_some_and(|attack| attack.is_actively_attacking());

        let displacement = match static_velocity.as_deref_mut().and_then(|sv| sv.step(delta)) {
            Some(displacement) => {
                controller.velocity = Vec2::ZERO;
                displacement
            }
            None => {
                controller.calculate_velocity(&body.data, is_attacking, delta);
                controller.handle_wall_sliding(&body.data, delta);
                controller.handle_dash(&body.data, &collision_world, delta);
                controller.velocity * delta
            }
        };

        let input_direction = controller.input_direction;
        let moved = move_body(
            &mut collision_world,
            entity,
            &mut body,
            &mut position,
            collider,
            displacement,
            input_direction,
        );
        controller.after_move(&body.data, delta);

        if let Some(mut signals) = signals {
            signals.set_flag_to("grounded", body.data.is_colliding_below);
            signals.set_flag_to("wall_sliding", controller.is_wall_sliding);
            signals.set_flag_to("dashing", controller.is_dashing);
            signals.set_scalar("move_speed", if delta > 0.0 { moved.x.abs() / delta } else { 0.0 });
            signals.set_integer("face_direction", body.data.face_direction);
            signals.set_string("state", state_name(controller.state(&body.data, is_attacking)));
        }
    }
}
