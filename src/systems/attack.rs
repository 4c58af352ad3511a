//! Attack timing and hit detection.
//!
//! [`attack_system`] advances phases and cooldowns and starts lunges.
//! [`attack_hit_system`] overlaps the active hitbox with attackable
//! colliders, knocks the victims back and triggers a [`DamageEvent`] once
//! per victim and phase.
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::attack::{AttackController, AttackTick};
use crate::components::mapposition::MapPosition;
use crate::components::signals::Signals;
use crate::components::staticvelocity::StaticVelocity;
use crate::events::health::DamageEvent;
use crate::resources::collisionworld::CollisionWorld;
use crate::resources::worldtime::WorldTime;

pub fn attack_system(
    time: Res<WorldTime>,
    mut attackers: Query<(
        &mut AttackController,
        Option<&mut StaticVelocity>,
        Option<&mut Signals>,
    )>,
) {
    for (mut attack, static_velocity, signals) in attackers.iter_mut() {
        let tick = attack.tick(time.delta);

        if let Some((velocity, lifetime)) = attack.poll_lunge(time.delta) {
            if let Some(mut static_velocity) = static_velocity {
                static_velocity.set(velocity, lifetime);
            }
        }

        if let Some(mut signals) = signals {
            match tick {
                AttackTick::NextPhase(start) => {
                    signals.fire_trigger("attack_phase");
                    signals.set_string("attack_phase", start.phase_name);
                }
                AttackTick::Ended => signals.fire_trigger("attack_end"),
                AttackTick::Idle | AttackTick::Running => {}
            }
            signals.set_flag_to("attacking", attack.is_actively_attacking());
        }
    }
}

pub fn attack_hit_system(
    mut commands: Commands,
    collision_world: Res<CollisionWorld>,
    mut attackers: Query<(Entity, &mut AttackController, &MapPosition)>,
    mut victims: Query<&mut StaticVelocity>,
) {
    for (entity, mut attack, position) in attackers.iter_mut() {
        let Some((min, max)) = attack.hitbox_aabb(position.pos) else {
            continue;
        };
        let hits = collision_world.overlap_box(min, max, attack.attackable_mask, Some(entity));
        for target in hits.iter().filter_map(|collider| collider.entity()) {
            if !attack.register_hit(target) {
                continue;
            }
            debug!("{:?} hit {:?} for {}", entity, target, attack.damage());
            if let Some((velocity, lifetime)) = attack.knockback() {
                if let Ok(mut static_velocity) = victims.get_mut(target) {
                    static_velocity.set(velocity, lifetime);
                }
            }
            commands.trigger(DamageEvent {
                target,
                amount: attack.damage(),
            });
        }
    }
}
