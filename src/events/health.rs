//! Damage and healing.
//!
//! Attacks and damage zones trigger [`DamageEvent`]; the observer decides
//! what the hit means for the target:
//!
//! - Players (entities with [`Lives`]) never lose health. Every accepted hit
//!   sends them back to the current checkpoint and costs one life. Dropping
//!   below zero lives is game over.
//! - Everything else loses health and is despawned on death.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::components::health::{DamageOutcome, Health, Lives};
use crate::components::signals::Signals;
use crate::events::player::{PlayerGameOverEvent, PlayerResetEvent};

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageEvent {
    pub target: Entity,
    pub amount: f32,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct HealEvent {
    pub target: Entity,
    pub amount: f32,
}

pub fn observe_damage(
    trigger: On<DamageEvent>,
    mut commands: Commands,
    mut targets: Query<(&mut Health, Option<&mut Lives>, Option<&mut Signals>)>,
) {
    let DamageEvent { target, amount } = *trigger.event();
    let Ok((mut health, lives, signals)) = targets.get_mut(target) else {
        debug!("Damage to {:?} ignored: no health", target);
        return;
    };

    if let Some(mut lives) = lives {
        if !health.can_take_damage {
            return;
        }
        health.flash_damage();
        if let Some(mut signals) = signals {
            signals.fire_trigger("take_damage");
        }
        commands.trigger(PlayerResetEvent { player: target });
        let game_over = lives.lose_life();
        info!("Player hit for {}, {} lives left", amount, lives.current.max(0));
        if game_over {
            commands.trigger(PlayerGameOverEvent { player: target });
        }
        return;
    }

    match health.take_damage(amount) {
        DamageOutcome::Ignored => {}
        DamageOutcome::Damaged => {
            if let Some(mut signals) = signals {
                signals.fire_trigger("take_damage");
            }
        }
        DamageOutcome::Died => {
            info!("{:?} died", target);
            commands.entity(target).try_despawn();
        }
    }
}

pub fn observe_heal(trigger: On<HealEvent>, mut targets: Query<&mut Health>) {
    let HealEvent { target, amount } = *trigger.event();
    if let Ok(mut health) = targets.get_mut(target) {
        health.heal(amount);
        debug!("{:?} healed for {}", target, amount);
    }
}
