//! Player reset and game over.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{info, warn};

use crate::components::attack::AttackController;
use crate::components::mapposition::MapPosition;
use crate::components::playercontroller::PlayerController;
use crate::components::signals::Signals;
use crate::components::staticvelocity::StaticVelocity;
use crate::events::audio::{AudioCmd, DEATH_SFX};
use crate::resources::checkpoint::CheckpointManager;
use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::worldsignals::WorldSignals;

/// Send the player back to the current checkpoint.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerResetEvent {
    pub player: Entity,
}

/// The player ran out of lives.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerGameOverEvent {
    pub player: Entity,
}

type PlayerParts = (
    &'static mut PlayerController,
    &'static mut MapPosition,
    Option<&'static mut StaticVelocity>,
    Option<&'static mut AttackController>,
    Option<&'static mut Signals>,
);

pub fn observe_player_reset(
    trigger: On<PlayerResetEvent>,
    mut players: Query<PlayerParts>,
    checkpoints: Res<CheckpointManager>,
    mut audio: MessageWriter<AudioCmd>,
) {
    let player = trigger.event().player;
    let Ok((mut controller, mut position, static_velocity, attack, signals)) = players.get_mut(player) else {
        warn!("Reset requested for {:?}, which is not a player", player);
        return;
    };

    audio.write(AudioCmd::fx(DEATH_SFX));
    controller.reset();
    if let Some(mut static_velocity) = static_velocity {
        static_velocity.clear();
    }
    if let Some(mut attack) = attack {
        attack.end_attack();
    }
    if let Some(checkpoint) = checkpoints.current() {
        position.pos = checkpoint;
    }
    if let Some(mut signals) = signals {
        signals.fire_trigger("reset");
    }
    info!("Player reset to {:?}", position.pos);
}

pub fn observe_player_game_over(
    trigger: On<PlayerGameOverEvent>,
    mut players: Query<&mut PlayerController>,
    mut next_state: ResMut<NextGameState>,
    mut world_signals: ResMut<WorldSignals>,
) {
    let player = trigger.event().player;
    if let Ok(mut controller) = players.get_mut(player) {
        controller.disable();
    }
    world_signals.set_flag("game_over");
    next_state.set(GameStates::GameOver);
    info!("Game over");
}
