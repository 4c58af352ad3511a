//! Game state transition event and observer.
//!
//! Systems request a change of [`GameStates`] through [`NextGameState`].
//! [`check_pending_state`](crate::systems::gamestate::check_pending_state)
//! then emits a [`GameStateChangedEvent`], and the observer in this module
//! applies the transition and runs the enter hook stored in
//! [`SystemsStore`].
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::resources::gamestate::NextGameStates::{Pending, Unchanged};
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::systemsstore::SystemsStore;

/// Apply whatever is pending in [`NextGameState`].
#[derive(Event, Debug, Clone, Copy)]
pub struct GameStateChangedEvent {}

pub fn observe_gamestate_change_event(
    _trigger: On<GameStateChangedEvent>,
    mut commands: Commands,
    mut next_game_state: ResMut<NextGameState>,
    mut game_state: ResMut<GameState>,
    systems_store: Res<SystemsStore>,
) {
    match *next_game_state.get() {
        Pending(new_state) => {
            info!("Transitioning from {:?} to {:?}", game_state.get(), new_state);
            game_state.set(new_state);
            next_game_state.reset();
            on_state_enter(new_state, &mut commands, &systems_store);
        }
        Unchanged => debug!("No state change pending."),
    }
}

fn run_hook(name: &str, commands: &mut Commands, systems_store: &SystemsStore) {
    match systems_store.get(name) {
        Some(id) => commands.run_system(*id),
        None => warn!("State hook '{}' not found in SystemsStore", name),
    }
}

/// Run state-specific "enter" systems for the given state.
fn on_state_enter(state: GameStates, commands: &mut Commands, systems_store: &SystemsStore) {
    match state {
        GameStates::None => debug!("Entered None state"),
        GameStates::Setup => run_hook("load_level", commands, systems_store),
        GameStates::Playing => debug!("Entered Playing state"),
        GameStates::GameOver => run_hook("game_over", commands, systems_store),
        GameStates::Finished => info!("All levels completed"),
    }
}
