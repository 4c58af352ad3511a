//! Game flow state.
//!
//! [`GameState`] is what the schedule gates on; [`NextGameState`] parks a
//! requested transition until
//! [`check_pending_state`](crate::systems::gamestate::check_pending_state)
//! hands it to the observer in [`events::gamestate`](crate::events::gamestate),
//! which applies it and runs the enter hook.
//!
//! ```text
//! None -> Setup -> Playing -> Setup (next level, restart)
//!                          -> GameOver -> Setup (restart)
//!                  Setup   -> Finished (no levels left)
//! ```

use bevy_ecs::prelude::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameStates {
    #[default]
    None,
    /// Building the current level.
    Setup,
    Playing,
    /// The player ran out of lives.
    GameOver,
    /// The last level was completed.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NextGameStates {
    #[default]
    Unchanged,
    Pending(GameStates),
}

#[derive(Resource, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GameState {
    current: GameStates,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> &GameStates {
        &self.current
    }

    /// Switch without running any hook. Only the state observer should
    /// call this.
    pub fn set(&mut self, state: GameStates) {
        self.current = state;
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NextGameState {
    next: NextGameStates,
}

impl NextGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> &NextGameStates {
        &self.next
    }

    /// Ask for `next`. A later request in the same frame wins.
    pub fn set(&mut self, next: GameStates) {
        self.next = NextGameStates::Pending(next);
    }

    pub fn reset(&mut self) {
        self.next = NextGameStates::Unchanged;
    }
}
