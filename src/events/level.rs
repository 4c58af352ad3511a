//! Level change requests.
//!
//! Anything that wants another level (win zones, the navigator camera, the
//! restart button) triggers a [`LevelRequestEvent`]. The request is parked in
//! [`LevelManager`] and the game moves to [`GameStates::Setup`], whose enter
//! hook rebuilds the world from the requested level.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::level::{LevelManager, LevelRequest};

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRequestEvent(pub LevelRequest);

pub fn observe_level_request(
    trigger: On<LevelRequestEvent>,
    mut levels: ResMut<LevelManager>,
    game_state: Res<GameState>,
    mut next_state: ResMut<NextGameState>,
) {
    let request = trigger.event().0;
    if matches!(game_state.get(), GameStates::Setup) || levels.pending().is_some() {
        debug!("Level request {:?} ignored, a load is already pending", request);
        return;
    }
    info!("Level request {:?}", request);
    levels.request(request);
    next_state.set(GameStates::Setup);
}
