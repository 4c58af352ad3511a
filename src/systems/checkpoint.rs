use bevy_ecs::prelude::*;

use crate::components::mapposition::MapPosition;
use crate::resources::checkpoint::CheckpointManager;
use crate::resources::worldsignals::WorldSignals;

/// Promote the next checkpoint once the player reaches it.
pub fn checkpoint_system(
    mut checkpoints: ResMut<CheckpointManager>,
    mut world_signals: ResMut<WorldSignals>,
    positions: Query<&MapPosition>,
) {
    let Some(position) = world_signals.player().and_then(|player| positions.get(player).ok()) else {
        return;
    };
    if checkpoints.update(position.pos) {
        world_signals.set_integer("checkpoint", checkpoints.current_index() as i32);
    }
}
