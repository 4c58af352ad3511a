use bevy_ecs::prelude::*;

use crate::components::health::{Health, Lives};
use crate::components::signals::Signals;
use crate::resources::worldsignals::WorldSignals;
use crate::resources::worldtime::WorldTime;

/// Run hit flashes down and publish health and lives.
pub fn health_system(
    time: Res<WorldTime>,
    mut world_signals: ResMut<WorldSignals>,
    mut bodies: Query<(&mut Health, Option<&Lives>, Option<&mut Signals>)>,
) {
    for (mut health, lives, signals) in bodies.iter_mut() {
        health.tick_flash(time.delta);
        if let Some(mut signals) = signals {
            signals.set_scalar("health_ratio", health.ratio());
            signals.set_flag_to("flashing", health.flash.is_some());
        }
        if let Some(lives) = lives {
            world_signals.set_integer("lives", lives.current.max(0));
        }
    }
}
