use bevy_ecs::prelude::*;

use crate::components::signals::Signals;

/// One-frame triggers are cleared before anything can fire new ones.
pub fn clear_signal_triggers(mut signals: Query<&mut Signals>) {
    for mut signals in signals.iter_mut() {
        if !signals.triggers.is_empty() {
            signals.clear_triggers();
        }
    }
}
