//! Consuming [`AudioCmd`] messages.
//!
//! There is no sound device in the simulation. [`audio_log_system`] records
//! every command in [`AudioLog`] and logs it, and
//! [`update_bevy_audio_cmds`] advances the mailbox afterwards.

use crate::events::audio::AudioCmd;
use crate::resources::audio::AudioLog;
use bevy_ecs::prelude::{MessageReader, Messages, ResMut};
use log::debug;

pub fn audio_log_system(mut reader: MessageReader<AudioCmd>, mut log: ResMut<AudioLog>) {
    for cmd in reader.read() {
        debug!("Audio: {:?}", cmd);
        log.apply(cmd);
    }
}

/// Advance the ECS message queue for AudioCmd so same-frame readers can observe writes.
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}
