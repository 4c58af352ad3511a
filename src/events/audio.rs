//! Audio requests.
//!
//! Gameplay never plays sound itself. It writes [`AudioCmd`] messages that
//! an audio backend consumes; the headless runner only logs them in
//! [`systems::audio`](crate::systems::audio).

use bevy_ecs::message::Message;

/// Sound effect played when the player is sent back to a checkpoint.
pub const DEATH_SFX: &str = "DeathSFX";

#[derive(Message, Debug, Clone, PartialEq, Eq)]
pub enum AudioCmd {
    PlayFx { id: String },
    PlayMusic { id: String, looped: bool },
    StopMusic,
}

impl AudioCmd {
    pub fn fx(id: impl Into<String>) -> Self {
        AudioCmd::PlayFx { id: id.into() }
    }

    pub fn music(id: impl Into<String>) -> Self {
        AudioCmd::PlayMusic {
            id: id.into(),
            looped: true,
        }
    }
}
