//! What the game has asked the audio backend to play.
//!
//! Use [`setup_audio`] once during initialization to insert the
//! `Messages<AudioCmd>` mailbox and the [`AudioLog`] it is drained into.

use crate::events::audio::AudioCmd;
use bevy_ecs::prelude::*;

/// Playback state as seen through [`AudioCmd`] messages.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioLog {
    /// Music track currently requested, if any.
    pub music: Option<String>,
    /// Every effect requested since the last [`AudioLog::clear_fx`].
    pub fx: Vec<String>,
}

impl AudioLog {
    pub fn apply(&mut self, cmd: &AudioCmd) {
        match cmd {
            AudioCmd::PlayFx { id } => self.fx.push(id.clone()),
            AudioCmd::PlayMusic { id, .. } => self.music = Some(id.clone()),
            AudioCmd::StopMusic => self.music = None,
        }
    }

    pub fn fx_count(&self, id: &str) -> usize {
        self.fx.iter().filter(|fx| fx.as_str() == id).count()
    }

    pub fn clear_fx(&mut self) {
        self.fx.clear();
    }
}

/// Register the audio mailbox and log.
pub fn setup_audio(world: &mut World) {
    world.insert_resource(Messages::<AudioCmd>::default());
    world.insert_resource(AudioLog::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn music_follows_last_command() {
        let mut log = AudioLog::default();
        log.apply(&AudioCmd::music("intro"));
        log.apply(&AudioCmd::fx("DeathSFX"));
        assert_eq!(log.music.as_deref(), Some("intro"));
        log.apply(&AudioCmd::StopMusic);
        assert_eq!(log.music, None);
        assert_eq!(log.fx_count("DeathSFX"), 1);
    }
}
