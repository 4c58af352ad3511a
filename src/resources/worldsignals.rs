//! Global signal storage resource.
//!
//! [`WorldSignals`] is the world-wide counterpart of the per-entity
//! [`Signals`](crate::components::signals::Signals). Gameplay systems publish
//! run-level facts here so that unrelated systems (and the viewer HUD) can
//! read them without entity queries.
//!
//! Well-known keys:
//! - entity `"player"`: the current player entity
//! - string `"level"`: name of the loaded level
//! - integer `"lives"`: remaining player lives
//! - integer `"checkpoint"`: index of the active checkpoint
//! - integer `"group_count:{name}"`: entities per tracked group
//! - flag `"level_won"`: set when a win zone is entered

use bevy_ecs::prelude::{Entity, Resource};
use rustc_hash::{FxHashMap, FxHashSet};

pub const PLAYER_KEY: &str = "player";

#[derive(Debug, Clone, Default, Resource)]
pub struct WorldSignals {
    pub scalars: FxHashMap<String, f32>,
    pub integers: FxHashMap<String, i32>,
    pub strings: FxHashMap<String, String>,
    /// A key being present means "true".
    pub flags: FxHashSet<String>,
    pub entities: FxHashMap<String, Entity>,
}

impl WorldSignals {
    pub fn set_scalar(&mut self, key: impl Into<String>, value: f32) {
        self.scalars.insert(key.into(), value);
    }
    pub fn get_scalar(&self, key: &str) -> Option<f32> {
        self.scalars.get(key).copied()
    }
    pub fn set_integer(&mut self, key: impl Into<String>, value: i32) {
        self.integers.insert(key.into(), value);
    }
    pub fn get_integer(&self, key: &str) -> Option<i32> {
        self.integers.get(key).copied()
    }
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.strings.get(key).map(String::as_str)
    }
    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.flags.insert(key.into());
    }
    pub fn clear_flag(&mut self, key: &str) {
        self.flags.remove(key);
    }
    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }
    pub fn get_entity(&self, key: &str) -> Option<Entity> {
        self.entities.get(key).copied()
    }
    pub fn set_entity(&mut self, key: impl Into<String>, entity: Entity) {
        self.entities.insert(key.into(), entity);
    }
    pub fn remove_entity(&mut self, key: &str) -> Option<Entity> {
        self.entities.remove(key)
    }

    /// The current player, if a level is loaded.
    pub fn player(&self) -> Option<Entity> {
        self.get_entity(PLAYER_KEY)
    }

    pub fn set_group_count(&mut self, group: &str, count: i32) {
        self.set_integer(format!("group_count:{}", group), count);
    }

    pub fn group_count(&self, group: &str) -> Option<i32> {
        self.get_integer(&format!("group_count:{}", group))
    }

    /// Drop everything that belongs to the loaded level.
    pub fn clear(&mut self) {
        self.scalars.clear();
        self.integers.clear();
        self.strings.clear();
        self.flags.clear();
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn group_counts_use_prefixed_keys() {
        let mut signals = WorldSignals::default();
        signals.set_group_count("enemy", 2);
        assert_eq!(signals.group_count("enemy"), Some(2));
        assert_eq!(signals.get_integer("group_count:enemy"), Some(2));
        assert_eq!(signals.group_count("player"), None);
    }

    #[test]
    fn clear_forgets_the_player() {
        let mut world = World::new();
        let mut signals = WorldSignals::default();
        signals.set_entity(PLAYER_KEY, world.spawn_empty().id());
        signals.set_flag("level_won");
        assert!(signals.player().is_some());
        signals.clear();
        assert!(signals.player().is_none());
        assert!(!signals.has_flag("level_won"));
    }
}
