//! Registry for state hooks.
//!
//! Systems registered with [`World::register_system`](bevy_ecs::world::World::register_system)
//! are stored under string keys and run by the game state observer through
//! their [`SystemId`]. The keys in use are `"load_level"` (apply the
//! pending level request on entering Setup) and `"game_over"`.

use bevy_ecs::prelude::Resource;
use bevy_ecs::system::SystemId;
use rustc_hash::FxHashMap;

#[derive(Resource, Default)]
pub struct SystemsStore {
    pub map: FxHashMap<String, SystemId>,
}

impl SystemsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: SystemId) {
        self.map.insert(name.into(), id);
    }

    pub fn get(&self, name: impl AsRef<str>) -> Option<&SystemId> {
        self.map.get(name.as_ref())
    }
}
