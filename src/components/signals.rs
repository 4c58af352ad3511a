// Per-entity signals read by animation and UI layers

use bevy_ecs::prelude::Component;
use rustc_hash::{FxHashMap, FxHashSet};

/// Animation and UI facing state published by gameplay systems.
///
/// Flags and scalars persist until overwritten. Triggers are one-frame
/// pulses: they are cleared at the start of every frame by
/// [`clear_signal_triggers`](crate::systems::signals::clear_signal_triggers).
#[derive(Debug, Clone, Component, Default)]
pub struct Signals {
    pub scalars: FxHashMap<String, f32>,
    pub integers: FxHashMap<String, i32>,
    pub strings: FxHashMap<String, String>,
    pub flags: FxHashSet<String>,
    pub triggers: FxHashSet<String>,
}

impl Signals {
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
    /// Set or clear `key` depending on `value`.
    pub fn set_flag_to(&mut self, key: &str, value: bool) {
        if value {
            self.flags.insert(key.to_string());
        } else {
            self.flags.remove(key);
        }
    }
    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }
    pub fn fire_trigger(&mut self, key: impl Into<String>) {
        self.triggers.insert(key.into());
    }
    pub fn has_trigger(&self, key: &str) -> bool {
        self.triggers.contains(key)
    }
    pub fn clear_triggers(&mut self) {
        self.triggers.clear();
    }
}
