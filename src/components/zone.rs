//! Trigger areas that act on the player when entered.

use bevy_ecs::prelude::{Component, Entity};
use rustc_hash::FxHashSet;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ZoneKind {
    /// Deal damage once per entry.
    Damage { damage: f32 },
    /// Send the player back to the current checkpoint.
    Reset,
    /// Finish the level.
    Win,
    /// Switch the background music.
    Music { track: String },
}

#[derive(Component, Debug, Clone)]
pub struct Zone {
    pub kind: ZoneKind,
    occupants: FxHashSet<Entity>,
}

impl Zone {
    pub fn new(kind: ZoneKind) -> Self {
        Self {
            kind,
            occupants: FxHashSet::default(),
        }
    }

    /// Replace the set of overlapping entities. Returns the ones that just
    /// entered.
    pub fn update_occupants(&mut self, overlapping: impl IntoIterator<Item = Entity>) -> Vec<Entity> {
        let current: FxHashSet<Entity> = overlapping.into_iter().collect();
        let mut entered: Vec<Entity> = current.difference(&self.occupants).copied().collect();
        entered.sort();
        self.occupants = current;
        entered
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.occupants.contains(&entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::world::World;

    #[test]
    fn only_new_occupants_are_reported() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut zone = Zone::new(ZoneKind::Reset);

        assert_eq!(zone.update_occupants([a]), vec![a]);
        assert_eq!(zone.update_occupants([a, b]), vec![b]);
        assert!(zone.update_occupants([a, b]).is_empty());
        // Leaving and coming back counts again.
        assert!(zone.update_occupants([]).is_empty());
        assert!(!zone.contains(a));
        assert_eq!(zone.update_occupants([a]), vec![a]);
    }

    #[test]
    fn kinds_deserialize_by_tag() {
        let zone: ZoneKind = serde_json::from_str(r#"{ "kind": "damage", "damage": 2.5 }"#).unwrap();
        assert_eq!(zone, ZoneKind::Damage { damage: 2.5 });
        let zone: ZoneKind = serde_json::from_str(r#"{ "kind": "music", "track": "boss" }"#).unwrap();
        assert_eq!(zone, ZoneKind::Music { track: "boss".to_string() });
    }
}
