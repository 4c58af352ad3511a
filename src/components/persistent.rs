use bevy_ecs::prelude::Component;

/// Marks entities that survive a level rebuild.
///
/// Observers and registered systems live as entities in the world, so they
/// carry this marker. Everything else is despawned by
/// [`clear_level`](crate::systems::level::clear_level).
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Persistent;
