//! Zones act on the player once per entry.
use bevy_ecs::prelude::*;
use log::info;

use crate::components::boxcollider::BoxCollider;
use crate::components::group::Group;
use crate::components::mapposition::MapPosition;
use crate::components::zone::{Zone, ZoneKind};
use crate::events::audio::AudioCmd;
use crate::events::health::DamageEvent;
use crate::events::level::LevelRequestEvent;
use crate::events::player::PlayerResetEvent;
use crate::resources::level::LevelRequest;
use crate::resources::worldsignals::WorldSignals;

pub fn zone_system(
    mut commands: Commands,
    mut zones: Query<(&mut Zone, &MapPosition, &BoxCollider)>,
    candidates: Query<(Entity, &Group, &MapPosition, &BoxCollider), Without<Zone>>,
    mut world_signals: ResMut<WorldSignals>,
    mut audio: MessageWriter<AudioCmd>,
) {
    for (mut zone, zone_position, zone_collider) in zones.iter_mut() {
        let overlapping = candidates
            .iter()
            .filter(|(_, group, _, _)| group.is(Group::PLAYER))
            .filter(|(_, _, position, collider)| zone_collider.overlaps(zone_position.pos, collider, position.pos))
            .map(|(entity, _, _, _)| entity);
        let entered = zone.update_occupants(overlapping);

        for entity in entered {
            match &zone.kind {
                ZoneKind::Damage { damage } => commands.trigger(DamageEvent {
                    target: entity,
                    amount: *damage,
                }),
                ZoneKind::Reset => commands.trigger(PlayerResetEvent { player: entity }),
                ZoneKind::Win => {
                    info!("Level won");
                    world_signals.set_flag("level_won");
                    commands.trigger(LevelRequestEvent(LevelRequest::Next));
                }
                ZoneKind::Music { track } => {
                    audio.write(AudioCmd::StopMusic);
                    audio.write(AudioCmd::music(track.clone()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::message::Messages;

    fn setup(kind: ZoneKind) -> (World, Schedule, Entity, Entity) {
        let mut world = World::new();
        world.insert_resource(WorldSignals::default());
        world.init_resource::<Messages<AudioCmd>>();
        let zone = world
            .spawn((Zone::new(kind), MapPosition::new(0.0, 0.0), BoxCollider::new(2.0, 2.0)))
            .id();
        let player = world
            .spawn((Group::new(Group::PLAYER), MapPosition::new(5.0, 0.0), BoxCollider::new(1.0, 1.0)))
            .id();
        let mut schedule = Schedule::default();
        schedule.add_systems(zone_system);
        (world, schedule, zone, player)
    }

    fn music_commands(world: &mut World) -> Vec<AudioCmd> {
        let mut messages = world.resource_mut::<Messages<AudioCmd>>();
        messages.drain().collect()
    }

    #[test]
    fn music_switches_once_per_entry() {
        let (mut world, mut schedule, zone, player) = setup(ZoneKind::Music {
            track: "cave".into(),
        });
        schedule.run(&mut world);
        assert!(music_commands(&mut world).is_empty());

        world.get_mut::<MapPosition>(player).unwrap().pos.x = 0.5;
        schedule.run(&mut world);
        assert_eq!(
            music_commands(&mut world),
            vec![AudioCmd::StopMusic, AudioCmd::music("cave")]
        );
        assert!(world.get::<Zone>(zone).unwrap().contains(player));

        schedule.run(&mut world);
        assert!(music_commands(&mut world).is_empty());

        world.get_mut::<MapPosition>(player).unwrap().pos.x = 5.0;
        schedule.run(&mut world);
        world.get_mut::<MapPosition>(player).unwrap().pos.x = 0.0;
        schedule.run(&mut world);
        assert_eq!(music_commands(&mut world).len(), 2);
    }

    #[test]
    fn non_players_are_ignored() {
        let (mut world, mut schedule, zone, _) = setup(ZoneKind::Reset);
        let crate_entity = world
            .spawn((Group::new("crate"), MapPosition::new(0.0, 0.0), BoxCollider::new(1.0, 1.0)))
            .id();
        schedule.run(&mut world);
        assert!(!world.get::<Zone>(zone).unwrap().contains(crate_entity));
    }
}
