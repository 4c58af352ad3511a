//! Camera movement and the level buttons tied to it.
use bevy_ecs::prelude::*;

use crate::components::boxcollider::BoxCollider;
use crate::components::mapposition::MapPosition;
use crate::events::level::LevelRequestEvent;
use crate::resources::camera::{CameraMode, CameraRig};
use crate::resources::gamestate::{GameState, GameStates};
use crate::resources::input::{Button, InputState};
use crate::resources::level::LevelRequest;
use crate::resources::worldsignals::WorldSignals;
use crate::resources::worldtime::WorldTime;

pub fn camera_system(
    time: Res<WorldTime>,
    input: Res<InputState>,
    world_signals: Res<WorldSignals>,
    mut rig: ResMut<CameraRig>,
    targets: Query<(&MapPosition, &BoxCollider)>,
) {
    let rig = &mut *rig;
    match &mut rig.mode {
        CameraMode::Fixed => {}
        CameraMode::Follow(follow) => {
            let Some((position, collider)) = world_signals.player().and_then(|player| targets.get(player).ok())
            else {
                return;
            };
            let (min, max) = collider.aabb(position.pos);
            rig.position = follow.update(rig.position, min, max, input.direction().x, time.delta);
        }
        CameraMode::Navigator(navigator) => {
            if let Some(position) = navigator.update(time.delta) {
                rig.position = position;
            }
        }
    }
}

/// Restart is always available outside a load. Next level is only offered
/// once a navigator camera has finished its pan.
pub fn level_input_system(
    mut commands: Commands,
    input: Res<InputState>,
    state: Res<GameState>,
    rig: Res<CameraRig>,
) {
    if matches!(state.get(), GameStates::Setup | GameStates::None) {
        return;
    }
    if input.just_pressed(Button::RestartLevel) {
        commands.trigger(LevelRequestEvent(LevelRequest::Reload));
    } else if input.just_pressed(Button::NextLevel)
        && matches!(state.get(), GameStates::Playing)
        && rig.navigator_finished()
    {
        commands.trigger(LevelRequestEvent(LevelRequest::Next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::camera::{CameraSettings, NavigatorCameraAttributes};
    use glam::Vec2;

    fn world_with(rig: CameraRig) -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 0.5,
            ..Default::default()
        });
        world.insert_resource(InputState::default());
        world.insert_resource(WorldSignals::default());
        world.insert_resource(rig);
        world
    }

    #[test]
    fn navigator_pans_between_waypoints() {
        let settings = CameraSettings::Navigator(NavigatorCameraAttributes {
            waypoints: vec![Vec2::ZERO, Vec2::new(10.0, 0.0)],
            wait_time: 0.0,
            pan_time: 1.0,
        });
        let mut world = world_with(CameraRig::from_settings(Some(&settings), Vec2::ZERO));
        let mut schedule = Schedule::default();
        schedule.add_systems(camera_system);

        schedule.run(&mut world);
        assert_eq!(world.resource::<CameraRig>().position, Vec2::new(5.0, 0.0));
        schedule.run(&mut world);
        let rig = world.resource::<CameraRig>();
        assert_eq!(rig.position, Vec2::new(10.0, 0.0));
        assert!(rig.navigator_finished());
    }

    #[test]
    fn follow_without_player_stays_put() {
        let mut world = world_with(CameraRig::from_settings(None, Vec2::new(3.0, 4.0)));
        let mut schedule = Schedule::default();
        schedule.add_systems(camera_system);
        schedule.run(&mut world);
        assert_eq!(world.resource::<CameraRig>().position, Vec2::new(3.0, 4.0));
    }

    #[test]
    fn follow_tracks_player() {
        let mut world = world_with(CameraRig::from_settings(None, Vec2::ZERO));
        let player = world.spawn((MapPosition::new(0.0, 0.0), BoxCollider::new(1.0, 2.0))).id();
        world.resource_mut::<WorldSignals>().set_entity("player", player);
        let mut schedule = Schedule::default();
        schedule.add_systems(camera_system);

        schedule.run(&mut world);
        world.get_mut::<MapPosition>(player).unwrap().pos.x = 20.0;
        for _ in 0..40 {
            schedule.run(&mut world);
        }
        assert!(world.resource::<CameraRig>().position.x > 15.0);
    }
}
