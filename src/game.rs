//! World assembly and the frame loop.
//!
//! [`build_world`] inserts every resource, registers the observers and the
//! state hooks, and enters [`GameStates::Setup`] so the first level is built
//! right away. [`build_schedule`] orders the per-frame systems:
//!
//! 1. clear triggers, read input, apply pending state changes
//! 2. level buttons (restart, next)
//! 3. while playing: mirror colliders, dispatch input, move platforms,
//!    players, enemies and objects, resolve attacks, zones, checkpoints,
//!    health and the camera
//! 4. group counts and audio
//!
//! [`run_headless`] steps a fixed number of frames with a fixed delta. With
//! the `viewer` feature, [`run_viewer`] drives the same schedule from a
//! raylib window.

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::info;

use crate::components::mapposition::MapPosition;
use crate::components::persistent::Persistent;
use crate::events::gamestate::{GameStateChangedEvent, observe_gamestate_change_event};
use crate::events::health::{observe_damage, observe_heal};
use crate::events::level::observe_level_request;
use crate::events::player::{observe_player_game_over, observe_player_reset};
use crate::resources::audio::setup_audio;
use crate::resources::camera::CameraRig;
use crate::resources::checkpoint::CheckpointManager;
use crate::resources::collisionworld::CollisionWorld;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::group::TrackedGroups;
use crate::resources::input::{InputScript, InputState};
use crate::resources::level::LevelManager;
use crate::resources::systemsstore::SystemsStore;
use crate::resources::worldsignals::WorldSignals;
use crate::resources::worldtime::WorldTime;
use crate::systems::attack::{attack_hit_system, attack_system};
use crate::systems::audio::{audio_log_system, update_bevy_audio_cmds};
use crate::systems::camera::{camera_system, level_input_system};
use crate::systems::checkpoint::checkpoint_system;
use crate::systems::collisionworld::sync_collision_world;
use crate::systems::enemy::{enemy_controller_system, enemy_search_system};
use crate::systems::gamestate::{check_pending_state, state_is_playing};
use crate::systems::group::update_group_counts_system;
use crate::systems::health::health_system;
use crate::systems::input::{player_input_system, scripted_input_system};
use crate::systems::level::{LEVEL_ERROR_KEY, game_over, load_level};
use crate::systems::movingplatform::moving_platform_system;
use crate::systems::physicsobject::physics_object_system;
use crate::systems::player::player_controller_system;
use crate::systems::signals::clear_signal_triggers;
use crate::systems::time::update_world_time;
use crate::systems::zone::zone_system;

/// Create the world for a run. `script` replaces keyboard input.
pub fn build_world(config: GameConfig, levels: LevelManager, script: Option<InputScript>) -> World {
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
    world.insert_resource(WorldSignals::default());
    world.insert_resource(TrackedGroups::default());
    world.insert_resource(CollisionWorld::new());
    world.insert_resource(CheckpointManager::default());
    world.insert_resource(CameraRig::default());
    world.insert_resource(InputState::default().with_deadzone(config.deadzone_x, config.deadzone_y));
    world.insert_resource(GameState::new());
    world.insert_resource(NextGameState::new());
    world.insert_resource(levels);
    world.insert_resource(config);
    if let Some(script) = script {
        world.insert_resource(script);
    }
    setup_audio(&mut world);

    world.spawn((Observer::new(observe_gamestate_change_event), Persistent));
    world.spawn((Observer::new(observe_damage), Persistent));
    world.spawn((Observer::new(observe_heal), Persistent));
    world.spawn((Observer::new(observe_player_reset), Persistent));
    world.spawn((Observer::new(observe_player_game_over), Persistent));
    world.spawn((Observer::new(observe_level_request), Persistent));

    // Registered systems are entities too and must survive level rebuilds.
    let mut systems_store = SystemsStore::new();

    let load_level_id = world.register_system(load_level);
    world.entity_mut(load_level_id.entity()).insert(Persistent);
    systems_store.insert("load_level", load_level_id);

    let game_over_id = world.register_system(game_over);
    world.entity_mut(game_over_id.entity()).insert(Persistent);
    systems_store.insert("game_over", game_over_id);

    world.insert_resource(systems_store);
    world.flush();

    world.resource_mut::<NextGameState>().set(GameStates::Setup);
    world.trigger(GameStateChangedEvent {}); // enter Setup now so the first frame already has a level
    world.flush();

    world
}

pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.add_systems(
        (
            clear_signal_triggers,
            scripted_input_system.run_if(resource_exists::<InputScript>),
            check_pending_state,
            level_input_system,
        )
            .chain(),
    );
    update.add_systems(
        (
            sync_collision_world,
            player_input_system,
            enemy_search_system,
            moving_platform_system,
            player_controller_system,
            enemy_controller_system,
            physics_object_system,
            attack_system,
            attack_hit_system,
            zone_system,
            checkpoint_system,
            health_system,
            camera_system,
        )
            .chain()
            .run_if(state_is_playing)
            .after(level_input_system),
    );
    update.add_systems(
        (update_group_counts_system, audio_log_system, update_bevy_audio_cmds)
            .chain()
            .after(camera_system),
    );
    update
}

/// Advance the world by one frame of `dt` unscaled seconds.
pub fn step(world: &mut World, schedule: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers();
}

/// Where a headless run ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub state: GameStates,
    pub level: usize,
    pub lives: i32,
    pub player_position: Option<Vec2>,
}

impl RunSummary {
    fn capture(world: &World, frames: u64) -> Self {
        let signals = world.resource::<WorldSignals>();
        let player_position = signals
            .player()
            .and_then(|player| world.get::<MapPosition>(player))
            .map(|position| position.pos);
        Self {
            frames,
            state: *world.resource::<GameState>().get(),
            level: world.resource::<LevelManager>().current(),
            lives: signals.get_integer("lives").unwrap_or(0),
            player_position,
        }
    }
}

/// Step `frames` frames at the configured fixed delta, stopping early once
/// every level is done. A level that fails to load ends the run with an
/// error.
pub fn run_headless(world: &mut World, schedule: &mut Schedule, frames: u64) -> Result<RunSummary, String> {
    let dt = world.resource::<GameConfig>().fixed_dt;
    let mut ran = 0;
    for _ in 0..frames {
        if let Some(e) = world.resource::<WorldSignals>().get_string(LEVEL_ERROR_KEY) {
            return Err(e.to_string());
        }
        if matches!(world.resource::<GameState>().get(), GameStates::Finished) {
            break;
        }
        step(world, schedule, dt);
        ran += 1;
    }
    if let Some(e) = world.resource::<WorldSignals>().get_string(LEVEL_ERROR_KEY) {
        return Err(e.to_string());
    }
    let summary = RunSummary::capture(world, ran);
    info!(
        "Stopped after {} frames: {:?} on level {}, {} lives, player at {:?}",
        summary.frames, summary.state, summary.level, summary.lives, summary.player_position
    );
    Ok(summary)
}

/// Play in a raylib window with keyboard input until it is closed.
#[cfg(feature = "viewer")]
pub fn run_viewer(world: &mut World, schedule: &mut Schedule) -> Result<(), String> {
    use crate::systems::input::feed_input;
    use crate::systems::render::{read_keyboard, render_pass};

    let config = world.resource::<GameConfig>().clone();
    let (mut rl, thread) = raylib::init()
        .size(config.window_width as i32, config.window_height as i32)
        .resizable()
        .title("drage")
        .build();
    rl.set_target_fps(60);

    while !rl.window_should_close() {
        if let Some(e) = world.resource::<WorldSignals>().get_string(LEVEL_ERROR_KEY) {
            return Err(e.to_string());
        }
        // Clamp stalls such as window drags.
        let dt = rl.get_frame_time().min(config.fixed_dt * 4.0);
        let (raw_axis, held) = read_keyboard(&rl);
        let scaled_dt = dt * world.resource::<WorldTime>().time_scale;
        feed_input(&mut world.resource_mut::<InputState>(), raw_axis, &held, scaled_dt);

        step(world, schedule, dt);

        let mut d = rl.begin_drawing(&thread);
        render_pass(world, &mut d, config.pixels_per_unit);
    }
    Ok(())
}
