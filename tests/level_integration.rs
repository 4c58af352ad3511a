//! Level flow: winning, running out of lives, restarting and loading level
//! files from disk.

use std::path::PathBuf;

use bevy_ecs::prelude::*;

use drage::events::level::LevelRequestEvent;
use drage::game::{build_schedule, build_world, run_headless, step};
use drage::resources::gameconfig::GameConfig;
use drage::resources::gamestate::{GameState, GameStates};
use drage::resources::level::{LevelData, LevelManager, LevelRequest};
use drage::resources::worldsignals::WorldSignals;

const DT: f32 = 1.0 / 60.0;

/// The player spawns inside a win zone.
const INSTANT_WIN: &str = r#"{
    "name": "instant",
    "geometry": { "boxes": [{ "min": [-10, -1], "max": [10, 0] }] },
    "player": { "position": [0, 1], "size": [1, 2] },
    "zones": [{ "min": [-2, 0], "max": [2, 3], "kind": "win" }]
}"#;

/// The player lands in a damage zone, over and over.
const HAZARD: &str = r#"{
    "name": "hazard",
    "geometry": { "boxes": [{ "min": [-10, -1], "max": [10, 0] }] },
    "player": { "position": [0, 4], "size": [1, 2], "lives": 3 },
    "zones": [{ "min": [-1, 0], "max": [1, 2], "kind": "damage", "damage": 1 }]
}"#;

fn world_for(levels: &[&str]) -> (World, Schedule) {
    let levels = levels.iter().map(|text| LevelData::from_json(text).unwrap()).collect();
    let world = build_world(GameConfig::new(), LevelManager::from_levels(levels), None);
    (world, build_schedule())
}

fn state(world: &World) -> GameStates {
    *world.resource::<GameState>().get()
}

#[test]
fn first_level_is_built_before_the_first_frame() {
    let (mut world, mut schedule) = world_for(&[HAZARD]);
    assert!(world.resource::<WorldSignals>().player().is_some());
    step(&mut world, &mut schedule, DT);
    assert_eq!(state(&world), GameStates::Playing);
}

#[test]
fn winning_every_level_finishes_the_run() {
    let (mut world, mut schedule) = world_for(&[INSTANT_WIN, INSTANT_WIN]);
    let summary = run_headless(&mut world, &mut schedule, 100).unwrap();

    assert_eq!(summary.state, GameStates::Finished);
    assert_eq!(summary.level, 1);
    assert!(summary.frames < 10, "took {} frames", summary.frames);
}

#[test]
fn hazards_cost_lives_until_game_over() {
    let (mut world, mut schedule) = world_for(&[HAZARD]);
    step(&mut world, &mut schedule, DT);
    assert_eq!(world.resource::<WorldSignals>().get_integer("lives"), Some(3));

    let summary = run_headless(&mut world, &mut schedule, 600).unwrap();
    assert_eq!(summary.state, GameStates::GameOver);
    assert_eq!(summary.lives, 0);
    assert!(world.resource::<WorldSignals>().has_flag("game_over"));
}

#[test]
fn restart_after_game_over_rebuilds_the_level() {
    let (mut world, mut schedule) = world_for(&[HAZARD]);
    run_headless(&mut world, &mut schedule, 600).unwrap();
    assert_eq!(state(&world), GameStates::GameOver);
    let old_player = world.resource::<WorldSignals>().player().unwrap();

    world.trigger(LevelRequestEvent(LevelRequest::Reload));
    world.flush();
    step(&mut world, &mut schedule, DT);
    step(&mut world, &mut schedule, DT);

    assert_eq!(state(&world), GameStates::Playing);
    let signals = world.resource::<WorldSignals>();
    assert_eq!(signals.get_integer("lives"), Some(3));
    assert!(!signals.has_flag("game_over"));
    assert_ne!(signals.player(), Some(old_player));
    assert!(world.get_entity(old_player).is_err());
}

#[test]
fn missing_level_file_fails_the_run() {
    let levels = LevelManager::new(vec![PathBuf::from("/no/such/level.json")]);
    let mut world = build_world(GameConfig::new(), levels, None);
    let mut schedule = build_schedule();
    assert!(run_headless(&mut world, &mut schedule, 10).is_err());
}

#[test]
fn bundled_levels_load() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let paths = vec![
        root.join("assets/levels/level01.json"),
        root.join("assets/levels/level02.json"),
    ];
    for path in &paths {
        let level = LevelData::load_from_file(&path.to_string_lossy()).unwrap();
        level.geometry.build().unwrap();
    }

    let mut world = build_world(GameConfig::new(), LevelManager::new(paths), None);
    let mut schedule = build_schedule();
    let summary = run_headless(&mut world, &mut schedule, 120).unwrap();
    assert_eq!(summary.state, GameStates::Playing);
    assert_eq!(summary.level, 0);
    assert!(summary.player_position.is_some());
}
