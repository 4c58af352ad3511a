//! Building the world from level data.
//!
//! [`load_level`] is the enter hook of [`GameStates::Setup`]. It applies the
//! pending [`LevelRequest`], clears the previous level and spawns the new one:
//! static geometry goes into the [`CollisionWorld`], everything that moves
//! becomes an entity. [`game_over`] is the enter hook of
//! [`GameStates::GameOver`].
use bevy_ecs::prelude::*;
use log::{error, info};

use crate::components::attack::AttackController;
use crate::components::boxcollider::BoxCollider;
use crate::components::collisionbody::{CollisionAttributes, CollisionBody};
use crate::components::collisionlayer::{CollisionLayer, Layer};
use crate::components::enemycontroller::EnemyController;
use crate::components::group::Group;
use crate::components::health::{Health, Lives};
use crate::components::mapposition::MapPosition;
use crate::components::movingplatform::MovingPlatform;
use crate::components::persistent::Persistent;
use crate::components::physicsobject::PhysicsObject;
use crate::components::playercontroller::PlayerController;
use crate::components::signals::Signals;
use crate::components::staticvelocity::StaticVelocity;
use crate::components::zone::{Zone, ZoneKind};
use crate::events::audio::AudioCmd;
use crate::resources::camera::CameraRig;
use crate::resources::checkpoint::CheckpointManager;
use crate::resources::collisionworld::CollisionWorld;
use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::group::TrackedGroups;
use crate::resources::level::{
    BuiltGeometry, HAZARD_TILE_DAMAGE, LevelData, LevelManager, LevelRequest, LevelTarget,
};
use crate::resources::worldsignals::{PLAYER_KEY, WorldSignals};

/// World signal holding the reason the last load failed.
pub const LEVEL_ERROR_KEY: &str = "level_error";

/// Group of loose physics objects.
pub const OBJECT_GROUP: &str = "object";
/// Group of moving platforms.
pub const PLATFORM_GROUP: &str = "platform";

/// Despawn every level entity and forget per-level state.
///
/// Level entities are the ones placed in the world; [`Persistent`] ones
/// are kept.
pub fn clear_level(world: &mut World) {
    let doomed: Vec<Entity> = world
        .query_filtered::<Entity, (With<MapPosition>, Without<Persistent>)>()
        .iter(world)
        .collect();
    for entity in doomed {
        world.despawn(entity);
    }
    world.resource_mut::<CollisionWorld>().clear();
    world.resource_mut::<WorldSignals>().clear();
    world.resource_mut::<TrackedGroups>().clear();
}

pub fn load_level(world: &mut World) {
    match try_load_level(world) {
        Ok(Some(index)) => {
            info!("Level {} ready", index);
            world.resource_mut::<NextGameState>().set(GameStates::Playing);
        }
        Ok(None) => {
            info!("No more levels");
            world.resource_mut::<NextGameState>().set(GameStates::Finished);
        }
        Err(e) => {
            error!("Failed to load level: {}", e);
            world.resource_mut::<WorldSignals>().set_string(LEVEL_ERROR_KEY, e);
            world.resource_mut::<NextGameState>().set(GameStates::None);
        }
    }
}

/// Returns the index of the level that was built, or `None` once the last
/// level is done.
fn try_load_level(world: &mut World) -> Result<Option<usize>, String> {
    let (index, level) = {
        let mut levels = world.resource_mut::<LevelManager>();
        let request = levels.take_pending().unwrap_or(LevelRequest::Reload);
        match levels.resolve(request)? {
            LevelTarget::Finished => return Ok(None),
            LevelTarget::Level(index) => (index, levels.load(index)?),
        }
    };
    let geometry = level.geometry.build()?;

    clear_level(world);
    info!("Building level {} '{}'", index, level.name);
    spawn_level(world, &level, geometry);
    world
        .resource_mut::<WorldSignals>()
        .set_integer("level", index as i32);
    Ok(Some(index))
}

fn spawn_level(world: &mut World, level: &LevelData, geometry: BuiltGeometry) {
    {
        let mut collision_world = world.resource_mut::<CollisionWorld>();
        for shape in geometry.shapes {
            collision_world.add_static(shape.shape, shape.layer, shape.platform);
        }
    }

    let player = spawn_player(world, level);

    for data in &level.enemies {
        let collider = BoxCollider::new(data.size.x, data.size.y);
        let attacks = AttackController::new(data.attacks.clone(), data.attackable);
        world.spawn((
            Group::new(Group::ENEMY),
            MapPosition::from_vec(data.position),
            CollisionBody::new(data.collision, &collider),
            collider,
            CollisionLayer(Layer::Enemy),
            EnemyController::new(data.attributes.clone(), data.position),
            Health::new(data.health).with_hit_effect(data.hit_effect),
            attacks,
            StaticVelocity::default(),
            Signals::default(),
        ));
    }

    for data in &level.platforms {
        let collider = BoxCollider::new(data.size.x, data.size.y);
        world.spawn((
            Group::new(PLATFORM_GROUP),
            MapPosition::from_vec(data.position),
            CollisionBody::new(CollisionAttributes::default(), &collider),
            collider,
            CollisionLayer(data.layer),
            data.platform,
            MovingPlatform::new(data.attributes.clone(), data.position),
        ));
    }

    for data in &level.objects {
        let collider = BoxCollider::new(data.size.x, data.size.y);
        let mut object = world.spawn((
            Group::new(OBJECT_GROUP),
            MapPosition::from_vec(data.position),
            CollisionBody::new(data.collision, &collider),
            collider,
            CollisionLayer(Layer::Object),
            PhysicsObject::new(data.gravity),
            StaticVelocity::default(),
        ));
        if let Some(health) = data.health {
            object.insert(Health::new(health));
        }
    }

    let hazards = geometry
        .hazards
        .iter()
        .map(|(min, max)| (*min, *max, ZoneKind::Damage { damage: HAZARD_TILE_DAMAGE }));
    let zones = level.zones.iter().map(|zone| (zone.min, zone.max, zone.kind.clone()));
    for (min, max, kind) in zones.chain(hazards) {
        let size = max - min;
        world.spawn((
            MapPosition::from_vec((min + max) * 0.5),
            BoxCollider::new(size.x.abs(), size.y.abs()),
            Zone::new(kind),
        ));
    }

    let spawn = level.player.position;
    let mut checkpoint_list = level.checkpoints.clone();
    if checkpoint_list.is_empty() {
        checkpoint_list.push(spawn);
    }
    let mut checkpoints = CheckpointManager::new(checkpoint_list);
    if let Some(distance) = level.checkpoint_distance {
        checkpoints = checkpoints.with_min_distance(distance);
    }
    world.insert_resource(checkpoints);
    world.insert_resource(CameraRig::from_settings(level.camera.as_ref(), spawn));

    {
        let mut signals = world.resource_mut::<WorldSignals>();
        signals.set_entity(PLAYER_KEY, player);
        signals.set_integer("lives", level.player.lives);
        signals.set_string("level_name", level.name.clone());
    }
    {
        let mut groups = world.resource_mut::<TrackedGroups>();
        groups.add_group(Group::PLAYER);
        groups.add_group(Group::ENEMY);
    }

    if let Some(music) = &level.music {
        world.write_message(AudioCmd::music(music.clone()));
    }
}

fn spawn_player(world: &mut World, level: &LevelData) -> Entity {
    let data = &level.player;
    let collider = BoxCollider::new(data.size.x, data.size.y);
    let attacks = AttackController::new(data.attacks.clone(), data.attackable).with_weapons(data.weapons.clone());
    world
        .spawn((
            (
                Group::new(Group::PLAYER),
                MapPosition::from_vec(data.position),
                CollisionBody::new(data.collision, &collider),
                collider,
                CollisionLayer(Layer::Player),
            ),
            (
                PlayerController::new(data.attributes.clone()),
                Health::new(data.health).with_hit_effect(data.hit_effect),
                Lives::new(data.lives),
                attacks,
                StaticVelocity::default(),
                Signals::default(),
            ),
        ))
        .id()
}

/// Enter hook of the game over state.
pub fn game_over(mut world_signals: ResMut<WorldSignals>, mut audio: MessageWriter<AudioCmd>) {
    info!("Game over, restart the level to try again");
    world_signals.set_flag("game_over");
    audio.write(AudioCmd::StopMusic);
}
