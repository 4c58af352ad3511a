//! Enemy AI: searching for a target, chasing, patrolling and attacking.
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::debug;

use crate::components::attack::AttackController;
use crate::components::boxcollider::BoxCollider;
use crate::components::collisionbody::CollisionBody;
use crate::components::enemycontroller::{EnemyController, EnemyState};
use crate::components::mapposition::MapPosition;
use crate::components::signals::Signals;
use crate::components::staticvelocity::StaticVelocity;
use crate::resources::collisionworld::CollisionWorld;
use crate::resources::worldtime::WorldTime;
use crate::systems::collisionworld::move_body;

type EnemyParts = (
    Entity,
    &'static mut EnemyController,
    &'static mut CollisionBody,
    &'static mut MapPosition,
    &'static BoxCollider,
    Option<&'static mut StaticVelocity>,
    Option<&'static mut AttackController>,
    Option<&'static mut Signals>,
);

fn state_name(state: EnemyState) -> &'static str {
    match state {
        EnemyState::Patrol => "patrol",
        EnemyState::Chase => "chase",
        EnemyState::Attack => "attack",
        EnemyState::Return => "return",
    }
}

/// Nothing on the line-of-sight mask lies between `from` and `to`.
pub fn has_line_of_sight(collision_world: &CollisionWorld, enemy: &EnemyController, from: Vec2, to: Vec2) -> bool {
    let offset = to - from;
    let distance = offset.length();
    if distance <= f32::EPSILON {
        return true;
    }
    collision_world
        .raycast(from, offset / distance, distance, enemy.attributes.chase.line_of_sight_mask, None)
        .is_none()
}

/// Enemies without a target sweep their search rays.
pub fn enemy_search_system(
    collision_world: Res<CollisionWorld>,
    mut enemies: Query<(Entity, &mut EnemyController, &mut CollisionBody, &MapPosition, &BoxCollider)>,
) {
    for (entity, mut enemy, mut body, position, collider) in enemies.iter_mut() {
        if !enemy.can_search() {
            continue;
        }
        body.update_bounds(position.pos, collider);
        if let Some(target) = enemy.search(&body, &collision_world, entity) {
            enemy.found_target(target);
        }
    }
}

pub fn enemy_controller_system(
    time: Res<WorldTime>,
    mut collision_world: ResMut<CollisionWorld>,
    mut enemies: Query<EnemyParts>,
    targets: Query<&MapPosition, Without<EnemyController>>,
) {
    let delta = time.delta;

    for (entity, mut enemy, mut body, mut position, collider, mut static_velocity, mut attack, signals) in
        enemies.iter_mut()
    {
        body.tick(delta);

        let target_position = enemy.target().and_then(|target| targets.get(target).ok()).map(|p| p.pos);
        let line_of_sight = target_position
            .is_some_and(|target| has_line_of_sight(&collision_world, &enemy, position.pos, target));

        let mut started_attack = false;
        if enemy.update_target(position.pos, target_position, line_of_sight) {
            if let Some(attack) = attack.as_deref_mut() {
                if let Some(start) = attack.request_attack(body.data.face_direction) {
                    debug!("Enemy {:?} attack '{}'", entity, start.attack_name);
                    started_attack = true;
                }
            }
        }
        let is_attacking = attack.as_deref().is_some_and(|attack| attack.is_actively_attacking());
        enemy.set_attacking(is_attacking);

        let displacement = match static_velocity.as_deref_mut().and_then(|sv| sv.step(delta)) {
            Some(displacement) => {
                enemy.velocity = Vec2::ZERO;
                Some(displacement)
            }
            None => {
                enemy.calculate_velocity(position.pos, target_position, &body.data, is_attacking, delta);
                enemy.can_move.then_some(enemy.velocity * delta)
            }
        };

        let mut moved = Vec2::ZERO;
        if let Some(displacement) = displacement {
            moved = move_body(
                &mut collision_world,
                entity,
                &mut body,
                &mut position,
                collider,
                displacement,
                Vec2::ZERO,
            );
            enemy.after_move(&body.data, delta);
        }

        if let Some(mut signals) = signals {
            if started_attack {
                signals.fire_trigger("attack");
            }
            signals.set_flag_to("grounded", body.data.is_colliding_below);
            signals.set_flag_to("chasing", enemy.is_chasing());
            signals.set_scalar("move_speed", if delta > 0.0 { moved.x.abs() / delta } else { 0.0 });
            signals.set_integer("face_direction", body.data.face_direction);
            signals.set_string("state", state_name(enemy.state()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::collisionlayer::{Layer, LayerMask};
    use crate::components::enemycontroller::EnemyAttributes;
    use crate::resources::collisionworld::{ConvexShape, PlatformKind};

    fn enemy() -> EnemyController {
        let mut attributes = EnemyAttributes::default();
        attributes.chase.line_of_sight_mask = LayerMask::from_layers(&[Layer::Ground]);
        EnemyController::new(attributes, Vec2::ZERO)
    }

    // ==== LINE OF SIGHT ====

    #[test]
    fn open_ground_gives_sight() {
        let world = CollisionWorld::new();
        assert!(has_line_of_sight(&world, &enemy(), Vec2::ZERO, Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn wall_blocks_sight() {
        let mut world = CollisionWorld::new();
        world.add_static(
            ConvexShape::from_box(Vec2::new(2.0, -1.0), Vec2::new(3.0, 1.0)),
            Layer::Ground,
            PlatformKind::Solid,
        );
        assert!(!has_line_of_sight(&world, &enemy(), Vec2::ZERO, Vec2::new(5.0, 0.0)));
        assert!(has_line_of_sight(&world, &enemy(), Vec2::ZERO, Vec2::new(1.5, 0.0)));
    }

    // ==== SYSTEM ====

    #[test]
    fn patrolling_enemy_walks_toward_first_waypoint() {
        let mut world = World::new();
        let mut collision_world = CollisionWorld::new();
        collision_world.add_static(
            ConvexShape::from_box(Vec2::new(-20.0, -1.0), Vec2::new(20.0, 0.0)),
            Layer::Ground,
            PlatformKind::Solid,
        );
        world.insert_resource(collision_world);
        world.insert_resource(WorldTime {
            delta: 1.0 / 60.0,
            ..Default::default()
        });

        let mut attributes = EnemyAttributes::default();
        attributes.waypoints = vec![Vec2::new(5.0, 0.0), Vec2::new(-5.0, 0.0)];
        let collider = BoxCollider::new(1.0, 1.0);
        let body = CollisionBody::new(Default::default(), &collider);
        let start = Vec2::new(0.0, 0.5);
        let entity = world
            .spawn((
                EnemyController::new(attributes, start),
                body,
                MapPosition::from_vec(start),
                collider,
                Signals::default(),
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(enemy_controller_system);
        for _ in 0..30 {
            schedule.run(&mut world);
        }

        let position = world.get::<MapPosition>(entity).unwrap().pos;
        assert!(position.x > 0.0);
        let signals = world.get::<Signals>(entity).unwrap();
        assert_eq!(signals.get_string("state"), Some("patrol"));
        assert!(signals.has_flag("grounded"));
    }
}
