//! Enemy AI: waypoint patrol, chase, attack and return.
//!
//! The enemy system drives one frame as:
//!
//! 1. [`EnemyController::search`] while no target is held
//! 2. [`EnemyController::update_target`] with the target position and a
//!    line-of-sight result, which may ask for an attack
//! 3. [`EnemyController::calculate_velocity`], resolve, translate
//! 4. [`EnemyController::after_move`]

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use log::debug;
use serde::Deserialize;

use crate::components::collisionbody::{CollisionBody, CollisionData};
use crate::components::collisionlayer::LayerMask;
use crate::math::smooth_damp;
use crate::resources::collisionworld::CollisionWorld;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnemyMovementAttributes {
    pub base_speed: f32,
    pub chase_speed: f32,
    pub smoothing_ground: f32,
    pub smoothing_air: f32,
}

impl Default for EnemyMovementAttributes {
    fn default() -> Self {
        Self {
            base_speed: 2.0,
            chase_speed: 4.0,
            smoothing_ground: 0.1,
            smoothing_air: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChaseAttributes {
    pub max_distance: f32,
    /// Layers that break line of sight.
    pub line_of_sight_mask: LayerMask,
    pub can_search: bool,
}

impl Default for ChaseAttributes {
    fn default() -> Self {
        Self {
            max_distance: 8.0,
            line_of_sight_mask: LayerMask::NONE,
            can_search: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchAttributes {
    pub forward_only: bool,
    pub range: f32,
    pub target_mask: LayerMask,
}

impl Default for SearchAttributes {
    fn default() -> Self {
        Self {
            forward_only: true,
            range: 5.0,
            target_mask: LayerMask::NONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EnemyAttackAttributes {
    pub min_distance: f32,
    pub max_distance: f32,
    pub can_attack: bool,
}

impl Default for EnemyAttackAttributes {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: 1.0,
            can_attack: true,
        }
    }
}

fn default_gravity() -> f32 {
    -50.0
}

fn default_min_waypoint_distance() -> f32 {
    0.2
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnemyAttributes {
    #[serde(default)]
    pub movement: EnemyMovementAttributes,
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    /// Waypoints relative to the spawn point.
    #[serde(default)]
    pub waypoints: Vec<Vec2>,
    #[serde(default = "default_min_waypoint_distance")]
    pub min_waypoint_distance: f32,
    #[serde(default)]
    pub chase: ChaseAttributes,
    #[serde(default)]
    pub search: SearchAttributes,
    #[serde(default)]
    pub attack: EnemyAttackAttributes,
}

impl Default for EnemyAttributes {
    fn default() -> Self {
        Self {
            movement: EnemyMovementAttributes::default(),
            gravity: default_gravity(),
            waypoints: Vec::new(),
            min_waypoint_distance: default_min_waypoint_distance(),
            chase: ChaseAttributes::default(),
            search: SearchAttributes::default(),
            attack: EnemyAttackAttributes::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    Patrol,
    Chase,
    Attack,
    Return,
}

#[derive(Component, Debug, Clone)]
pub struct EnemyController {
    pub attributes: EnemyAttributes,
    pub velocity: Vec2,
    pub can_move: bool,
    pub distance_to_target: f32,
    state: EnemyState,
    target: Option<Entity>,
    searching: bool,
    smooth_velocity: f32,
    waypoints: Vec<Vec2>,
    waypoint_index: usize,
    goal: Vec2,
    spawn_point: Vec2,
}

impl EnemyController {
    pub fn new(attributes: EnemyAttributes, spawn_point: Vec2) -> Self {
        let waypoints: Vec<Vec2> = attributes.waypoints.iter().map(|local| *local + spawn_point).collect();
        let goal = waypoints.first().copied().unwrap_or(spawn_point);
        Self {
            attributes,
            velocity: Vec2::ZERO,
            can_move: true,
            distance_to_target: 0.0,
            state: EnemyState::Patrol,
            target: None,
            searching: true,
            smooth_velocity: 0.0,
            waypoints,
            waypoint_index: 0,
            goal,
            spawn_point,
        }
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Point the enemy walks to when not chasing.
    pub fn goal(&self) -> Vec2 {
        self.goal
    }

    pub fn is_chasing(&self) -> bool {
        self.target.is_some()
    }

    pub fn can_search(&self) -> bool {
        self.attributes.chase.can_search && self.searching && self.target.is_none()
    }

    /// Sweep the horizontal fan for a target on the search mask.
    pub fn search(&self, body: &CollisionBody, world: &CollisionWorld, owner: Entity) -> Option<Entity> {
        let search = self.attributes.search;
        let face = body.data.face_direction as f32;
        let directions: &[f32] = if search.forward_only { &[face] } else { &[-1.0, 1.0] };

        directions.iter().find_map(|direction| {
            body.horizontal_ray_origins(*direction).find_map(|origin| {
                world
                    .raycast(origin, Vec2::X * *direction, search.range, search.target_mask, Some(owner))
                    .and_then(|hit| hit.entity())
            })
        })
    }

    pub fn found_target(&mut self, target: Entity) {
        debug!("Enemy found target {:?}", target);
        self.target = Some(target);
        self.state = EnemyState::Chase;
        self.searching = false;
    }

    /// Drop the target and head back to the closest waypoint, or to the
    /// spawn point when there are none.
    pub fn lose_target(&mut self, position: Vec2) {
        debug!("Enemy lost target {:?}", self.target);
        self.target = None;
        self.searching = true;
        self.smooth_velocity = 0.0;
        self.state = EnemyState::Return;
        match self.closest_waypoint(position) {
            Some(index) => {
                self.waypoint_index = index;
                self.goal = self.waypoints[index];
            }
            None => self.goal = self.spawn_point,
        }
    }

    fn closest_waypoint(&self, position: Vec2) -> Option<usize> {
        let mut closest = None;
        let mut closest_distance = f32::MAX;
        for (index, waypoint) in self.waypoints.iter().enumerate() {
            let distance = position.distance(*waypoint);
            if distance < closest_distance {
                closest_distance = distance;
                closest = Some(index);
            }
        }
        closest
    }

    /// Advance along the waypoints, reversing the list at the end.
    fn next_waypoint(&mut self) -> Vec2 {
        self.waypoint_index += 1;
        if self.waypoint_index >= self.waypoints.len() {
            // The reversed list starts where we stand.
            self.waypoints.reverse();
            self.waypoint_index = 1.min(self.waypoints.len() - 1);
        }
        self.waypoints[self.waypoint_index]
    }

    /// Update chase and patrol state. Returns `true` when the target is in
    /// attack range.
    ///
    /// `target_position` is `None` when the target no longer exists.
    pub fn update_target(&mut self, position: Vec2, target_position: Option<Vec2>, line_of_sight: bool) -> bool {
        if self.target.is_some() {
            let Some(target_position) = target_position else {
                self.lose_target(position);
                return false;
            };
            self.distance_to_target = position.distance(target_position);
            if self.distance_to_target > self.attributes.chase.max_distance || !line_of_sight {
                self.lose_target(position);
                return false;
            }
            let attack = self.attributes.attack;
            return attack.can_attack
                && self.distance_to_target <= attack.max_distance
                && self.distance_to_target >= attack.min_distance;
        }

        let has_goal = self.state == EnemyState::Return || !self.waypoints.is_empty();
        if !has_goal {
            return false;
        }

        // Movement is horizontal only, so arrival ignores height.
        self.distance_to_target = (self.goal.x - position.x).abs();
        if self.distance_to_target < self.attributes.min_waypoint_distance {
            self.smooth_velocity = 0.0;
            if !self.waypoints.is_empty() {
                self.goal = self.next_waypoint();
            }
            self.state = EnemyState::Patrol;
        }
        false
    }

    /// Reflect the attack controller in the state while chasing.
    pub fn set_attacking(&mut self, is_attacking: bool) {
        if self.target.is_some() {
            self.state = if is_attacking {
                EnemyState::Attack
            } else {
                EnemyState::Chase
            };
        }
    }

    /// Horizontal unit direction to the current goal, or 0.
    pub fn move_direction(&self, position: Vec2, target_position: Option<Vec2>) -> f32 {
        let goal = match (self.target, target_position) {
            (Some(_), Some(target)) => target,
            (Some(_), None) => return 0.0,
            (None, _) if self.state == EnemyState::Return || !self.waypoints.is_empty() => self.goal,
            _ => return 0.0,
        };
        let dx = goal.x - position.x;
        if dx == 0.0 { 0.0 } else { dx.signum() }
    }

    fn speed(&self, is_attacking: bool) -> f32 {
        if is_attacking {
            0.0
        } else if self.target.is_some() {
            self.attributes.movement.chase_speed
        } else {
            self.attributes.movement.base_speed
        }
    }

    pub fn calculate_velocity(
        &mut self,
        position: Vec2,
        target_position: Option<Vec2>,
        data: &CollisionData,
        is_attacking: bool,
        delta: f32,
    ) {
        let target_speed = self.speed(is_attacking) * self.move_direction(position, target_position);
        let smooth_time = if data.is_colliding_below {
            self.attributes.movement.smoothing_ground
        } else {
            self.attributes.movement.smoothing_air
        };
        self.velocity.x = smooth_damp(self.velocity.x, target_speed, &mut self.smooth_velocity, smooth_time, delta);
        self.velocity.y += self.attributes.gravity * delta;
    }

    pub fn after_move(&mut self, data: &CollisionData, delta: f32) {
        if data.is_colliding_above || data.is_colliding_below {
            if data.is_sliding_down_slope {
                self.velocity.y += data.slope_normal.y * -self.attributes.gravity * delta;
            } else {
                self.velocity.y = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::boxcollider::BoxCollider;
    use crate::components::collisionbody::CollisionAttributes;
    use crate::components::collisionlayer::Layer;
    use crate::resources::collisionworld::PlatformKind;
    use bevy_ecs::world::World;

    fn patroller() -> EnemyController {
        let attributes = EnemyAttributes {
            waypoints: vec![Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0), Vec2::new(4.0, 0.0)],
            ..Default::default()
        };
        EnemyController::new(attributes, Vec2::new(10.0, 1.0))
    }

    // ==================== PATROL ====================

    #[test]
    fn waypoints_are_global() {
        let enemy = patroller();
        assert_eq!(enemy.waypoints()[0], Vec2::new(8.0, 1.0));
        assert_eq!(enemy.goal(), Vec2::new(8.0, 1.0));
        assert_eq!(enemy.state(), EnemyState::Patrol);
    }

    #[test]
    fn patrol_reverses_at_the_end() {
        let mut enemy = patroller();
        let mut visited = Vec::new();
        for _ in 0..5 {
            let goal = enemy.goal();
            enemy.update_target(goal, None, true);
            visited.push(enemy.goal().x);
        }
        assert_eq!(visited, vec![12.0, 14.0, 12.0, 8.0, 12.0]);
    }

    #[test]
    fn direction_is_horizontal_sign() {
        let enemy = patroller();
        assert_eq!(enemy.move_direction(Vec2::new(10.0, 5.0), None), -1.0);
        assert_eq!(enemy.move_direction(Vec2::new(5.0, -3.0), None), 1.0);
    }

    #[test]
    fn enemy_without_waypoints_stands_still() {
        let mut enemy = EnemyController::new(EnemyAttributes::default(), Vec2::ZERO);
        assert!(!enemy.update_target(Vec2::new(3.0, 0.0), None, true));
        assert_eq!(enemy.move_direction(Vec2::new(3.0, 0.0), None), 0.0);
    }

    // ==================== CHASE ====================

    #[test]
    fn chase_attacks_in_range() {
        let mut world = World::new();
        let player = world.spawn_empty().id();
        let mut enemy = patroller();
        enemy.found_target(player);
        assert_eq!(enemy.state(), EnemyState::Chase);
        assert!(!enemy.can_search());

        let position = Vec2::new(10.0, 1.0);
        assert!(!enemy.update_target(position, Some(Vec2::new(13.0, 1.0)), true));
        assert_eq!(enemy.move_direction(position, Some(Vec2::new(13.0, 1.0))), 1.0);
        assert!(enemy.update_target(position, Some(Vec2::new(10.5, 1.0)), true));

        enemy.set_attacking(true);
        assert_eq!(enemy.state(), EnemyState::Attack);
        assert_eq!(enemy.speed(true), 0.0);
    }

    #[test]
    fn can_attack_flag_is_honored() {
        let mut world = World::new();
        let player = world.spawn_empty().id();
        let mut enemy = patroller();
        enemy.attributes.attack.can_attack = false;
        enemy.found_target(player);
        assert!(!enemy.update_target(Vec2::ZERO, Some(Vec2::new(0.5, 0.0)), true));
    }

    #[test]
    fn lost_target_returns_to_closest_waypoint() {
        let mut world = World::new();
        let player = world.spawn_empty().id();
        let mut enemy = patroller();
        enemy.found_target(player);

        let position = Vec2::new(13.0, 1.0);
        enemy.update_target(position, Some(Vec2::new(13.0, 1.0)), false);
        assert_eq!(enemy.state(), EnemyState::Return);
        assert!(enemy.target().is_none());
        assert!(enemy.can_search());
        // Closest of 8, 12, 14 to 13 is 12 (first found wins ties).
        assert_eq!(enemy.goal(), Vec2::new(12.0, 1.0));

        // Arriving resumes patrol from there.
        enemy.update_target(Vec2::new(12.05, 1.0), None, true);
        assert_eq!(enemy.state(), EnemyState::Patrol);
        assert_eq!(enemy.goal(), Vec2::new(14.0, 1.0));
    }

    #[test]
    fn lost_target_beyond_chase_distance() {
        let mut world = World::new();
        let player = world.spawn_empty().id();
        let mut enemy = EnemyController::new(EnemyAttributes::default(), Vec2::new(1.0, 0.0));
        enemy.found_target(player);
        enemy.update_target(Vec2::new(5.0, 0.0), Some(Vec2::new(20.0, 0.0)), true);
        assert_eq!(enemy.state(), EnemyState::Return);
        // No waypoints: head home.
        assert_eq!(enemy.goal(), Vec2::new(1.0, 0.0));
        assert_eq!(enemy.move_direction(Vec2::new(5.0, 0.0), None), -1.0);
        enemy.update_target(Vec2::new(1.1, 0.5), None, true);
        assert_eq!(enemy.state(), EnemyState::Patrol);
    }

    #[test]
    fn despawned_target_is_lost() {
        let mut world = World::new();
        let player = world.spawn_empty().id();
        let mut enemy = patroller();
        enemy.found_target(player);
        enemy.update_target(Vec2::new(10.0, 1.0), None, true);
        assert!(!enemy.is_chasing());
    }

    // ==================== SEARCH ====================

    #[test]
    fn search_finds_target_in_front() {
        let mut ecs = World::new();
        let owner = ecs.spawn_empty().id();
        let player = ecs.spawn_empty().id();

        let mut world = CollisionWorld::new();
        world.set_dynamic(player, Vec2::new(3.0, 0.0), Vec2::new(4.0, 2.0), Layer::Player, PlatformKind::Solid);

        let attributes = EnemyAttributes {
            search: SearchAttributes {
                forward_only: true,
                range: 5.0,
                target_mask: LayerMask::from_layers(&[Layer::Player]),
            },
            ..Default::default()
        };
        let enemy = EnemyController::new(attributes, Vec2::new(0.0, 1.0));
        let collider = BoxCollider::new(1.0, 2.0);
        let mut body = CollisionBody::new(CollisionAttributes::default(), &collider);
        body.update_bounds(Vec2::new(0.0, 1.0), &collider);

        assert_eq!(enemy.search(&body, &world, owner), Some(player));

        body.data.face_direction = -1;
        assert_eq!(enemy.search(&body, &world, owner), None);
    }
}
