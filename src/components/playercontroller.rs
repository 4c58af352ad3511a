//! Player movement state machine.
//!
//! The controller owns the player's velocity. Every frame the player system
//! calls, in order:
//!
//! 1. [`PlayerController::calculate_velocity`]
//! 2. [`PlayerController::handle_wall_sliding`]
//! 3. [`PlayerController::handle_dash`]
//! 4. the collision body resolves `velocity * dt` and the position moves
//! 5. [`PlayerController::after_move`]
//!
//! Jump, dash, sprint and early-release are one-shot requests dispatched by
//! the input system between frames.

use bevy_ecs::prelude::Component;
use glam::Vec2;
use serde::Deserialize;

use crate::components::collisionbody::{CollisionData, CollisionDirection};
use crate::components::collisionlayer::LayerMask;
use crate::math::{required_velocity, sign, smooth_damp};
use crate::resources::collisionworld::CollisionWorld;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementAttributes {
    pub base_speed: f32,
    pub sprint_speed: f32,
    pub smoothing_ground: f32,
    pub smoothing_air: f32,
}

impl Default for MovementAttributes {
    fn default() -> Self {
        Self {
            base_speed: 6.0,
            sprint_speed: 9.0,
            smoothing_ground: 0.1,
            smoothing_air: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct JumpAttributes {
    pub min_height: f32,
    pub max_height: f32,
    /// Seconds to reach `max_height`.
    pub time_to_apex: f32,
}

impl Default for JumpAttributes {
    fn default() -> Self {
        Self {
            min_height: 1.0,
            max_height: 4.0,
            time_to_apex: 0.4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WallAttributes {
    pub jump_off: Vec2,
    pub jump_climb: Vec2,
    pub jump_leap: Vec2,
    pub max_slide_speed: f32,
    pub stick_time: f32,
}

impl Default for WallAttributes {
    fn default() -> Self {
        Self {
            jump_off: Vec2::new(8.5, 7.0),
            jump_climb: Vec2::new(7.5, 16.0),
            jump_leap: Vec2::new(18.0, 17.0),
            max_slide_speed: 3.0,
            stick_time: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashAttributes {
    pub ground_distance: f32,
    pub ground_time: f32,
    pub air_distance: f32,
    pub air_time: f32,
    /// Colliders on these layers stop a dash on contact.
    pub stop_mask: LayerMask,
}

impl Default for DashAttributes {
    fn default() -> Self {
        Self {
            ground_distance: 3.0,
            ground_time: 0.2,
            air_distance: 2.5,
            air_time: 0.2,
            stop_mask: LayerMask::NONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PlayerAttributes {
    pub movement: MovementAttributes,
    pub jump: JumpAttributes,
    pub wall: WallAttributes,
    pub dash: DashAttributes,
}

/// Coarse state for animation and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Grounded,
    Airborne,
    WallSliding,
    Dashing,
    Attacking,
}

/// What a jump request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Normal,
    SlopeSlide,
    WallClimb,
    WallOff,
    WallLeap,
}

impl JumpKind {
    pub fn is_wall_jump(self) -> bool {
        matches!(self, JumpKind::WallClimb | JumpKind::WallOff | JumpKind::WallLeap)
    }
}

#[derive(Component, Debug, Clone)]
pub struct PlayerController {
    pub attributes: PlayerAttributes,
    pub velocity: Vec2,
    pub input: Vec2,
    pub input_direction: Vec2,
    pub can_move: bool,
    pub can_sprint: bool,
    pub can_dash: bool,
    pub is_wall_sliding: bool,
    pub is_dashing: bool,
    pub disabled: bool,
    gravity: f32,
    min_jump_velocity: f32,
    max_jump_velocity: f32,
    smooth_velocity: f32,
    is_sprinting: bool,
    wall_direction: i32,
    wall_stick_time: f32,
    dash_direction: i32,
    dash_acceleration: f32,
    dash_remaining: f32,
    has_air_dashed: bool,
}

impl PlayerController {
    pub fn new(attributes: PlayerAttributes) -> Self {
        let jump = attributes.jump;
        let gravity = -(2.0 * jump.max_height / jump.time_to_apex.powi(2));
        Self {
            attributes,
            velocity: Vec2::ZERO,
            input: Vec2::ZERO,
            input_direction: Vec2::ZERO,
            can_move: true,
            can_sprint: true,
            can_dash: true,
            is_wall_sliding: false,
            is_dashing: false,
            disabled: false,
            gravity,
            min_jump_velocity: (2.0 * gravity.abs() * jump.min_height).sqrt(),
            max_jump_velocity: gravity.abs() * jump.time_to_apex,
            smooth_velocity: 0.0,
            is_sprinting: false,
            wall_direction: 1,
            wall_stick_time: 0.0,
            dash_direction: 0,
            dash_acceleration: 0.0,
            dash_remaining: 0.0,
            has_air_dashed: true,
        }
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn min_jump_velocity(&self) -> f32 {
        self.min_jump_velocity
    }

    pub fn max_jump_velocity(&self) -> f32 {
        self.max_jump_velocity
    }

    pub fn is_sprinting(&self) -> bool {
        self.is_sprinting
    }

    pub fn receive_input(&mut self, raw: Vec2, direction: Vec2) {
        self.input = raw;
        self.input_direction = direction;
    }

    pub fn state(&self, data: &CollisionData, is_attacking: bool) -> PlayerState {
        if self.is_dashing {
            PlayerState::Dashing
        } else if is_attacking {
            PlayerState::Attacking
        } else if self.is_wall_sliding {
            PlayerState::WallSliding
        } else if data.is_colliding_below {
            PlayerState::Grounded
        } else {
            PlayerState::Airborne
        }
    }

    // ==================== FRAME STEPS ====================

    pub fn calculate_velocity(&mut self, data: &CollisionData, is_attacking: bool, delta: f32) {
        if !self.can_move {
            return;
        }
        let target = self.target_speed(data, is_attacking);
        let smooth_time = if data.is_colliding_below {
            self.attributes.movement.smoothing_ground
        } else {
            self.attributes.movement.smoothing_air
        };
        self.velocity.x = smooth_damp(self.velocity.x, target, &mut self.smooth_velocity, smooth_time, delta);
        self.velocity.y += self.gravity * delta;
    }

    fn target_speed(&self, data: &CollisionData, is_attacking: bool) -> f32 {
        if self.is_dashing || is_attacking {
            return 0.0;
        }
        if self.is_sprinting && data.is_colliding_below {
            self.input_direction.x * self.attributes.movement.sprint_speed
        } else {
            self.input.x * self.attributes.movement.base_speed
        }
    }

    pub fn handle_wall_sliding(&mut self, data: &CollisionData, delta: f32) {
        self.wall_direction = if data.is_colliding_left { -1 } else { 1 };
        self.is_wall_sliding = false;

        if !(data.is_adjacent_to_climbable_wall && !data.is_colliding_below && self.velocity.y < 0.0) {
            return;
        }
        self.is_wall_sliding = true;

        let wall = self.attributes.wall;
        if self.velocity.y < -wall.max_slide_speed {
            self.velocity.y = -wall.max_slide_speed;
        }

        if self.wall_stick_time > 0.0 {
            self.velocity.x = 0.0;
            self.smooth_velocity = 0.0;
            let input_x = self.input_direction.x;
            if input_x != self.wall_direction as f32 && input_x != 0.0 {
                self.wall_stick_time -= delta;
            } else {
                self.wall_stick_time = wall.stick_time;
            }
        } else {
            self.wall_stick_time = wall.stick_time;
        }
    }

    pub fn handle_dash(&mut self, data: &CollisionData, world: &CollisionWorld, delta: f32) {
        if !self.is_dashing {
            if self.has_air_dashed && (data.is_colliding_below || data.is_adjacent_to_climbable_wall) {
                self.has_air_dashed = false;
            }
            return;
        }

        if self.dash_remaining <= 0.0 {
            self.end_dash();
            return;
        }

        if self.dash_blocked(data, world) {
            self.end_dash();
            return;
        }

        self.velocity.x += self.dash_acceleration * delta;
        self.velocity.y = 0.0;
        self.dash_remaining -= delta;
    }

    fn dash_blocked(&self, data: &CollisionData, world: &CollisionWorld) -> bool {
        let (blocked, direction) = if self.dash_direction < 0 {
            (data.is_colliding_left, CollisionDirection::Left)
        } else {
            (data.is_colliding_right, CollisionDirection::Right)
        };
        if !blocked {
            return false;
        }
        let stop_mask = self.attributes.dash.stop_mask;
        data.collided.iter().any(|info| {
            info.direction == direction
                && world
                    .layer_of(info.collider)
                    .is_some_and(|layer| stop_mask.contains_layer(layer))
        })
    }

    fn end_dash(&mut self) {
        self.dash_direction = 0;
        self.dash_acceleration = 0.0;
        self.dash_remaining = 0.0;
        self.velocity = Vec2::ZERO;
        self.smooth_velocity = 0.0;
        self.is_dashing = false;
    }

    /// Post-resolve vertical handling: stop on floors and ceilings, keep
    /// accelerating down slopes that are too steep to stand on.
    pub fn after_move(&mut self, data: &CollisionData, delta: f32) {
        if data.is_colliding_above || data.is_colliding_below {
            if data.is_sliding_down_slope {
                self.velocity.y += data.slope_normal.y * -self.gravity * delta;
            } else {
                self.velocity.y = 0.0;
            }
        }
    }

    // ==================== REQUESTS ====================

    pub fn jump(&mut self, data: &CollisionData) -> Option<JumpKind> {
        if self.is_wall_sliding {
            let wall = self.attributes.wall;
            let input_x = self.input_direction.x;
            let (kind, impulse) = if input_x == self.wall_direction as f32 {
                (JumpKind::WallClimb, wall.jump_climb)
            } else if input_x == 0.0 {
                (JumpKind::WallOff, wall.jump_off)
            } else {
                (JumpKind::WallLeap, wall.jump_leap)
            };
            self.velocity.x = -(self.wall_direction as f32) * impulse.x;
            self.velocity.y = impulse.y;
            return Some(kind);
        }

        if !data.is_colliding_below {
            return None;
        }

        if data.is_sliding_down_slope {
            // Pushing into the slope does nothing.
            if self.input_direction.x == -sign(data.slope_normal.x) {
                return None;
            }
            self.velocity = data.slope_normal * self.max_jump_velocity;
            Some(JumpKind::SlopeSlide)
        } else {
            self.velocity.y = self.max_jump_velocity;
            Some(JumpKind::Normal)
        }
    }

    pub fn jump_early_release(&mut self) {
        if self.velocity.y > self.min_jump_velocity {
            self.velocity.y = self.min_jump_velocity;
        }
    }

    /// Start a dash in the input direction. Returns `true` if it started.
    pub fn dash(&mut self, data: &CollisionData) -> bool {
        if !self.can_dash || self.is_dashing || self.input_direction.x == 0.0 {
            return false;
        }
        let direction = if self.input_direction.x < 0.0 { -1 } else { 1 };
        let dash = self.attributes.dash;

        let (distance, time) = if data.is_colliding_below {
            self.has_air_dashed = false;
            (dash.ground_distance, dash.ground_time)
        } else if !self.has_air_dashed {
            self.has_air_dashed = true;
            (dash.air_distance, dash.air_time)
        } else {
            return false;
        };

        // Uniform acceleration from rest covering `distance` in `time`.
        let launch = required_velocity(Vec2::new(direction as f32, 0.0), distance, time);
        self.dash_direction = direction;
        self.dash_acceleration = if time > 0.0 { launch.x / time } else { 0.0 };
        self.dash_remaining = time;
        self.velocity.x = 0.0;
        self.smooth_velocity = 0.0;
        self.is_dashing = true;
        true
    }

    pub fn start_sprint(&mut self) {
        if self.can_sprint {
            self.is_sprinting = true;
        }
    }

    pub fn stop_sprint(&mut self) {
        self.is_sprinting = false;
    }

    /// Zero all motion. The caller moves the body to the checkpoint.
    pub fn reset(&mut self) {
        if self.is_dashing {
            self.end_dash();
        }
        self.velocity = Vec2::ZERO;
        self.smooth_velocity = 0.0;
    }

    /// Stop all control after game over.
    pub fn disable(&mut self) {
        self.reset();
        self.disabled = true;
        self.can_move = false;
        self.can_dash = false;
        self.can_sprint = false;
        self.is_sprinting = false;
    }
}
