use bevy_ecs::prelude::Component;
use glam::Vec2;

use crate::components::collisionbody::CollisionData;

/// Loose body that only falls: crates, barrels, debris.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PhysicsObject {
    pub gravity: f32,
    pub velocity: Vec2,
}

impl PhysicsObject {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            velocity: Vec2::ZERO,
        }
    }

    pub fn apply_gravity(&mut self, delta: f32) {
        self.velocity.y += self.gravity * delta;
    }

    pub fn after_move(&mut self, data: &CollisionData, delta: f32) {
        if data.is_colliding_above || data.is_colliding_below {
            if data.is_sliding_down_slope {
                self.velocity.y += data.slope_normal.y * -self.gravity * delta;
            } else {
                self.velocity.y = 0.0;
            }
        }
    }
}
