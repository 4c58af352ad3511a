//! Timed velocity override.
//!
//! Knockback and attack lunges push a controller with a fixed velocity for a
//! short time. While a [`StaticVelocity`] is active the owning controller
//! moves by `velocity * delta` through its collision body and ignores its own
//! steering.

use bevy_ecs::prelude::Component;
use glam::Vec2;

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct StaticVelocity {
    pub velocity: Vec2,
    pub remaining: f32,
}

impl StaticVelocity {
    /// Start a new override, replacing any running one.
    pub fn set(&mut self, velocity: Vec2, lifetime: f32) {
        self.velocity = velocity;
        self.remaining = lifetime.max(0.0);
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn clear(&mut self) {
        self.velocity = Vec2::ZERO;
        self.remaining = 0.0;
    }

    /// Consume `delta` seconds and return the displacement for this frame.
    ///
    /// Returns `None` when no override is running.
    pub fn step(&mut self, delta: f32) -> Option<Vec2> {
        if !self.is_active() {
            return None;
        }
        let used = delta.min(self.remaining);
        self.remaining -= used;
        let displacement = self.velocity * used;
        if self.remaining <= 0.0 {
            self.clear();
        }
        Some(displacement)
    }
}
