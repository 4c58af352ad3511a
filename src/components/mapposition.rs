//! World-space position of an entity.
//!
//! The position is the pivot of the entity and the center of its
//! [`BoxCollider`](super::boxcollider::BoxCollider) before offset.

use bevy_ecs::prelude::Component;
use glam::Vec2;

#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct MapPosition {
    pub pos: Vec2,
}

impl MapPosition {
    pub fn new(x: f32, y: f32) -> Self {
        Self { pos: Vec2::new(x, y) }
    }

    pub fn from_vec(pos: Vec2) -> Self {
        Self { pos }
    }

    /// Move the position by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        self.pos += delta;
    }
}
