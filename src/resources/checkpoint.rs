//! Ordered respawn points.
//!
//! The player respawns at the current checkpoint. Reaching the next one
//! (within `min_distance`) promotes it. The last checkpoint latches.

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use log::info;

pub const DEFAULT_MIN_DISTANCE: f32 = 1.0;

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CheckpointManager {
    checkpoints: Vec<Vec2>,
    current_index: usize,
    next_index: usize,
    at_last: bool,
    pub min_distance: f32,
}

impl Default for CheckpointManager {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CheckpointManager {
    pub fn new(checkpoints: Vec<Vec2>) -> Self {
        let at_last = checkpoints.len() < 2;
        Self {
            next_index: if at_last { 0 } else { 1 },
            checkpoints,
            current_index: 0,
            at_last,
            min_distance: DEFAULT_MIN_DISTANCE,
        }
    }

    pub fn with_min_distance(mut self, min_distance: f32) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Respawn point, or `None` without checkpoints.
    pub fn current(&self) -> Option<Vec2> {
        self.checkpoints.get(self.current_index).copied()
    }

    pub fn next(&self) -> Option<Vec2> {
        self.checkpoints.get(self.next_index).copied()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn is_at_last(&self) -> bool {
        self.at_last
    }

    /// Advance when `target` is close to the next checkpoint. Returns
    /// `true` if the current checkpoint changed.
    pub fn update(&mut self, target: Vec2) -> bool {
        if self.at_last {
            return false;
        }
        let Some(next) = self.next() else {
            return false;
        };
        if target.distance(next) < self.min_distance {
            self.move_to_next();
            info!("Checkpoint {} reached", self.current_index);
            return true;
        }
        false
    }

    fn move_to_next(&mut self) {
        let last = self.checkpoints.len() - 1;
        self.current_index += 1;
        if self.current_index < last {
            self.next_index = (self.next_index + 1).min(last);
        } else {
            self.current_index = last;
            self.next_index = last;
            self.at_last = true;
        }
    }
}
