//! Camera rig resource.
//!
//! The simulation only tracks where the camera looks. [`CameraRig`] holds
//! that point and one of three behaviours:
//!
//! - **fixed**: stays where it was placed
//! - **follow**: keeps the player inside a focus area, leading the view in
//!   the direction the focus area moves
//! - **navigator**: pans through scripted waypoints, waiting before each pan

use bevy_ecs::prelude::Resource;
use glam::Vec2;
use serde::Deserialize;

use crate::math::{sign, smooth_damp};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FollowCameraAttributes {
    pub focus_size: Vec2,
    pub vertical_offset: f32,
    pub look_ahead_distance: f32,
    pub horizontal_smooth_time: f32,
    pub vertical_smooth_time: f32,
}

impl Default for FollowCameraAttributes {
    fn default() -> Self {
        Self {
            focus_size: Vec2::new(3.0, 5.0),
            vertical_offset: 1.0,
            look_ahead_distance: 4.0,
            horizontal_smooth_time: 0.5,
            vertical_smooth_time: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NavigatorCameraAttributes {
    pub waypoints: Vec<Vec2>,
    #[serde(default)]
    pub wait_time: f32,
    pub pan_time: f32,
}

/// Camera description in a level file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CameraSettings {
    Fixed { position: Vec2 },
    Follow(FollowCameraAttributes),
    Navigator(NavigatorCameraAttributes),
}

/// Box that only moves when the target pushes against its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusArea {
    left: f32,
    right: f32,
    top: f32,
    bottom: f32,
    pub center: Vec2,
    /// Shift applied by the last update.
    pub velocity: Vec2,
}

impl FocusArea {
    /// Centre the area horizontally on the target, resting on its bottom.
    pub fn new(target_min: Vec2, target_max: Vec2, size: Vec2) -> Self {
        let center_x = (target_min.x + target_max.x) * 0.5;
        let left = center_x - size.x * 0.5;
        let right = center_x + size.x * 0.5;
        let bottom = target_min.y;
        let top = target_min.y + size.y;
        Self {
            left,
            right,
            top,
            bottom,
            center: Vec2::new((left + right) * 0.5, (top + bottom) * 0.5),
            velocity: Vec2::ZERO,
        }
    }

    pub fn update(&mut self, target_min: Vec2, target_max: Vec2) {
        let shift_x = if target_min.x < self.left {
            target_min.x - self.left
        } else if target_max.x > self.right {
            target_max.x - self.right
        } else {
            0.0
        };
        self.left += shift_x;
        self.right += shift_x;

        let shift_y = if target_min.y < self.bottom {
            target_min.y - self.bottom
        } else if target_max.y > self.top {
            target_max.y - self.top
        } else {
            0.0
        };
        self.top += shift_y;
        self.bottom += shift_y;

        self.center = Vec2::new((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5);
        self.velocity = Vec2::new(shift_x, shift_y);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FollowCamera {
    pub attributes: FollowCameraAttributes,
    focus: Option<FocusArea>,
    current_look_ahead: f32,
    target_look_ahead: f32,
    horizontal_smooth_velocity: f32,
    vertical_smooth_velocity: f32,
    look_ahead_stopped: bool,
}

impl FollowCamera {
    pub fn new(attributes: FollowCameraAttributes) -> Self {
        Self {
            attributes,
            focus: None,
            current_look_ahead: 0.0,
            target_look_ahead: 0.0,
            horizontal_smooth_velocity: 0.0,
            vertical_smooth_velocity: 0.0,
            look_ahead_stopped: false,
        }
    }

    pub fn focus_area(&self) -> Option<&FocusArea> {
        self.focus.as_ref()
    }

    /// New camera position for a target with bounds `(min, max)` whose
    /// input direction is `input_x`.
    pub fn update(&mut self, camera: Vec2, target_min: Vec2, target_max: Vec2, input_x: f32, delta: f32) -> Vec2 {
        let attributes = self.attributes;
        let focus = self
            .focus
            .get_or_insert_with(|| FocusArea::new(target_min, target_max, attributes.focus_size));
        focus.update(target_min, target_max);

        let mut focus_position = focus.center + Vec2::Y * attributes.vertical_offset;

        if focus.velocity.x != 0.0 {
            let direction = sign(focus.velocity.x);
            if input_x == direction && input_x != 0.0 {
                self.target_look_ahead = direction * attributes.look_ahead_distance;
                self.look_ahead_stopped = false;
            } else if !self.look_ahead_stopped {
                self.look_ahead_stopped = true;
                self.target_look_ahead = self.current_look_ahead
                    + (direction * attributes.look_ahead_distance - self.current_look_ahead) / 4.0;
            }
        }

        self.current_look_ahead = smooth_damp(
            self.current_look_ahead,
            self.target_look_ahead,
            &mut self.horizontal_smooth_velocity,
            attributes.horizontal_smooth_time,
            delta,
        );

        focus_position.y = smooth_damp(
            camera.y,
            focus_position.y,
            &mut self.vertical_smooth_velocity,
            attributes.vertical_smooth_time,
            delta,
        );
        focus_position.x += self.current_look_ahead;
        focus_position
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorCamera {
    pub attributes: NavigatorCameraAttributes,
    index: usize,
    previous: Vec2,
    current: Vec2,
    wait_remaining: f32,
    progress: f32,
    reached_end: bool,
}

impl NavigatorCamera {
    pub fn new(attributes: NavigatorCameraAttributes) -> Self {
        let first = attributes.waypoints.first().copied().unwrap_or(Vec2::ZERO);
        let second = attributes.waypoints.get(1).copied();
        Self {
            index: 1,
            previous: first,
            current: second.unwrap_or(first),
            wait_remaining: attributes.wait_time,
            progress: 0.0,
            reached_end: second.is_none(),
            attributes,
        }
    }

    pub fn start(&self) -> Vec2 {
        self.previous
    }

    pub fn has_reached_end(&self) -> bool {
        self.reached_end
    }

    /// Advance the pan. Returns the new position, or `None` while waiting
    /// or after the last waypoint.
    pub fn update(&mut self, delta: f32) -> Option<Vec2> {
        if self.reached_end {
            return None;
        }
        if self.wait_remaining > 0.0 {
            self.wait_remaining -= delta;
            return None;
        }

        self.progress = if self.attributes.pan_time > 0.0 {
            (self.progress + delta / self.attributes.pan_time).min(1.0)
        } else {
            1.0
        };
        let position = self.previous.lerp(self.current, self.progress);

        if self.progress >= 1.0 {
            self.move_to_next_point();
        }
        Some(position)
    }

    fn move_to_next_point(&mut self) {
        if self.index + 1 < self.attributes.waypoints.len() {
            self.index += 1;
            self.previous = self.current;
            self.current = self.attributes.waypoints[self.index];
            self.progress = 0.0;
            self.wait_remaining = self.attributes.wait_time;
        } else {
            self.reached_end = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CameraMode {
    Fixed,
    Follow(FollowCamera),
    Navigator(NavigatorCamera),
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub position: Vec2,
    pub mode: CameraMode,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            mode: CameraMode::Fixed,
        }
    }
}

impl CameraRig {
    /// Build the rig for a level. Without settings the camera follows the
    /// player with default attributes.
    pub fn from_settings(settings: Option<&CameraSettings>, start: Vec2) -> Self {
        match settings {
            Some(CameraSettings::Fixed { position }) => Self {
                position: *position,
                mode: CameraMode::Fixed,
            },
            Some(CameraSettings::Follow(attributes)) => Self {
                position: start,
                mode: CameraMode::Follow(FollowCamera::new(*attributes)),
            },
            Some(CameraSettings::Navigator(attributes)) => {
                let navigator = NavigatorCamera::new(attributes.clone());
                Self {
                    position: navigator.start(),
                    mode: CameraMode::Navigator(navigator),
                }
            }
            None => Self {
                position: start,
                mode: CameraMode::Follow(FollowCamera::new(FollowCameraAttributes::default())),
            },
        }
    }

    pub fn navigator_finished(&self) -> bool {
        matches!(&self.mode, CameraMode::Navigator(navigator) if navigator.has_reached_end())
    }
}
