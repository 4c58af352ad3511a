//! Per-frame player input resource.
//!
//! [`InputState`] holds the movement axes and the state of every gameplay
//! button for the current frame. It is filled either by an [`InputScript`]
//! (headless runs and tests) or by the keyboard when the viewer is enabled.
//! Gameplay systems only ever read [`InputState`].
use bevy_ecs::prelude::*;
use glam::Vec2;
use log::info;
use serde::Deserialize;

/// Gameplay buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Jump,
    Dash,
    Attack,
    Sprint,
    SelectWeapon1,
    SelectWeapon2,
    SelectWeapon3,
    SelectWeapon4,
    Reset,
    NextLevel,
    RestartLevel,
}

impl Button {
    pub const COUNT: usize = 11;

    pub const ALL: [Button; Button::COUNT] = [
        Button::Jump,
        Button::Dash,
        Button::Attack,
        Button::Sprint,
        Button::SelectWeapon1,
        Button::SelectWeapon2,
        Button::SelectWeapon3,
        Button::SelectWeapon4,
        Button::Reset,
        Button::NextLevel,
        Button::RestartLevel,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Weapon slot selected by this button, if any.
    pub fn weapon_slot(self) -> Option<usize> {
        match self {
            Button::SelectWeapon1 => Some(0),
            Button::SelectWeapon2 => Some(1),
            Button::SelectWeapon3 => Some(2),
            Button::SelectWeapon4 => Some(3),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Boolean button state.
pub struct ButtonState {
    /// Whether the button is currently held.
    pub active: bool,
    /// Whether the button was pressed this frame.
    pub just_pressed: bool,
    /// Whether the button was released this frame.
    pub just_released: bool,
}

impl ButtonState {
    /// Feed the raw held state for a new frame.
    pub fn update(&mut self, down: bool) {
        self.just_pressed = down && !self.active;
        self.just_released = !down && self.active;
        self.active = down;
    }
}

/// Resource capturing the per-frame input relevant to gameplay.
#[derive(Resource, Debug, Clone)]
pub struct InputState {
    /// Smoothed analog axes in [-1, 1].
    pub axis: Vec2,
    /// Unsmoothed axes in [-1, 1].
    pub raw_axis: Vec2,
    /// Per-axis dead zones applied by [`InputState::direction`].
    pub deadzone: Vec2,
    buttons: [ButtonState; Button::COUNT],
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            axis: Vec2::ZERO,
            raw_axis: Vec2::ZERO,
            deadzone: Vec2::new(0.25, 0.5),
            buttons: [ButtonState::default(); Button::COUNT],
        }
    }
}

impl InputState {
    pub fn with_deadzone(mut self, x: f32, y: f32) -> Self {
        self.deadzone = Vec2::new(x, y);
        self
    }

    /// Sign of each raw axis that is past its dead zone, else 0.
    pub fn direction(&self) -> Vec2 {
        let axis_direction = |value: f32, deadzone: f32| {
            if value != 0.0 && value.abs() > deadzone {
                value.signum()
            } else {
                0.0
            }
        };
        Vec2::new(
            axis_direction(self.raw_axis.x, self.deadzone.x),
            axis_direction(self.raw_axis.y, self.deadzone.y),
        )
    }

    pub fn button(&self, button: Button) -> ButtonState {
        self.buttons[button.index()]
    }

    pub fn just_pressed(&self, button: Button) -> bool {
        self.button(button).just_pressed
    }

    pub fn just_released(&self, button: Button) -> bool {
        self.button(button).just_released
    }

    pub fn held(&self, button: Button) -> bool {
        self.button(button).active
    }

    /// Start a new frame from raw axes and the set of held buttons.
    pub fn update(&mut self, axis: Vec2, raw_axis: Vec2, held: &[Button]) {
        self.axis = axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
        self.raw_axis = raw_axis.clamp(Vec2::NEG_ONE, Vec2::ONE);
        for button in Button::ALL {
            self.buttons[button.index()].update(held.contains(&button));
        }
    }
}

/// One stretch of constant input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputSegment {
    pub frames: u32,
    #[serde(default)]
    pub axis: Vec2,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

/// Recorded input replayed frame by frame.
///
/// ```json
/// [
///   { "frames": 30, "axis": [1.0, 0.0] },
///   { "frames": 1, "axis": [1.0, 0.0], "buttons": ["jump"] }
/// ]
/// ```
#[derive(Resource, Debug, Clone, Default)]
pub struct InputScript {
    segments: Vec<InputSegment>,
    segment: usize,
    frame: u32,
}

impl InputScript {
    pub fn new(segments: Vec<InputSegment>) -> Self {
        Self {
            segments,
            segment: 0,
            frame: 0,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let segments: Vec<InputSegment> =
            serde_json::from_str(text).map_err(|e| format!("Failed to parse input script: {}", e))?;
        Ok(Self::new(segments))
    }

    pub fn load_from_file(path: &str) -> Result<Self, String> {
        let text =
            std::fs::read_to_string(path).map_err(|e| format!("Failed to read input script '{}': {}", path, e))?;
        let script = Self::from_json(&text)?;
        info!("Loaded input script '{}' ({} frames)", path, script.total_frames());
        Ok(script)
    }

    pub fn total_frames(&self) -> u64 {
        self.segments.iter().map(|segment| segment.frames as u64).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.segment >= self.segments.len()
    }

    /// Input for the next frame. Once the script is exhausted every frame
    /// is idle.
    pub fn next_frame(&mut self) -> (Vec2, &[Button]) {
        while let Some(segment) = self.segments.get(self.segment) {
            if self.frame < segment.frames {
                break;
            }
            self.segment += 1;
            self.frame = 0;
        }
        match self.segments.get(self.segment) {
            Some(segment) => {
                self.frame += 1;
                (segment.axis, segment.buttons.as_slice())
            }
            None => (Vec2::ZERO, &[][..]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_edges() {
        let mut state = ButtonState::default();
        state.update(true);
        assert!(state.just_pressed && state.active);
        state.update(true);
        assert!(!state.just_pressed && state.active);
        state.update(false);
        assert!(state.just_released && !state.active);
        state.update(false);
        assert!(!state.just_released);
    }

    #[test]
    fn direction_respects_deadzones() {
        let mut input = InputState::default().with_deadzone(0.25, 0.5);
        input.update(Vec2::ZERO, Vec2::new(0.3, -0.4), &[]);
        assert_eq!(input.direction(), Vec2::new(1.0, 0.0));
        input.update(Vec2::ZERO, Vec2::new(-0.2, -0.9), &[]);
        assert_eq!(input.direction(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn held_buttons_update_all_states() {
        let mut input = InputState::default();
        input.update(Vec2::ZERO, Vec2::ZERO, &[Button::Jump, Button::Sprint]);
        assert!(input.just_pressed(Button::Jump));
        assert!(input.held(Button::Sprint));
        assert!(!input.held(Button::Dash));
        input.update(Vec2::ZERO, Vec2::ZERO, &[Button::Sprint]);
        assert!(input.just_released(Button::Jump));
    }

    #[test]
    fn script_plays_segments_in_order() {
        let mut script = InputScript::from_json(
            r#"[
                { "frames": 2, "axis": [1.0, 0.0] },
                { "frames": 0, "buttons": ["dash"] },
                { "frames": 1, "buttons": ["jump", "select_weapon2"] }
            ]"#,
        )
        .unwrap();
        assert_eq!(script.total_frames(), 3);
        assert_eq!(script.next_frame().0, Vec2::X);
        assert_eq!(script.next_frame().0, Vec2::X);
        let (axis, buttons) = script.next_frame();
        assert_eq!(axis, Vec2::ZERO);
        assert_eq!(buttons, &[Button::Jump, Button::SelectWeapon2]);
        assert_eq!(script.next_frame(), (Vec2::ZERO, &[][..]));
        assert!(script.is_finished());
    }

    #[test]
    fn unknown_button_is_rejected() {
        assert!(InputScript::from_json(r#"[{ "frames": 1, "buttons": ["fly"] }]"#).is_err());
    }

    #[test]
    fn weapon_slots() {
        assert_eq!(Button::SelectWeapon3.weapon_slot(), Some(2));
        assert_eq!(Button::Jump.weapon_slot(), None);
    }
}
