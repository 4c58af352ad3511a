//! Game configuration resource.
//!
//! Manages simulation settings loaded from an INI configuration file.
//! Provides defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [simulation]
//! fixed_dt = 0.016666
//! time_scale = 1.0
//! frames = 600
//!
//! [input]
//! deadzone_x = 0.25
//! deadzone_y = 0.5
//!
//! [window]
//! width = 1280
//! height = 720
//! pixels_per_unit = 32
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

/// Default safe values for startup
const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;
const DEFAULT_TIME_SCALE: f32 = 1.0;
const DEFAULT_FRAMES: u64 = 600;
const DEFAULT_DEADZONE_X: f32 = 0.25;
const DEFAULT_DEADZONE_Y: f32 = 0.5;
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_PIXELS_PER_UNIT: f32 = 32.0;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Game configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Seconds simulated per frame.
    pub fixed_dt: f32,
    pub time_scale: f32,
    /// Frames to run headless when no limit is given on the command line.
    pub frames: u64,
    pub deadzone_x: f32,
    pub deadzone_y: f32,
    /// Viewer window width in pixels.
    pub window_width: u32,
    /// Viewer window height in pixels.
    pub window_height: u32,
    /// Viewer zoom.
    pub pixels_per_unit: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            fixed_dt: DEFAULT_FIXED_DT,
            time_scale: DEFAULT_TIME_SCALE,
            frames: DEFAULT_FRAMES,
            deadzone_x: DEFAULT_DEADZONE_X,
            deadzone_y: DEFAULT_DEADZONE_Y,
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            pixels_per_unit: DEFAULT_PIXELS_PER_UNIT,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);

        info!(
            "Loaded config: dt={}, time_scale={}, frames={}, deadzone=({}, {}), {}x{} window",
            self.fixed_dt,
            self.time_scale,
            self.frames,
            self.deadzone_x,
            self.deadzone_y,
            self.window_width,
            self.window_height
        );

        Ok(())
    }

    /// Load configuration from INI text.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        let float = |section: &str, key: &str| config.getfloat(section, key).ok().flatten();

        // [simulation] section
        if let Some(dt) = float("simulation", "fixed_dt").filter(|dt| *dt > 0.0) {
            self.fixed_dt = dt as f32;
        }
        if let Some(scale) = float("simulation", "time_scale").filter(|scale| *scale >= 0.0) {
            self.time_scale = scale as f32;
        }
        if let Some(frames) = config.getuint("simulation", "frames").ok().flatten() {
            self.frames = frames;
        }

        // [input] section
        if let Some(deadzone) = float("input", "deadzone_x") {
            self.deadzone_x = deadzone as f32;
        }
        if let Some(deadzone) = float("input", "deadzone_y") {
            self.deadzone_y = deadzone as f32;
        }

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(ppu) = float("window", "pixels_per_unit").filter(|ppu| *ppu > 0.0) {
            self.pixels_per_unit = ppu as f32;
        }
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [simulation] section
        config.set("simulation", "fixed_dt", Some(self.fixed_dt.to_string()));
        config.set("simulation", "time_scale", Some(self.time_scale.to_string()));
        config.set("simulation", "frames", Some(self.frames.to_string()));

        // [input] section
        config.set("input", "deadzone_x", Some(self.deadzone_x.to_string()));
        config.set("input", "deadzone_y", Some(self.deadzone_y.to_string()));

        // [window] section
        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "pixels_per_unit", Some(self.pixels_per_unit.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[simulation]\nfixed_dt = 0.02\n\n[input]\ndeadzone_x = 0.1\n")
            .unwrap();
        assert_eq!(config.fixed_dt, 0.02);
        assert_eq!(config.deadzone_x, 0.1);
        assert_eq!(config.deadzone_y, DEFAULT_DEADZONE_Y);
        assert_eq!(config.frames, DEFAULT_FRAMES);
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut config = GameConfig::new();
        config
            .load_from_str("[simulation]\nfixed_dt = -1\nframes = lots\n")
            .unwrap();
        assert_eq!(config.fixed_dt, DEFAULT_FIXED_DT);
        assert_eq!(config.frames, DEFAULT_FRAMES);
    }

    #[test]
    fn save_then_load_file() {
        let path = std::env::temp_dir().join(format!("drage_config_{}.ini", std::process::id()));
        let mut saved = GameConfig::with_path(&path);
        saved.frames = 42;
        saved.pixels_per_unit = 16.0;
        saved.save_to_file().unwrap();

        let mut loaded = GameConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.frames, 42);
        assert_eq!(loaded.pixels_per_unit, 16.0);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut config = GameConfig::with_path("/definitely/not/here.ini");
        assert!(config.load_from_file().is_err());
    }
}
