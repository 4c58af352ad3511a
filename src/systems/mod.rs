//! Simulation systems.
//!
//! This module groups all ECS systems that advance the simulation, plus the
//! optional raylib viewer.
//!
//! Submodules overview
//! - [`attack`] – attack phases, lunges and hitbox overlaps
//! - [`audio`] – drain audio requests into the audio log
//! - [`camera`] – move the camera rig; restart and next-level buttons
//! - [`checkpoint`] – promote checkpoints as the player reaches them
//! - [`collisionworld`] – mirror entity colliders into the collision world
//! - [`enemy`] – enemy search, chase, patrol and line of sight
//! - [`gamestate`] – check for pending state transitions and trigger events
//! - [`group`] – publish tracked group populations
//! - [`health`] – hit flashes, health and lives signals
//! - [`input`] – fill [`crate::resources::input::InputState`] and dispatch it to the player
//! - [`level`] – build and tear down levels
//! - [`movingplatform`] – move platforms and carry their passengers
//! - [`physicsobject`] – gravity for loose objects
//! - [`player`] – player velocity and collision resolution
//! - [`render`] – draw the world using raylib (`viewer` feature)
//! - [`signals`] – clear per-frame triggers
//! - [`time`] – update simulation time and delta
//! - [`zone`] – zone entry effects

pub mod attack;
pub mod audio;
pub mod camera;
pub mod checkpoint;
pub mod collisionworld;
pub mod enemy;
pub mod gamestate;
pub mod group;
pub mod health;
pub mod input;
pub mod level;
pub mod movingplatform;
pub mod physicsobject;
pub mod player;
#[cfg(feature = "viewer")]
pub mod render;
pub mod signals;
pub mod time;
pub mod zone;
