//! ECS resources made available to systems.
//!
//! Overview
//! - `audio` – log of requested music and sound effects
//! - `camera` – camera rig: fixed, follow with look-ahead, or waypoint navigator
//! - `checkpoint` – ordered respawn points
//! - `collisionworld` – static geometry and mirrored dynamic colliders, ray and box queries
//! - `gameconfig` – INI-backed simulation and viewer settings
//! - `gamestate` – authoritative and pending high-level game state
//! - `group` – group names whose population is counted
//! - `input` – per-frame axes and buttons, plus scripted input playback
//! - `level` – level files and the level sequence
//! - `systemsstore` – registry of state hook systems by name
//! - `worldsignals` – run-level signals shared between systems
//! - `worldtime` – simulation time and delta
pub mod audio;
pub mod camera;
pub mod checkpoint;
pub mod collisionworld;
pub mod gameconfig;
pub mod gamestate;
pub mod group;
pub mod input;
pub mod level;
pub mod systemsstore;
pub mod worldsignals;
pub mod worldtime;
