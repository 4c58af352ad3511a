//! Event types and observers.
//!
//! Submodules:
//! - [`audio`] – sound and music requests, sent as messages
//! - [`gamestate`] – state transition notifications for the high-level game flow
//! - [`health`] – damage and healing, including player life loss
//! - [`level`] – requests to load, advance or reload levels
//! - [`player`] – player reset to checkpoint and game over
pub mod audio;
pub mod gamestate;
pub mod health;
pub mod level;
pub mod player;
