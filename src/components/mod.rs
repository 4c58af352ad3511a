//! ECS components for entities.
//!
//! This module groups all component types that can be attached to entities in
//! the simulation: placement and collision, the controllers that own
//! velocities, combat and health, and trigger zones.
//!
//! Submodules overview:
//! - [`attack`] – multi-phase attacks, hitboxes and weapons
//! - [`boxcollider`] – axis-aligned rectangular collider
//! - [`collisionbody`] – raycast collision resolver shared by every controller
//! - [`collisionlayer`] – named collision layers and layer masks
//! - [`enemycontroller`] – patrol, chase, attack and return AI
//! - [`group`] – tag component for grouping entities by name
//! - [`health`] – health, hit flashes and player lives
//! - [`mapposition`] – world-space position (pivot) for an entity
//! - [`movingplatform`] – waypoint platforms that carry passengers
//! - [`persistent`] – marker for entities that survive level rebuilds
//! - [`physicsobject`] – gravity-only loose bodies
//! - [`playercontroller`] – player movement state machine
//! - [`signals`] – per-entity signals for animation and UI
//! - [`staticvelocity`] – timed velocity override (knockback, lunges)
//! - [`zone`] – trigger areas acting on the player

pub mod attack;
pub mod boxcollider;
pub mod collisionbody;
pub mod collisionlayer;
pub mod enemycontroller;
pub mod group;
pub mod health;
pub mod mapposition;
pub mod movingplatform;
pub mod persistent;
pub mod physicsobject;
pub mod playercontroller;
pub mod signals;
pub mod staticvelocity;
pub mod zone;
