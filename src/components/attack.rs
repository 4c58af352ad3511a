//! Timed, multi-phase attacks.
//!
//! An [`Attack`] is an ordered list of [`AttackPhase`]s. Each phase has its
//! own hitbox, damage, knockback, lifetime and an optional lunge. The
//! [`AttackController`] plays one attack at a time:
//!
//! 1. [`request_attack`](AttackController::request_attack) starts the first
//!    attack of the active list when idle and not cooling down
//! 2. [`tick`](AttackController::tick) advances the phase timer and moves to
//!    the next phase, clearing the hit list, or ends the attack
//! 3. while active, the attack systems overlap the world hitbox with
//!    attackable colliders; every target is hit at most once per phase
//!
//! Knockback x, hitbox offset x and lunge x are mirrored by the direction the
//! attack was started in.
//!
//! Players carry several [`Weapon`]s. Switching slot swaps the attack list
//! used by the next request.

use bevy_ecs::prelude::{Component, Entity};
use glam::Vec2;
use log::debug;
use serde::Deserialize;
use smallvec::SmallVec;

use crate::components::collisionlayer::LayerMask;

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct AttackMovement {
    #[serde(default)]
    pub velocity: Vec2,
    #[serde(default)]
    pub lifetime: f32,
    /// Delay before the lunge starts.
    #[serde(default)]
    pub start_wait: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AttackHitbox {
    pub size: Vec2,
    #[serde(default)]
    pub offset: Vec2,
}

impl Default for AttackHitbox {
    fn default() -> Self {
        Self {
            size: Vec2::ONE,
            offset: Vec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct AttackDamage {
    #[serde(default)]
    pub damage: f32,
    #[serde(default)]
    pub knockback_time: f32,
    #[serde(default)]
    pub knockback: Vec2,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttackPhase {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub movement: AttackMovement,
    #[serde(default)]
    pub hitbox: AttackHitbox,
    pub lifetime: f32,
    #[serde(default)]
    pub cooldown: f32,
    #[serde(default, flatten)]
    pub damage: AttackDamage,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attack {
    pub name: String,
    pub phases: Vec<AttackPhase>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub attacks: Vec<Attack>,
    /// Name of the animation set the renderer should switch to.
    #[serde(default)]
    pub animation_set: String,
}

/// Returned when a phase begins.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseStart {
    pub attack_name: String,
    pub phase_name: String,
    pub phase_index: usize,
}

/// Result of advancing the controller by one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum AttackTick {
    Idle,
    Running,
    NextPhase(PhaseStart),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingLunge {
    velocity: Vec2,
    lifetime: f32,
    wait: f32,
}

#[derive(Component, Debug, Clone)]
pub struct AttackController {
    pub attacks: Vec<Attack>,
    pub attackable_mask: LayerMask,
    weapons: Vec<Weapon>,
    current_weapon: Option<usize>,
    current_attack: Option<Attack>,
    phase_index: usize,
    direction: i32,
    phase_time: f32,
    phase_end: f32,
    cooldown_time: f32,
    cooldown_end: f32,
    is_actively_attacking: bool,
    is_waiting_on_cooldown: bool,
    hitbox: AttackHitbox,
    damage: f32,
    knockback: Vec2,
    knockback_time: f32,
    pending_lunge: Option<PendingLunge>,
    hit_list: SmallVec<[Entity; 4]>,
}

impl AttackController {
    pub fn new(attacks: Vec<Attack>, attackable_mask: LayerMask) -> Self {
        Self {
            attacks,
            attackable_mask,
            weapons: Vec::new(),
            current_weapon: None,
            current_attack: None,
            phase_index: 0,
            direction: 1,
            phase_time: 0.0,
            phase_end: 0.0,
            cooldown_time: 0.0,
            cooldown_end: 0.0,
            is_actively_attacking: false,
            is_waiting_on_cooldown: false,
            hitbox: AttackHitbox::default(),
            damage: 0.0,
            knockback: Vec2::ZERO,
            knockback_time: 0.0,
            pending_lunge: None,
            hit_list: SmallVec::new(),
        }
    }

    /// Equip weapons and select the first one.
    pub fn with_weapons(mut self, weapons: Vec<Weapon>) -> Self {
        self.weapons = weapons;
        self.switch_weapon(0);
        self
    }

    pub fn is_actively_attacking(&self) -> bool {
        self.is_actively_attacking
    }

    pub fn is_waiting_on_cooldown(&self) -> bool {
        self.is_waiting_on_cooldown
    }

    pub fn current_weapon(&self) -> Option<&Weapon> {
        self.current_weapon.and_then(|slot| self.weapons.get(slot))
    }

    pub fn current_attack_name(&self) -> Option<&str> {
        self.current_attack.as_ref().map(|attack| attack.name.as_str())
    }

    /// Attack list used by the next request.
    pub fn active_attacks(&self) -> &[Attack] {
        match self.current_weapon() {
            Some(weapon) => &weapon.attacks,
            None => &self.attacks,
        }
    }

    /// Select weapon `slot`. Returns `true` when the weapon changed.
    pub fn switch_weapon(&mut self, slot: usize) -> bool {
        if self.current_weapon == Some(slot) || slot >= self.weapons.len() {
            return false;
        }
        self.current_weapon = Some(slot);
        debug!("Switched to weapon '{}'", self.weapons[slot].name);
        true
    }

    /// Start the first attack of the active list facing `direction`.
    pub fn request_attack(&mut self, direction: i32) -> Option<PhaseStart> {
        if self.is_actively_attacking || self.is_waiting_on_cooldown {
            return None;
        }
        let attack = self.active_attacks().first()?.clone();
        if attack.phases.is_empty() {
            return None;
        }
        self.direction = if direction < 0 { -1 } else { 1 };
        self.current_attack = Some(attack);
        self.phase_index = 0;
        self.is_actively_attacking = true;
        self.import_phase()
    }

    fn import_phase(&mut self) -> Option<PhaseStart> {
        let attack = self.current_attack.as_ref()?;
        let phase = attack.phases.get(self.phase_index)?;
        let dir = self.direction as f32;
        let mirror = Vec2::new(dir, 1.0);

        self.phase_time = 0.0;
        self.phase_end = phase.lifetime;
        if phase.cooldown > 0.0 {
            self.cooldown_time = 0.0;
            self.cooldown_end = phase.cooldown;
            self.is_waiting_on_cooldown = true;
        }

        self.damage = phase.damage.damage;
        self.knockback = phase.damage.knockback * mirror;
        self.knockback_time = phase.damage.knockback_time;

        self.hitbox = AttackHitbox {
            size: phase.hitbox.size,
            offset: phase.hitbox.offset * mirror,
        };

        let lunge = phase.movement.velocity * mirror;
        self.pending_lunge = (lunge != Vec2::ZERO).then_some(PendingLunge {
            velocity: lunge,
            lifetime: phase.movement.lifetime,
            wait: phase.movement.start_wait,
        });

        Some(PhaseStart {
            attack_name: attack.name.clone(),
            phase_name: phase.name.clone(),
            phase_index: self.phase_index,
        })
    }

    /// Advance phase and cooldown timers.
    pub fn tick(&mut self, delta: f32) -> AttackTick {
        let mut result = AttackTick::Idle;

        if self.is_actively_attacking {
            if self.phase_time < self.phase_end {
                self.phase_time += delta;
                result = AttackTick::Running;
            } else {
                result = self.move_to_next_phase();
            }
        }

        if self.is_waiting_on_cooldown {
            if self.cooldown_time > self.cooldown_end {
                self.is_waiting_on_cooldown = false;
            } else {
                self.cooldown_time += delta;
            }
        }

        result
    }

    fn move_to_next_phase(&mut self) -> AttackTick {
        let phase_count = self
            .current_attack
            .as_ref()
            .map_or(0, |attack| attack.phases.len());
        if self.phase_index + 1 < phase_count {
            self.phase_index += 1;
            self.hit_list.clear();
            match self.import_phase() {
                Some(start) => AttackTick::NextPhase(start),
                None => {
                    self.end_attack();
                    AttackTick::Ended
                }
            }
        } else {
            self.end_attack();
            AttackTick::Ended
        }
    }

    pub fn end_attack(&mut self) {
        self.is_actively_attacking = false;
        self.current_attack = None;
        self.hitbox = AttackHitbox::default();
        self.phase_end = 0.0;
        self.pending_lunge = None;
        self.hit_list.clear();
    }

    /// Count down the lunge delay and hand out the lunge once.
    ///
    /// Returns `(velocity, lifetime)` for a [`StaticVelocity`] on the owner.
    ///
    /// [`StaticVelocity`]: crate::components::staticvelocity::StaticVelocity
    pub fn poll_lunge(&mut self, delta: f32) -> Option<(Vec2, f32)> {
        let lunge = self.pending_lunge.as_mut()?;
        if lunge.wait > 0.0 {
            lunge.wait -= delta;
            return None;
        }
        let lunge = self.pending_lunge.take()?;
        Some((lunge.velocity, lunge.lifetime))
    }

    /// World-space hitbox (min, max) while attacking.
    pub fn hitbox_aabb(&self, position: Vec2) -> Option<(Vec2, Vec2)> {
        if !self.is_actively_attacking {
            return None;
        }
        let center = position + self.hitbox.offset;
        let half = self.hitbox.size.abs() * 0.5;
        Some((center - half, center + half))
    }

    /// Record a hit on `target`. Returns `false` if it was already hit in
    /// this phase.
    pub fn register_hit(&mut self, target: Entity) -> bool {
        if self.hit_list.contains(&target) {
            return false;
        }
        self.hit_list.push(target);
        true
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Knockback `(velocity, lifetime)` of the current phase, if any.
    pub fn knockback(&self) -> Option<(Vec2, f32)> {
        (self.knockback != Vec2::ZERO).then_some((self.knockback, self.knockback_time))
    }
}
