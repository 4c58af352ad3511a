//! Health, hit flashes and player lives.
//!
//! [`Health::take_damage`] and [`Health::heal`] only change numbers and start
//! a [`HitFlash`]; the consequences (despawn, life loss, game over) are
//! decided by the damage observers in
//! [`events::health`](crate::events::health).

use bevy_ecs::prelude::Component;
use serde::Deserialize;

/// RGBA tint.
pub type Tint = [u8; 4];

fn default_damage_tint() -> Tint {
    [230, 41, 55, 255]
}

fn default_heal_tint() -> Tint {
    [0, 228, 48, 255]
}

fn default_flash_lifetime() -> f32 {
    0.1
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HitEffectAttributes {
    #[serde(default = "default_damage_tint")]
    pub damage_tint: Tint,
    #[serde(default = "default_heal_tint")]
    pub heal_tint: Tint,
    /// Seconds the tint stays on.
    #[serde(default = "default_flash_lifetime")]
    pub lifetime: f32,
}

impl Default for HitEffectAttributes {
    fn default() -> Self {
        Self {
            damage_tint: default_damage_tint(),
            heal_tint: default_heal_tint(),
            lifetime: default_flash_lifetime(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitFlash {
    pub tint: Tint,
    pub remaining: f32,
}

/// What a damage call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Ignored,
    Damaged,
    Died,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Health {
    pub max: f32,
    pub current: f32,
    pub can_take_damage: bool,
    pub hit_effect: HitEffectAttributes,
    pub flash: Option<HitFlash>,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            max,
            current: max,
            can_take_damage: true,
            hit_effect: HitEffectAttributes::default(),
            flash: None,
        }
    }

    pub fn with_hit_effect(mut self, hit_effect: HitEffectAttributes) -> Self {
        self.hit_effect = hit_effect;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Fraction of health left, for health bars.
    pub fn ratio(&self) -> f32 {
        if self.max <= 0.0 {
            return 0.0;
        }
        (self.current / self.max).clamp(0.0, 1.0)
    }

    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.can_take_damage {
            return DamageOutcome::Ignored;
        }
        self.current -= amount;
        self.start_flash(self.hit_effect.damage_tint);
        if self.is_alive() {
            DamageOutcome::Damaged
        } else {
            DamageOutcome::Died
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.max);
        self.start_flash(self.hit_effect.heal_tint);
    }

    /// Flash the damage tint without touching the health value. Players
    /// lose lives instead of health.
    pub fn flash_damage(&mut self) {
        self.start_flash(self.hit_effect.damage_tint);
    }

    fn start_flash(&mut self, tint: Tint) {
        self.flash = Some(HitFlash {
            tint,
            remaining: self.hit_effect.lifetime,
        });
    }

    /// Current tint, if a flash is running.
    pub fn tint(&self) -> Option<Tint> {
        self.flash.map(|flash| flash.tint)
    }

    pub fn tick_flash(&mut self, delta: f32) {
        if let Some(flash) = self.flash.as_mut() {
            flash.remaining -= delta;
            if flash.remaining <= 0.0 {
                self.flash = None;
            }
        }
    }
}

/// Remaining lives of the player.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lives {
    pub max: i32,
    pub current: i32,
}

impl Lives {
    pub fn new(max: i32) -> Self {
        Self { max, current: max }
    }

    /// Lose one life. Returns `true` once the count drops below zero.
    pub fn lose_life(&mut self) -> bool {
        self.current -= 1;
        self.current < 0
    }
}
