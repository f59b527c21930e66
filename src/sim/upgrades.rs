//! Upgrade levels and the read-only snapshot the simulation consumes
//!
//! The upgrade screen owns an [`UpgradeLevels`] map. The simulation never
//! reads it directly; a level load (or leaving the upgrade screen) turns it
//! into an [`UpgradeSnapshot`] that stays fixed for the whole level.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Chance gained per piercing level
const PIERCE_CHANCE_PER_LEVEL: f32 = 0.10;
/// Critical chance: 10% at level 1, +10% per further level
const CRIT_CHANCE_PER_LEVEL: f32 = 0.10;
/// Explosion radius growth per level beyond the first
const EXPLOSION_GROWTH_PER_LEVEL: f32 = 0.5;
/// Fraction of ball acceleration removed per slowdown level
const SLOWDOWN_PER_LEVEL: f32 = 0.20;
/// Extra bat width per level (pixels)
const BAT_WIDTH_PER_LEVEL: f32 = 20.0;

/// Purchasable upgrades
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKey {
    Piercing,
    Critical,
    Explosion,
    BatShooter,
    HealthBonus,
    BallSlowdown,
    BallDamage,
    BatWidth,
}

/// Key → level mapping owned by the upgrade screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpgradeLevels(BTreeMap<UpgradeKey, u32>);

impl UpgradeLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of an upgrade (0 when never bought)
    pub fn level(&self, key: UpgradeKey) -> u32 {
        self.0.get(&key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: UpgradeKey, level: u32) {
        if level == 0 {
            self.0.remove(&key);
        } else {
            self.0.insert(key, level);
        }
    }

    pub fn with(mut self, key: UpgradeKey, level: u32) -> Self {
        self.set(key, level);
        self
    }

    /// Freeze the current levels into gameplay values
    pub fn snapshot(&self) -> UpgradeSnapshot {
        UpgradeSnapshot::from_levels(self)
    }
}

/// Gameplay values derived from upgrade levels, fixed for a level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradeSnapshot {
    /// Per-contact probability that the ball pierces a brick
    pub pierce_chance: f32,
    /// Per-hit probability that damage is doubled
    pub crit_chance: f32,
    /// Explosion radius multiplier; zero means the upgrade is not owned
    pub explosion_multiplier: f32,
    /// Bat shot damage; zero means the shooter is locked
    pub shooter_damage: i32,
    pub health_bonus: i32,
    /// Multiplier on the ball's speed-up rate
    pub acceleration_scale: f32,
    pub ball_damage_bonus: i32,
    pub bat_width_bonus: f32,
}

/// No upgrades owned
impl Default for UpgradeSnapshot {
    fn default() -> Self {
        UpgradeLevels::new().snapshot()
    }
}

impl UpgradeSnapshot {
    pub fn from_levels(levels: &UpgradeLevels) -> Self {
        let level = |key| levels.level(key);
        let as_i32 = |key| i32::try_from(level(key)).unwrap_or(i32::MAX);

        let explosion = level(UpgradeKey::Explosion);
        let explosion_multiplier = if explosion == 0 {
            0.0
        } else {
            1.0 + EXPLOSION_GROWTH_PER_LEVEL * (explosion - 1) as f32
        };

        Self {
            pierce_chance: (PIERCE_CHANCE_PER_LEVEL * level(UpgradeKey::Piercing) as f32).min(1.0),
            crit_chance: (CRIT_CHANCE_PER_LEVEL * level(UpgradeKey::Critical) as f32).min(1.0),
            explosion_multiplier,
            shooter_damage: as_i32(UpgradeKey::BatShooter),
            health_bonus: as_i32(UpgradeKey::HealthBonus),
            acceleration_scale: (1.0 - SLOWDOWN_PER_LEVEL * level(UpgradeKey::BallSlowdown) as f32)
                .max(0.0),
            ball_damage_bonus: as_i32(UpgradeKey::BallDamage),
            bat_width_bonus: BAT_WIDTH_PER_LEVEL * level(UpgradeKey::BatWidth) as f32,
        }
    }

    pub fn explosion_active(&self) -> bool {
        self.explosion_multiplier > 0.0
    }

    pub fn shooter_unlocked(&self) -> bool {
        self.shooter_damage > 0
    }
}
