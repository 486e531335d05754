//! Battle configuration with documented constants
//!
//! All tunable values are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};

/// Action point budget per combatant per round.
///
/// Independent of character stats: stats affect damage and turn order,
/// never the AP budget.
pub const AP_PER_ROUND: u8 = 3;

/// AP cost to move one hex.
pub const AP_COST_MOVE_PER_HEX: u8 = 1;

/// AP cost of a standard attack.
pub const AP_COST_ATTACK: u8 = 2;

/// AP cost of the defend action (also the substituted safe default).
pub const AP_COST_DEFEND: u8 = 1;

/// A special ability registered with the battle
///
/// Resolved through the ordinary damage path with its own multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbilitySpec {
    pub id: String,
    pub name: String,
    /// AP cost, at least 1
    pub ap_cost: u8,
    /// Damage multiplier applied to the attacker's attack stat
    pub power: f32,
    /// Maximum range in hexes
    pub range: u32,
}

/// Configuration for a battle
///
/// These values have been tuned against the reference arena (radius 6,
/// 3v3 teams). Changing them affects pacing, not correctness: every
/// invariant holds for any validated configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    /// Radius of the hexagonal arena. Radius 6 gives the 12-across field
    /// the reference design uses.
    pub grid_radius: i32,

    /// Upper bound of the additive damage variance draw (inclusive).
    ///
    /// Damage is `attack - defense + variance` with variance in
    /// `0..=damage_variance_max`, floored at 1.
    pub damage_variance_max: i32,

    /// Critical hit chance in percent (roll below this on d100 crits).
    pub crit_chance: u8,

    /// Critical hit damage multiplier.
    pub crit_multiplier: f32,

    /// Flanking bonus with exactly one ally adjacent to the defender.
    pub flank_single_bonus: f32,

    /// Flanking bonus with two or more allies adjacent to the defender.
    /// Tiers are exclusive: the higher tier replaces the lower one.
    pub flank_pack_bonus: f32,

    /// Hard cap on damage from any single resolution. A sanity bound,
    /// not a balance knob: ordinary rolls stay far below it.
    pub max_damage: i32,

    /// Cap on the numeric effect a judge ruling may apply.
    pub ruling_damage_cap: i32,

    /// Damage taken when entering a perimeter water hex.
    pub hazard_damage: i32,

    /// Maximum attack range in hexes (line of sight still required).
    pub attack_range: u32,

    /// Vision range for visibility queries.
    pub vision_range: u32,

    /// Round cap: a battle still undecided after this many rounds ends
    /// as a draw rather than running forever.
    pub max_rounds: u32,

    /// Special abilities available in this battle.
    pub abilities: Vec<AbilitySpec>,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            grid_radius: 6,
            damage_variance_max: 20,
            crit_chance: 5,
            crit_multiplier: 1.5,
            flank_single_bonus: 0.2,
            flank_pack_bonus: 0.4,
            max_damage: 200,
            ruling_damage_cap: 50,
            hazard_damage: 8,
            attack_range: 3,
            vision_range: 8,
            max_rounds: 50,
            abilities: vec![
                AbilitySpec {
                    id: "power_strike".into(),
                    name: "Power Strike".into(),
                    ap_cost: 3,
                    power: 1.6,
                    range: 1,
                },
                AbilitySpec {
                    id: "piercing_shot".into(),
                    name: "Piercing Shot".into(),
                    ap_cost: 2,
                    power: 0.9,
                    range: 5,
                },
            ],
        }
    }
}

impl BattleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an ability by id.
    pub fn ability(&self, id: &str) -> Option<&AbilitySpec> {
        self.abilities.iter().find(|a| a.id == id)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.grid_radius < 2 {
            return Err(EngineError::ConfigError(
                "grid_radius must be at least 2".into(),
            ));
        }
        if self.damage_variance_max < 0 {
            return Err(EngineError::ConfigError(
                "damage_variance_max must be non-negative".into(),
            ));
        }
        if self.crit_chance > 100 {
            return Err(EngineError::ConfigError(
                "crit_chance is a percentage (0-100)".into(),
            ));
        }
        if self.flank_pack_bonus < self.flank_single_bonus {
            return Err(EngineError::ConfigError(format!(
                "flank_pack_bonus ({}) should be >= flank_single_bonus ({})",
                self.flank_pack_bonus, self.flank_single_bonus
            )));
        }
        if self.max_damage < 1 || self.ruling_damage_cap < 1 {
            return Err(EngineError::ConfigError(
                "damage caps must be positive".into(),
            ));
        }
        if self.ruling_damage_cap > self.max_damage {
            return Err(EngineError::ConfigError(
                "ruling_damage_cap cannot exceed max_damage".into(),
            ));
        }
        if self.max_rounds == 0 {
            return Err(EngineError::ConfigError("max_rounds must be positive".into()));
        }
        for ability in &self.abilities {
            if ability.ap_cost == 0 || ability.ap_cost > AP_PER_ROUND {
                return Err(EngineError::ConfigError(format!(
                    "ability '{}' ap_cost must be in 1..={}",
                    ability.id, AP_PER_ROUND
                )));
            }
            if ability.power <= 0.0 {
                return Err(EngineError::ConfigError(format!(
                    "ability '{}' power must be positive",
                    ability.id
                )));
            }
        }
        Ok(())
    }
}
