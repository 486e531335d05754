//! Damage resolution
//!
//! `base = attack × style power − defense`, plus a bounded variance draw,
//! then critical and flanking multipliers. The result is always a positive
//! integer clamped to the configured cap. Defending targets take half,
//! rounded up.

use serde::{Deserialize, Serialize};

use crate::battle::rng::BattleRng;
use crate::core::config::BattleConfig;
use crate::sight::FlankTier;

/// Fully resolved damage with its contributing factors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageBreakdown {
    pub base: i32,
    pub variance: i32,
    pub critical: bool,
    pub flank: FlankTier,
    pub defended: bool,
    /// Final damage after multipliers and clamps; always >= 1
    pub total: i32,
}

/// Resolve one attack's damage
///
/// `attack_power` is the attacker's attack stat already scaled by the
/// attack style or ability power.
pub fn resolve_damage(
    attack_power: f32,
    defense: i32,
    defender_defending: bool,
    flank: FlankTier,
    rng: &mut BattleRng,
    config: &BattleConfig,
) -> DamageBreakdown {
    let base = attack_power.floor() as i32 - defense;
    let variance = rng.damage_variance(config.damage_variance_max);
    let critical = rng.crit_check(config.crit_chance);

    let mut raw = (base + variance) as f32;
    if critical {
        raw *= config.crit_multiplier;
    }
    raw *= flank.multiplier(config.flank_single_bonus, config.flank_pack_bonus);

    let mut total = raw.floor() as i32;
    if defender_defending {
        total = (total + 1) / 2;
    }
    total = total.clamp(1, config.max_damage);

    DamageBreakdown {
        base,
        variance,
        critical,
        flank,
        defended: defender_defending,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_crit_config() -> BattleConfig {
        let mut config = BattleConfig::default();
        config.crit_chance = 0;
        config
    }

    #[test]
    fn test_damage_at_least_one() {
        let mut config = no_crit_config();
        config.damage_variance_max = 0;
        let mut rng = BattleRng::from_seed(1);
        // Hopelessly outmatched attacker still chips for 1
        let dmg = resolve_damage(10.0, 90, false, FlankTier::None, &mut rng, &config);
        assert_eq!(dmg.total, 1);
    }

    #[test]
    fn test_damage_within_bounds() {
        let config = BattleConfig::default();
        let mut rng = BattleRng::from_seed(3);
        for _ in 0..200 {
            let dmg = resolve_damage(50.0, 25, false, FlankTier::Pack, &mut rng, &config);
            assert!(dmg.total >= 1);
            assert!(dmg.total <= config.max_damage);
        }
    }

    #[test]
    fn test_reference_duel_damage_range() {
        // attack 50 vs defense 25, no flank: damage in 25..=45 (+crit off)
        let config = no_crit_config();
        let mut rng = BattleRng::from_seed(9);
        for _ in 0..100 {
            let dmg = resolve_damage(50.0, 25, false, FlankTier::None, &mut rng, &config);
            assert!((25..=45).contains(&dmg.total), "damage {} out of range", dmg.total);
        }
    }

    #[test]
    fn test_flank_tiers_scale_damage() {
        let mut config = no_crit_config();
        config.damage_variance_max = 0;
        // Binary-exact bonuses so the floor is deterministic
        config.flank_single_bonus = 0.5;
        config.flank_pack_bonus = 1.0;
        let mut rng = BattleRng::from_seed(5);
        let none = resolve_damage(50.0, 20, false, FlankTier::None, &mut rng, &config);
        let single = resolve_damage(50.0, 20, false, FlankTier::Single, &mut rng, &config);
        let pack = resolve_damage(50.0, 20, false, FlankTier::Pack, &mut rng, &config);
        assert_eq!(none.total, 30);
        assert_eq!(single.total, 45); // the single-ally bonus
        assert_eq!(pack.total, 60); // the pack bonus replaces it, never stacks
    }

    #[test]
    fn test_defending_halves_rounded_up() {
        let mut config = no_crit_config();
        config.damage_variance_max = 0;
        let mut rng = BattleRng::from_seed(5);
        let open = resolve_damage(45.0, 20, false, FlankTier::None, &mut rng, &config);
        let braced = resolve_damage(45.0, 20, true, FlankTier::None, &mut rng, &config);
        assert_eq!(open.total, 25);
        assert_eq!(braced.total, 13);
    }

    #[test]
    fn test_crit_multiplies() {
        let mut config = BattleConfig::default();
        config.damage_variance_max = 0;
        config.crit_chance = 100;
        let mut rng = BattleRng::from_seed(5);
        let dmg = resolve_damage(50.0, 20, false, FlankTier::None, &mut rng, &config);
        assert!(dmg.critical);
        assert_eq!(dmg.total, 45); // 30 × 1.5
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let config = BattleConfig::default();
        let mut a = BattleRng::from_seed(11);
        let mut b = BattleRng::from_seed(11);
        let da = resolve_damage(40.0, 25, false, FlankTier::Single, &mut a, &config);
        let db = resolve_damage(40.0, 25, false, FlankTier::Single, &mut b, &config);
        assert_eq!(da, db);
    }
}
