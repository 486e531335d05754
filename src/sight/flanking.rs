//! Flanking detection for the damage bonus
//!
//! An attacker gains a bonus when teammates stand adjacent to the defender.
//! Tiers are exclusive: one ally grants the single bonus, two or more the
//! pack bonus, never both.

use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, TeamId};
use crate::grid::{HexBattleGrid, HexPosition};

/// One hex adjacent to a defender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlankSlot {
    pub position: HexPosition,
    pub occupant: Option<CombatantId>,
}

/// Flanking damage tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlankTier {
    #[default]
    None,
    /// Exactly one ally adjacent to the defender
    Single,
    /// Two or more allies adjacent to the defender
    Pack,
}

impl FlankTier {
    pub fn from_ally_count(count: usize) -> Self {
        match count {
            0 => FlankTier::None,
            1 => FlankTier::Single,
            _ => FlankTier::Pack,
        }
    }

    /// Damage multiplier for this tier given the configured bonuses
    pub fn multiplier(&self, single_bonus: f32, pack_bonus: f32) -> f32 {
        match self {
            FlankTier::None => 1.0,
            FlankTier::Single => 1.0 + single_bonus,
            FlankTier::Pack => 1.0 + pack_bonus,
        }
    }
}

/// The in-bounds hexes adjacent to a defender, with occupancy
pub fn flanking_positions(grid: &HexBattleGrid, target: HexPosition) -> Vec<FlankSlot> {
    target
        .neighbors()
        .into_iter()
        .filter(|pos| grid.in_bounds(*pos))
        .map(|position| FlankSlot {
            position,
            occupant: grid.occupant_at(position),
        })
        .collect()
}

/// Count the attacker's teammates adjacent to the defender
///
/// The attacker itself never counts toward its own flank, and neither does
/// the defender's team.
pub fn adjacent_allies(
    grid: &HexBattleGrid,
    defender_pos: HexPosition,
    attacker: CombatantId,
    attacker_team: TeamId,
    team_of: impl Fn(CombatantId) -> Option<TeamId>,
) -> usize {
    flanking_positions(grid, defender_pos)
        .into_iter()
        .filter_map(|slot| slot.occupant)
        .filter(|id| *id != attacker)
        .filter(|id| team_of(*id) == Some(attacker_team))
        .count()
}

/// Flank tier for an attack against a defender at `defender_pos`
pub fn flank_tier(
    grid: &HexBattleGrid,
    defender_pos: HexPosition,
    attacker: CombatantId,
    attacker_team: TeamId,
    team_of: impl Fn(CombatantId) -> Option<TeamId>,
) -> FlankTier {
    FlankTier::from_ally_count(adjacent_allies(
        grid,
        defender_pos,
        attacker,
        attacker_team,
        team_of,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn id(n: u128) -> CombatantId {
        CombatantId(Uuid::from_u128(n))
    }

    fn team(n: u128) -> TeamId {
        TeamId(Uuid::from_u128(n))
    }

    /// Attacker 1 and allies 2, 3 on team A; defender 9 on team B
    fn team_lookup(cid: CombatantId) -> Option<TeamId> {
        match cid {
            c if c == id(1) || c == id(2) || c == id(3) => Some(team(1)),
            c if c == id(9) => Some(team(2)),
            _ => None,
        }
    }

    #[test]
    fn test_flanking_positions_clipped_to_bounds() {
        let grid = HexBattleGrid::new(6);
        let rim = flanking_positions(&grid, HexPosition::new(6, 0));
        assert!(rim.len() < 6);
        let center = flanking_positions(&grid, HexPosition::new(0, 0));
        assert_eq!(center.len(), 6);
    }

    #[test]
    fn test_no_allies_no_tier() {
        let grid = HexBattleGrid::new(6)
            .place(id(9), HexPosition::new(0, 0))
            .unwrap()
            .place(id(1), HexPosition::new(1, 0))
            .unwrap();
        let tier = flank_tier(&grid, HexPosition::new(0, 0), id(1), team(1), team_lookup);
        assert_eq!(tier, FlankTier::None);
    }

    #[test]
    fn test_single_ally_single_tier() {
        let grid = HexBattleGrid::new(6)
            .place(id(9), HexPosition::new(0, 0))
            .unwrap()
            .place(id(1), HexPosition::new(1, 0))
            .unwrap()
            .place(id(2), HexPosition::new(-1, 0))
            .unwrap();
        let tier = flank_tier(&grid, HexPosition::new(0, 0), id(1), team(1), team_lookup);
        assert_eq!(tier, FlankTier::Single);
    }

    #[test]
    fn test_two_allies_pack_tier() {
        let grid = HexBattleGrid::new(6)
            .place(id(9), HexPosition::new(0, 0))
            .unwrap()
            .place(id(1), HexPosition::new(1, 0))
            .unwrap()
            .place(id(2), HexPosition::new(-1, 0))
            .unwrap()
            .place(id(3), HexPosition::new(0, -1))
            .unwrap();
        let tier = flank_tier(&grid, HexPosition::new(0, 0), id(1), team(1), team_lookup);
        assert_eq!(tier, FlankTier::Pack);
    }

    #[test]
    fn test_tiers_exclusive() {
        // The pack multiplier replaces the single multiplier outright
        let single = FlankTier::Single.multiplier(0.2, 0.4);
        let pack = FlankTier::Pack.multiplier(0.2, 0.4);
        assert!((single - 1.2).abs() < f32::EPSILON);
        assert!((pack - 1.4).abs() < f32::EPSILON);
    }

    #[test]
    fn test_attacker_not_own_flanker() {
        // Attacker adjacent to the defender does not count as its own ally
        let grid = HexBattleGrid::new(6)
            .place(id(9), HexPosition::new(0, 0))
            .unwrap()
            .place(id(1), HexPosition::new(1, 0))
            .unwrap();
        let allies = adjacent_allies(&grid, HexPosition::new(0, 0), id(1), team(1), team_lookup);
        assert_eq!(allies, 0);
    }
}
