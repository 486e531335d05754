//! Ruling data model
//!
//! A ruling names what happens, not how to bypass the rules: every effect
//! is applied through the same validation as an ordinary action.

use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, Round};
use crate::psychology::DeviationKind;

/// Broad classification of a ruling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RulingTag {
    DamageOverride,
    ForcedRetreat,
    Bonus,
    Penalty,
    TurnForfeited,
}

/// The numeric consequence of a ruling
///
/// Applied by the orchestrator via the action economy: strikes run the
/// damage formula, retreats route through reachable hexes, direct damage
/// is clamped to the ruling cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameplayEffect {
    /// The deviant attacks `target` with the ordinary damage formula,
    /// scaled by `power`
    Strike { target: CombatantId, power: f32 },
    /// Flat damage imposed by the judge (backfire, contempt penalty)
    DirectDamage { target: CombatantId, amount: i32 },
    /// The deviant is moved away from the fight, up to `hexes` steps
    Retreat { hexes: u8 },
    /// Turn is forfeit; nothing else happens
    Forfeit,
}

impl GameplayEffect {
    /// Clamp numeric fields to the configured bounds
    pub fn clamped(self, damage_cap: i32, ap_cap: u8) -> Self {
        match self {
            GameplayEffect::Strike { target, power } => GameplayEffect::Strike {
                target,
                power: power.clamp(0.1, 2.0),
            },
            GameplayEffect::DirectDamage { target, amount } => GameplayEffect::DirectDamage {
                target,
                amount: amount.clamp(1, damage_cap),
            },
            GameplayEffect::Retreat { hexes } => GameplayEffect::Retreat {
                hexes: hexes.clamp(1, ap_cap),
            },
            GameplayEffect::Forfeit => GameplayEffect::Forfeit,
        }
    }
}

/// Facts handed to the ruling provider
///
/// Only the current battle's state: judges have no access to anything
/// outside the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeSituation {
    pub round: Round,
    pub deviant: CombatantId,
    pub deviant_name: String,
    pub kind: DeviationKind,
    pub declaration: String,
    /// Tag of the action the coach ordered
    pub coach_ordered: String,
    pub deviant_health_percent: u8,
    pub nearest_enemy: Option<CombatantId>,
    pub nearest_ally: Option<CombatantId>,
    /// Nearest combatant of any team, for berserk targeting
    pub nearest_any: Option<CombatantId>,
}

/// The arbitration outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeRuling {
    /// Which judge ruled
    pub judge: String,
    /// The situation as the judge saw it
    pub situation: String,
    pub tag: RulingTag,
    pub effect: GameplayEffect,
    pub narrative: String,
    pub benefited: Option<CombatantId>,
    pub penalized: Option<CombatantId>,
}
