//! Planned actions submitted by the coaching side
//!
//! A planned action is a request, never a command: it passes the legality
//! check, the adherence gate, and only then the action economy.

use serde::{Deserialize, Serialize};

use crate::core::config::{AP_COST_ATTACK, AP_COST_DEFEND, AP_COST_MOVE_PER_HEX};
use crate::core::types::CombatantId;
use crate::grid::HexPosition;

/// How hard an attack swings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttackStyle {
    /// Fast and cheap, low power
    Jab,
    #[default]
    Strike,
    /// Slow haymaker, high power
    Heavy,
}

impl AttackStyle {
    pub fn ap_cost(&self) -> u8 {
        match self {
            AttackStyle::Jab => 1,
            AttackStyle::Strike => AP_COST_ATTACK,
            AttackStyle::Heavy => 3,
        }
    }

    /// Multiplier applied to the attacker's attack stat
    pub fn power(&self) -> f32 {
        match self {
            AttackStyle::Jab => 0.6,
            AttackStyle::Strike => 1.0,
            AttackStyle::Heavy => 1.4,
        }
    }
}

/// An action planned for a combatant by its coach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlannedAction {
    Move {
        to: HexPosition,
    },
    Attack {
        target: CombatantId,
        style: AttackStyle,
    },
    MoveAndAttack {
        to: HexPosition,
        target: CombatantId,
        style: AttackStyle,
    },
    Defend,
    Special {
        ability: String,
        target: CombatantId,
    },
}

impl PlannedAction {
    /// Short tag for logs and event payloads
    pub fn tag(&self) -> &'static str {
        match self {
            PlannedAction::Move { .. } => "move",
            PlannedAction::Attack { .. } => "attack",
            PlannedAction::MoveAndAttack { .. } => "move_and_attack",
            PlannedAction::Defend => "defend",
            PlannedAction::Special { .. } => "special",
        }
    }

    /// AP this plan costs before per-hex movement is known
    ///
    /// Movement distance is resolved against the grid; this covers the
    /// fixed part (attack style, defend, ability base).
    pub fn fixed_ap_cost(&self) -> u8 {
        match self {
            PlannedAction::Move { .. } => 0,
            PlannedAction::Attack { style, .. } => style.ap_cost(),
            PlannedAction::MoveAndAttack { style, .. } => style.ap_cost(),
            PlannedAction::Defend => AP_COST_DEFEND,
            PlannedAction::Special { .. } => 0, // looked up from the ability table
        }
    }

    /// Total AP cost once the movement distance is known
    pub fn ap_cost_with_distance(&self, hexes: u32) -> u8 {
        self.fixed_ap_cost() + hexes as u8 * AP_COST_MOVE_PER_HEX
    }
}
