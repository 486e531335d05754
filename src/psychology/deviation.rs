//! Deviation kinds and the substitute-behavior policy
//!
//! When the adherence gate fails, a policy decides what the combatant does
//! instead. The policy is a seam: product intent on substitute selection is
//! still settling, so the engine only fixes the contract — deterministic
//! output for a fixed (combatant, plan, context, roll).

use serde::{Deserialize, Serialize};

use crate::battle::actions::PlannedAction;
use crate::battle::combatant::CombatantState;
use crate::core::types::CombatantId;

/// The recognized ways a combatant goes off-script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviationKind {
    /// Attacks the nearest enemy instead of the ordered target
    MinorInsubordination,
    /// Discards the plan and attacks the biggest visible threat
    StrategyOverride,
    /// Refuses to fight this turn
    PacifistStand,
    /// Attacks the nearest combatant regardless of team
    BerserkerRage,
    /// Turns on the nearest teammate
    FriendlyFire,
    /// Runs from the fight
    PanickedFlight,
}

impl DeviationKind {
    /// Rough ranking used by judges when weighing a ruling
    pub fn severity(&self) -> u8 {
        match self {
            DeviationKind::MinorInsubordination => 1,
            DeviationKind::PacifistStand => 1,
            DeviationKind::StrategyOverride => 2,
            DeviationKind::PanickedFlight => 2,
            DeviationKind::BerserkerRage => 3,
            DeviationKind::FriendlyFire => 3,
        }
    }
}

/// A chosen substitute behavior with its in-character declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationScript {
    pub kind: DeviationKind,
    pub declaration: String,
}

/// Battle facts the policy may consult
#[derive(Debug, Clone, PartialEq)]
pub struct DeviationContext {
    pub health_fraction: f32,
    pub teammates_down: usize,
    pub enemies_adjacent: usize,
    pub nearest_enemy: Option<CombatantId>,
    pub nearest_ally: Option<CombatantId>,
}

/// Substitute-behavior selection
///
/// Implementations must be deterministic: the failed adherence roll is the
/// only entropy they get.
pub trait DeviationPolicy: Send + Sync {
    fn choose(
        &self,
        combatant: &CombatantState,
        planned: &PlannedAction,
        context: &DeviationContext,
        roll: u8,
    ) -> DeviationScript;
}

/// The stock policy
///
/// Desperation first (low health, decimated team), then a roll-keyed pick
/// from the ordinary insubordination set.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDeviationPolicy;

impl DeviationPolicy for StandardDeviationPolicy {
    fn choose(
        &self,
        combatant: &CombatantState,
        planned: &PlannedAction,
        context: &DeviationContext,
        roll: u8,
    ) -> DeviationScript {
        let kind = if context.health_fraction < 0.25 {
            if roll % 2 == 0 {
                DeviationKind::PanickedFlight
            } else {
                DeviationKind::PacifistStand
            }
        } else if context.teammates_down >= 2 {
            DeviationKind::BerserkerRage
        } else {
            match roll % 4 {
                0 => DeviationKind::MinorInsubordination,
                1 => DeviationKind::StrategyOverride,
                2 => DeviationKind::PacifistStand,
                _ if context.nearest_ally.is_some() => DeviationKind::FriendlyFire,
                _ => DeviationKind::MinorInsubordination,
            }
        };

        DeviationScript {
            kind,
            declaration: declaration_for(kind, combatant, planned),
        }
    }
}

fn declaration_for(
    kind: DeviationKind,
    combatant: &CombatantState,
    planned: &PlannedAction,
) -> String {
    match kind {
        DeviationKind::MinorInsubordination => format!(
            "{} shrugs off the {} order and picks their own target",
            combatant.name,
            planned.tag()
        ),
        DeviationKind::StrategyOverride => format!(
            "{} tears up the gameplan: \"I know better than the coach!\"",
            combatant.name
        ),
        DeviationKind::PacifistStand => {
            format!("{} plants their feet and refuses to fight", combatant.name)
        }
        DeviationKind::BerserkerRage => {
            format!("{} sees red and swings at whoever is closest", combatant.name)
        }
        DeviationKind::FriendlyFire => format!(
            "{} wheels around on their own teammate mid-fight",
            combatant.name
        ),
        DeviationKind::PanickedFlight => {
            format!("{} breaks and runs for the water's edge", combatant.name)
        }
    }
}
