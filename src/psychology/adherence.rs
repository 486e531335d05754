//! The adherence gate
//!
//! A d100 roll against the combatant's adherence trait decides whether the
//! coach's plan is executed faithfully. Classification is a pure function
//! of (trait, roll); the roll itself comes from the battle's seeded RNG at
//! the call site.

use serde::{Deserialize, Serialize};

use crate::battle::actions::PlannedAction;
use crate::battle::combatant::CombatantState;
use crate::psychology::deviation::{DeviationContext, DeviationPolicy, DeviationScript};

/// Outcome of the adherence gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AdherenceOutcome {
    Followed(PlannedAction),
    Deviated(DeviationScript),
}

impl AdherenceOutcome {
    pub fn is_followed(&self) -> bool {
        matches!(self, AdherenceOutcome::Followed(_))
    }
}

/// Does a roll pass the gate for a given trait?
///
/// Roll is uniform in [0, 100); the plan is followed iff the roll lands
/// strictly below the trait. Trait 0 always deviates, trait 100 always
/// follows.
pub fn passes_gate(adherence_trait: u8, roll: u8) -> bool {
    roll < adherence_trait
}

/// Evaluate a planned action against the combatant's psychology
///
/// Never mutates grid or health; deviations are described, not applied.
pub fn evaluate(
    combatant: &CombatantState,
    planned: &PlannedAction,
    context: &DeviationContext,
    policy: &dyn DeviationPolicy,
    roll: u8,
) -> AdherenceOutcome {
    if passes_gate(combatant.adherence, roll) {
        AdherenceOutcome::Followed(planned.clone())
    } else {
        AdherenceOutcome::Deviated(policy.choose(combatant, planned, context, roll))
    }
}
