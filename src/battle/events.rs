//! Battle events - the append-only authoritative record
//!
//! Every resolved action becomes one immutable event. The snapshot is a
//! pure fold over these; nothing in an event requires re-running adherence
//! rolls or damage draws, so replay never consults the RNG.

use serde::{Deserialize, Serialize};

use crate::battle::actions::AttackStyle;
use crate::core::error::EngineError;
use crate::core::types::{CombatantId, Round, Seq};
use crate::economy::DamageBreakdown;
use crate::grid::HexPosition;
use crate::judge::JudgeRuling;
use crate::psychology::DeviationKind;

/// Why a planned action was rejected before adherence evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    OutOfBounds,
    OccupiedHex,
    InsufficientAp,
    NotReachable,
    NoLineOfSight,
    InvalidTarget,
}

impl RejectionReason {
    /// Map a recoverable engine error to its rejection tag
    pub fn from_error(error: &EngineError) -> Option<Self> {
        match error {
            EngineError::OutOfBounds { .. } => Some(Self::OutOfBounds),
            EngineError::OccupiedHex { .. } => Some(Self::OccupiedHex),
            EngineError::InsufficientAp { .. } => Some(Self::InsufficientAp),
            EngineError::NotReachable => Some(Self::NotReachable),
            EngineError::NoLineOfSight => Some(Self::NoLineOfSight),
            EngineError::InvalidTarget(_) => Some(Self::InvalidTarget),
            _ => None,
        }
    }
}

/// One combatant's position change
///
/// `to: None` records removal from the grid (defeat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDelta {
    pub combatant: CombatantId,
    pub from: Option<HexPosition>,
    pub to: Option<HexPosition>,
}

/// One combatant's health change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDelta {
    pub combatant: CombatantId,
    pub delta: i32,
    pub new_health: i32,
}

/// What actually happened when a turn resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResolvedAction {
    Moved {
        to: HexPosition,
    },
    Attacked {
        target: CombatantId,
        style: AttackStyle,
        damage: DamageBreakdown,
    },
    MovedAndAttacked {
        to: HexPosition,
        target: CombatantId,
        style: AttackStyle,
        damage: DamageBreakdown,
    },
    Defended,
    SpecialUsed {
        ability: String,
        target: CombatantId,
        damage: DamageBreakdown,
    },
    /// The combatant ignored its orders; the ruling payload carries the
    /// arbitration outcome and the deltas carry its applied effect.
    Deviated {
        kind: DeviationKind,
    },
    /// Illegal plan recorded as a no-op with its reason
    Rejected {
        reason: RejectionReason,
    },
}

impl ResolvedAction {
    pub fn tag(&self) -> &'static str {
        match self {
            ResolvedAction::Moved { .. } => "moved",
            ResolvedAction::Attacked { .. } => "attacked",
            ResolvedAction::MovedAndAttacked { .. } => "moved_and_attacked",
            ResolvedAction::Defended => "defended",
            ResolvedAction::SpecialUsed { .. } => "special_used",
            ResolvedAction::Deviated { .. } => "deviated",
            ResolvedAction::Rejected { .. } => "rejected",
        }
    }
}

/// One immutable, ordered record of a resolved action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleEvent {
    pub seq: Seq,
    pub round: Round,
    pub actor: CombatantId,
    pub action: ResolvedAction,
    pub ap_cost: u8,
    pub grid_deltas: Vec<GridDelta>,
    pub health_deltas: Vec<HealthDelta>,
    /// Present iff the action deviated and was arbitrated
    pub ruling: Option<JudgeRuling>,
    /// The perimeter bit back during this resolution
    pub hazard_triggered: bool,
}
