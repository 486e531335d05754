//! Per-round action point accounting
//!
//! The AP budget is a fixed per-round constant, independent of stats.
//! Spending returns a new state value; remaining AP never goes negative.

use serde::{Deserialize, Serialize};

use crate::core::config::{AP_COST_ATTACK, AP_COST_MOVE_PER_HEX, AP_PER_ROUND};
use crate::core::error::{EngineError, Result};

/// Action point state for one combatant in the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPointState {
    pub max: u8,
    pub remaining: u8,
}

impl ActionPointState {
    pub fn new() -> Self {
        Self {
            max: AP_PER_ROUND,
            remaining: AP_PER_ROUND,
        }
    }

    /// Reset to the full budget; called exactly once per round per living
    /// combatant.
    pub fn reset(&self) -> Self {
        Self {
            max: self.max,
            remaining: self.max,
        }
    }

    /// Spend AP, returning the updated state and the amount consumed
    pub fn spend(&self, cost: u8) -> Result<(Self, u8)> {
        if cost > self.remaining {
            return Err(EngineError::InsufficientAp {
                needed: cost,
                available: self.remaining,
            });
        }
        let next = Self {
            max: self.max,
            remaining: self.remaining - cost,
        };
        Ok((next, cost))
    }

    pub fn can_afford(&self, cost: u8) -> bool {
        cost <= self.remaining
    }

    /// Enough AP left to move at least one hex
    pub fn can_move(&self) -> bool {
        self.remaining >= AP_COST_MOVE_PER_HEX
    }

    /// Enough AP left for a standard attack
    pub fn can_attack(&self) -> bool {
        self.remaining >= AP_COST_ATTACK
    }
}

impl Default for ActionPointState {
    fn default() -> Self {
        Self::new()
    }
}
