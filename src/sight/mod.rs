//! Line of sight and positional-advantage queries

pub mod flanking;
pub mod los;

pub use flanking::{adjacent_allies, flank_tier, flanking_positions, FlankSlot, FlankTier};
pub use los::{has_line_of_sight, trace_path, visible_combatants, VisibleCombatant};
