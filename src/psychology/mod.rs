//! Adherence psychology - does the combatant follow the plan?
//!
//! This layer only classifies: it never touches the grid or health. The
//! judge and the action economy apply whatever it decides.

pub mod adherence;
pub mod deviation;

pub use adherence::{evaluate, passes_gate, AdherenceOutcome};
pub use deviation::{
    DeviationContext, DeviationKind, DeviationPolicy, DeviationScript, StandardDeviationPolicy,
};
