//! Battle core - combatants, events, the orchestrator, and its session
//!
//! The orchestrator is the single writer; all mutation flows through the
//! event fold so that any snapshot can be rebuilt from the log alone.

pub mod actions;
pub mod combatant;
pub mod events;
pub mod orchestrator;
pub mod rng;
pub mod session;
pub mod snapshot;
pub mod store;

// Re-exports for convenient access
pub use actions::{AttackStyle, PlannedAction};
pub use combatant::{CombatantState, CoreStats, Team};
pub use events::{BattleEvent, GridDelta, HealthDelta, RejectionReason, ResolvedAction};
pub use orchestrator::{Battle, BattleResult};
pub use rng::BattleRng;
pub use session::{BattleSession, BattleSessionHandle};
pub use snapshot::{
    apply_event, replay, verify_replay, BattlePhase, BattleSetup, BattleSnapshot,
};
pub use store::{EventStore, JsonlStore, MemoryStore};
