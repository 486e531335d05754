//! Battle snapshot and event-sourced reconstruction
//!
//! The snapshot is a pure fold over the event log: the live path produces
//! an event and applies it through the same `apply_event` the replay uses,
//! so a reconstructed battle is structurally identical to the live one.
//! Replay never touches the RNG - events record resolved outcomes.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::battle::combatant::{CombatantState, Team};
use crate::battle::events::{BattleEvent, ResolvedAction};
use crate::core::config::BattleConfig;
use crate::core::error::{EngineError, Result};
use crate::core::types::{BattleId, CombatantId, Round, Seq, TeamId};
use crate::economy::ActionPointState;
use crate::grid::{HexBattleGrid, HexPosition};

/// Battle lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattlePhase {
    #[default]
    Active,
    Finished,
}

/// Everything needed to start (or re-derive) a battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSetup {
    pub battle_id: BattleId,
    pub config: BattleConfig,
    pub teams: [Team; 2],
    pub placements: Vec<(CombatantId, HexPosition)>,
    pub seed: u64,
}

impl BattleSetup {
    /// Create a setup with standard arena deployment rows
    pub fn new(config: BattleConfig, team_a: Team, team_b: Team, seed: u64) -> Result<Self> {
        config.validate()?;
        if team_a.combatants.is_empty() || team_b.combatants.is_empty() {
            return Err(EngineError::ConfigError("teams must not be empty".into()));
        }

        let grid = HexBattleGrid::standard_arena(config.grid_radius);
        let row_a = grid.deployment_row_a(team_a.combatants.len());
        let row_b = grid.deployment_row_b(team_b.combatants.len());

        let mut placements = Vec::new();
        for (combatant, pos) in team_a.combatants.iter().zip(row_a) {
            placements.push((combatant.id, pos));
        }
        for (combatant, pos) in team_b.combatants.iter().zip(row_b) {
            placements.push((combatant.id, pos));
        }

        Ok(Self {
            battle_id: BattleId::new(),
            config,
            teams: [team_a, team_b],
            placements,
            seed,
        })
    }

    /// Seed the initial snapshot: occupancy placed once, full AP, round 0
    pub fn initial_snapshot(&self) -> Result<BattleSnapshot> {
        let mut grid = HexBattleGrid::standard_arena(self.config.grid_radius);
        for (id, pos) in &self.placements {
            grid = grid.place(*id, *pos)?;
        }

        let mut ap = AHashMap::new();
        for team in &self.teams {
            for combatant in &team.combatants {
                ap.insert(combatant.id, ActionPointState::new());
            }
        }

        Ok(BattleSnapshot {
            round: 0,
            phase: BattlePhase::Active,
            winner: None,
            grid,
            teams: self.teams.clone(),
            ap,
            turn_order: Vec::new(),
            turn_index: 0,
            last_seq: None,
        })
    }
}

/// The derived state of a battle at a point in its log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub round: Round,
    pub phase: BattlePhase,
    pub winner: Option<TeamId>,
    pub grid: HexBattleGrid,
    pub teams: [Team; 2],
    pub ap: AHashMap<CombatantId, ActionPointState>,
    /// This round's turn order (living combatants, descending speed, ties
    /// to the lower id) and the pointer into it
    pub turn_order: Vec<CombatantId>,
    pub turn_index: usize,
    pub last_seq: Option<Seq>,
}

impl BattleSnapshot {
    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, BattlePhase::Finished)
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantState> {
        self.teams.iter().find_map(|t| t.get(id))
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> Option<&mut CombatantState> {
        self.teams.iter_mut().find_map(|t| t.get_mut(id))
    }

    pub fn team_of(&self, id: CombatantId) -> Option<TeamId> {
        self.combatant(id).map(|c| c.team)
    }

    /// Living combatants across both teams
    pub fn living(&self) -> impl Iterator<Item = &CombatantState> {
        self.teams.iter().flat_map(|t| t.living())
    }

    /// The combatant whose turn it is, if a round is in progress
    pub fn next_actor(&self) -> Option<CombatantId> {
        if self.is_terminal() || self.round == 0 {
            return None;
        }
        self.turn_order.get(self.turn_index).copied()
    }

    /// Start a new round: AP reset and defending cleared for every living
    /// combatant, exactly once; turn order recomputed from the living.
    pub(crate) fn round_reset(&mut self, new_round: Round) {
        self.round = new_round;
        let living: Vec<CombatantId> = self.living().map(|c| c.id).collect();
        for id in &living {
            if let Some(ap) = self.ap.get(id) {
                let reset = ap.reset();
                self.ap.insert(*id, reset);
            }
            if let Some(c) = self.combatant_mut(*id) {
                c.defending = false;
            }
        }

        let mut order: Vec<(i32, CombatantId)> = self
            .living()
            .map(|c| (c.stats.speed, c.id))
            .collect();
        order.sort_by_key(|(speed, id)| (std::cmp::Reverse(*speed), *id));
        self.turn_order = order.into_iter().map(|(_, id)| id).collect();
        self.turn_index = 0;
    }

    /// Advance past the actor that just finished, skipping the defeated
    pub(crate) fn advance_turn_pointer(&mut self) {
        self.turn_index += 1;
        while let Some(id) = self.turn_order.get(self.turn_index).copied() {
            match self.combatant(id) {
                Some(c) if c.is_alive() => break,
                _ => self.turn_index += 1,
            }
        }
    }

    /// Check the victory condition and transition to terminal if it holds
    pub(crate) fn evaluate_victory(&mut self) {
        if self.is_terminal() {
            return;
        }
        let a_down = self.teams[0].is_defeated();
        let b_down = self.teams[1].is_defeated();
        match (a_down, b_down) {
            (false, false) => {}
            (true, false) => {
                self.phase = BattlePhase::Finished;
                self.winner = Some(self.teams[1].id);
            }
            (false, true) => {
                self.phase = BattlePhase::Finished;
                self.winner = Some(self.teams[0].id);
            }
            // Mutual KO: a draw, not a crash
            (true, true) => {
                self.phase = BattlePhase::Finished;
                self.winner = None;
            }
        }
    }
}

/// Apply one event to a snapshot, producing the next snapshot
///
/// This is the only state-mutation path in the engine: both the live
/// orchestrator and log replay go through it. Any inconsistency between
/// the event and the snapshot is `LogCorruption`.
pub fn apply_event(snapshot: &BattleSnapshot, event: &BattleEvent) -> Result<BattleSnapshot> {
    if snapshot.is_terminal() {
        return Err(EngineError::LogCorruption(format!(
            "event seq {} after terminal state",
            event.seq
        )));
    }

    let expected_seq = snapshot.last_seq.map(|s| s + 1).unwrap_or(0);
    if event.seq != expected_seq {
        return Err(EngineError::LogCorruption(format!(
            "expected seq {}, got {}",
            expected_seq, event.seq
        )));
    }

    let mut snap = snapshot.clone();

    if event.round > snap.round {
        snap.round_reset(event.round);
    } else if event.round < snap.round {
        return Err(EngineError::LogCorruption(format!(
            "event seq {} for past round {}",
            event.seq, event.round
        )));
    }

    match snap.combatant(event.actor) {
        Some(actor) if actor.is_alive() => {}
        _ => {
            return Err(EngineError::LogCorruption(format!(
                "event seq {} from dead or unknown actor",
                event.seq
            )));
        }
    }

    if event.ap_cost > 0 {
        let ap = snap.ap.get(&event.actor).copied().ok_or_else(|| {
            EngineError::LogCorruption(format!("no AP state for actor at seq {}", event.seq))
        })?;
        let (next, _) = ap.spend(event.ap_cost).map_err(|_| {
            EngineError::LogCorruption(format!(
                "AP overdraw at seq {}: cost {} with {} remaining",
                event.seq, event.ap_cost, ap.remaining
            ))
        })?;
        snap.ap.insert(event.actor, next);
    }

    for delta in &event.grid_deltas {
        let current = snap.grid.position_of(delta.combatant);
        if current != delta.from {
            return Err(EngineError::LogCorruption(format!(
                "grid delta mismatch at seq {}: expected {:?}, found {:?}",
                event.seq, delta.from, current
            )));
        }
        snap.grid = match (delta.from, delta.to) {
            (Some(_), Some(to)) => snap.grid.move_occupant(delta.combatant, to),
            (Some(_), None) => snap.grid.remove(delta.combatant),
            (None, Some(to)) => snap.grid.place(delta.combatant, to),
            (None, None) => {
                return Err(EngineError::LogCorruption(format!(
                    "empty grid delta at seq {}",
                    event.seq
                )));
            }
        }
        .map_err(|e| EngineError::LogCorruption(format!("grid delta at seq {}: {}", event.seq, e)))?;
    }

    for delta in &event.health_deltas {
        let combatant = snap.combatant_mut(delta.combatant).ok_or_else(|| {
            EngineError::LogCorruption(format!("health delta for unknown combatant at seq {}", event.seq))
        })?;
        combatant.apply_health_delta(delta.delta);
        if combatant.health != delta.new_health {
            return Err(EngineError::LogCorruption(format!(
                "health mismatch at seq {}: recorded {}, derived {}",
                event.seq, delta.new_health, combatant.health
            )));
        }
    }

    if matches!(event.action, ResolvedAction::Defended) {
        if let Some(actor) = snap.combatant_mut(event.actor) {
            actor.defending = true;
        }
    }

    // A rejection is a no-op inside the same turn; everything else ends it
    if !matches!(event.action, ResolvedAction::Rejected { .. }) {
        snap.advance_turn_pointer();
    }

    snap.last_seq = Some(event.seq);
    snap.evaluate_victory();
    Ok(snap)
}

/// Rebuild a snapshot by replaying the full log from the initial state
pub fn replay(setup: &BattleSetup, events: &[BattleEvent]) -> Result<BattleSnapshot> {
    let mut snapshot = setup.initial_snapshot()?;
    for event in events {
        snapshot = apply_event(&snapshot, event)?;
    }
    Ok(snapshot)
}

/// Verify that replaying the log reproduces the live snapshot
///
/// The one tolerated difference: a battle ended by the round cap flips its
/// phase outside the log, so a replayed `Active` may face a live capped
/// draw as long as everything else matches.
pub fn verify_replay(
    setup: &BattleSetup,
    events: &[BattleEvent],
    live: &BattleSnapshot,
) -> Result<()> {
    let replayed = replay(setup, events)?;

    if replayed == *live {
        return Ok(());
    }

    let capped_draw = live.phase == BattlePhase::Finished
        && live.winner.is_none()
        && replayed.phase == BattlePhase::Active
        && replayed.round >= setup.config.max_rounds
        && replayed.grid == live.grid
        && replayed.teams == live.teams
        && replayed.ap == live.ap
        && replayed.turn_order == live.turn_order
        && replayed.turn_index == live.turn_index
        && replayed.last_seq == live.last_seq;
    if capped_draw {
        return Ok(());
    }

    Err(EngineError::LogCorruption(
        "replayed snapshot does not match live state".into(),
    ))
}
