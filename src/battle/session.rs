//! Async battle session - the single-writer wrapper around a battle
//!
//! One tokio task owns the `Battle`; planned actions arrive on a command
//! channel and are buffered per combatant until the orchestrator reaches
//! that actor. If nothing has arrived when a turn begins, the timeout
//! policy substitutes Defend. Snapshots are published on a watch channel
//! so reads are lock-free and always observe a fully resolved state.

use std::time::Duration;

use ahash::AHashMap;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{sleep_until, Instant};

use crate::battle::actions::PlannedAction;
use crate::battle::events::BattleEvent;
use crate::battle::orchestrator::{Battle, BattleResult};
use crate::battle::snapshot::BattleSnapshot;
use crate::battle::store::EventStore;
use crate::core::error::{EngineError, Result};
use crate::core::types::{BattleId, CombatantId};

enum SessionCommand {
    Submit {
        combatant: CombatantId,
        action: PlannedAction,
    },
}

/// Client handle to a running battle session
#[derive(Clone)]
pub struct BattleSessionHandle {
    battle_id: BattleId,
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<BattleEvent>,
    snapshot_rx: watch::Receiver<BattleSnapshot>,
    result_rx: watch::Receiver<Option<BattleResult>>,
}

impl BattleSessionHandle {
    pub fn battle_id(&self) -> BattleId {
        self.battle_id
    }

    /// Submit a planned action for a combatant
    ///
    /// Validated only for shape here; legality is the orchestrator's job.
    /// Early submissions are buffered until it is that combatant's turn;
    /// a later submission for the same combatant replaces the earlier one.
    pub async fn submit_planned_action(
        &self,
        combatant: CombatantId,
        action: PlannedAction,
    ) -> Result<()> {
        self.commands
            .send(SessionCommand::Submit { combatant, action })
            .await
            .map_err(|_| EngineError::BattleAlreadyTerminal)
    }

    /// The latest fully resolved snapshot (lock-free read)
    pub fn snapshot(&self) -> BattleSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to the ordered stream of resolved events
    pub fn subscribe_events(&self) -> broadcast::Receiver<BattleEvent> {
        self.events.subscribe()
    }

    /// Wait for the battle to end and return its summary
    pub async fn wait_result(&self) -> Result<BattleResult> {
        let mut rx = self.result_rx.clone();
        loop {
            if let Some(result) = rx.borrow().clone() {
                return Ok(result);
            }
            rx.changed()
                .await
                .map_err(|_| EngineError::BattleAlreadyTerminal)?;
        }
    }
}

/// Spawner for battle session tasks
pub struct BattleSession;

impl BattleSession {
    /// Spawn the session task; the battle lives until a victory condition
    /// or the round cap ends it.
    pub fn spawn(
        battle: Battle,
        store: Box<dyn EventStore>,
        turn_timeout: Duration,
    ) -> BattleSessionHandle {
        let battle_id = battle.id();
        let (commands_tx, commands_rx) = mpsc::channel(64);
        let (events_tx, _) = broadcast::channel(256);
        let (snapshot_tx, snapshot_rx) = watch::channel(battle.snapshot().clone());
        let (result_tx, result_rx) = watch::channel(None);

        let handle = BattleSessionHandle {
            battle_id,
            commands: commands_tx,
            events: events_tx.clone(),
            snapshot_rx,
            result_rx,
        };

        tokio::spawn(run_session(
            battle,
            store,
            commands_rx,
            events_tx,
            snapshot_tx,
            result_tx,
            turn_timeout,
        ));

        handle
    }
}

async fn run_session(
    mut battle: Battle,
    mut store: Box<dyn EventStore>,
    mut commands_rx: mpsc::Receiver<SessionCommand>,
    events_tx: broadcast::Sender<BattleEvent>,
    snapshot_tx: watch::Sender<BattleSnapshot>,
    result_tx: watch::Sender<Option<BattleResult>>,
    turn_timeout: Duration,
) {
    let battle_id = battle.id();
    let mut buffered: AHashMap<CombatantId, PlannedAction> = AHashMap::new();

    loop {
        let Some(actor) = battle.current_actor() else {
            break;
        };
        snapshot_tx.send_replace(battle.snapshot().clone());

        let planned = match buffered.remove(&actor) {
            Some(action) => action,
            None => wait_for_plan(&mut commands_rx, &mut buffered, actor, turn_timeout).await,
        };

        match battle.submit_turn(actor, planned) {
            Ok(events) => {
                for event in events {
                    if let Err(err) = store.append(battle_id, &event) {
                        tracing::error!(%err, "event store append failed");
                    }
                    let _ = events_tx.send(event);
                }
                snapshot_tx.send_replace(battle.snapshot().clone());
            }
            Err(err) => {
                tracing::error!(%err, "turn resolution failed, closing session");
                break;
            }
        }
    }

    if let Err(err) = battle.verify_replay() {
        tracing::error!(%err, "replay audit failed on completed battle");
    }

    snapshot_tx.send_replace(battle.snapshot().clone());
    result_tx.send_replace(battle.result());
    tracing::info!(?battle_id, "battle session finished");

    // Keep the command channel drained so late submitters get clean sends
    while commands_rx.recv().await.is_some() {
        tracing::debug!("submission ignored, battle is terminal");
    }
}

/// Block this actor's turn on coach input, buffering everyone else's
async fn wait_for_plan(
    commands_rx: &mut mpsc::Receiver<SessionCommand>,
    buffered: &mut AHashMap<CombatantId, PlannedAction>,
    actor: CombatantId,
    turn_timeout: Duration,
) -> PlannedAction {
    let deadline = Instant::now() + turn_timeout;
    loop {
        tokio::select! {
            cmd = commands_rx.recv() => match cmd {
                Some(SessionCommand::Submit { combatant, action }) => {
                    if combatant == actor {
                        return action;
                    }
                    buffered.insert(combatant, action);
                }
                // Every handle dropped: play out safely
                None => return PlannedAction::Defend,
            },
            _ = sleep_until(deadline) => {
                tracing::debug!(?actor, "turn timed out, defaulting to defend");
                return PlannedAction::Defend;
            }
        }
    }
}
