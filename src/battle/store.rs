//! Event store interface
//!
//! The engine appends every resolved event; reconstruction loads the log
//! back and folds it from the empty initial state. The in-memory store
//! backs tests and the session default; the JSONL store writes one JSON
//! event per line per battle.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use ahash::AHashMap;

use crate::battle::events::BattleEvent;
use crate::core::error::{EngineError, Result};
use crate::core::types::BattleId;

/// Append-only persistence for battle logs
pub trait EventStore: Send {
    fn append(&mut self, battle: BattleId, event: &BattleEvent) -> Result<()>;
    fn load_log(&self, battle: BattleId) -> Result<Vec<BattleEvent>>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    logs: AHashMap<BattleId, Vec<BattleEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for MemoryStore {
    fn append(&mut self, battle: BattleId, event: &BattleEvent) -> Result<()> {
        self.logs.entry(battle).or_default().push(event.clone());
        Ok(())
    }

    fn load_log(&self, battle: BattleId) -> Result<Vec<BattleEvent>> {
        Ok(self.logs.get(&battle).cloned().unwrap_or_default())
    }
}

/// One `<battle-id>.jsonl` file per battle under a directory
#[derive(Debug, Clone)]
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, battle: BattleId) -> PathBuf {
        self.dir.join(format!("{}.jsonl", battle.0))
    }
}

impl EventStore for JsonlStore {
    fn append(&mut self, battle: BattleId, event: &BattleEvent) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(battle))?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn load_log(&self, battle: BattleId) -> Result<Vec<BattleEvent>> {
        let path = self.path_for(battle);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path)?;
        let mut events = Vec::new();
        for (n, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let event: BattleEvent = serde_json::from_str(line).map_err(|e| {
                EngineError::LogCorruption(format!("bad event at line {}: {}", n + 1, e))
            })?;
            events.push(event);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::events::ResolvedAction;
    use crate::core::types::CombatantId;
    use crate::grid::HexPosition;

    fn event(seq: u64) -> BattleEvent {
        BattleEvent {
            seq,
            round: 1,
            actor: CombatantId::new(),
            action: ResolvedAction::Moved {
                to: HexPosition::new(1, 0),
            },
            ap_cost: 1,
            grid_deltas: vec![],
            health_deltas: vec![],
            ruling: None,
            hazard_triggered: false,
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        let battle = BattleId::new();
        store.append(battle, &event(0)).unwrap();
        store.append(battle, &event(1)).unwrap();

        let log = store.load_log(battle).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].seq, 0);
        assert_eq!(log[1].seq, 1);
    }

    #[test]
    fn test_memory_store_unknown_battle_empty() {
        let store = MemoryStore::new();
        assert!(store.load_log(BattleId::new()).unwrap().is_empty());
    }

    #[test]
    fn test_jsonl_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("colosseum-store-{}", std::process::id()));
        let mut store = JsonlStore::new(&dir).unwrap();
        let battle = BattleId::new();

        store.append(battle, &event(0)).unwrap();
        store.append(battle, &event(1)).unwrap();

        let log = store.load_log(battle).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[1].seq, 1);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_jsonl_store_rejects_garbage() {
        let dir = std::env::temp_dir().join(format!("colosseum-garbage-{}", std::process::id()));
        let store = JsonlStore::new(&dir).unwrap();
        let battle = BattleId::new();

        fs::write(store.path_for(battle), "not json\n").unwrap();
        assert!(matches!(
            store.load_log(battle),
            Err(EngineError::LogCorruption(_))
        ));

        let _ = fs::remove_dir_all(dir);
    }
}
