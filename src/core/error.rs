use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Hex out of bounds: ({q}, {r})")]
    OutOfBounds { q: i32, r: i32 },

    #[error("Hex ({q}, {r}) is already occupied")]
    OccupiedHex { q: i32, r: i32 },

    #[error("Insufficient action points: need {needed}, have {available}")]
    InsufficientAp { needed: u8, available: u8 },

    #[error("Destination not reachable within action point budget")]
    NotReachable,

    #[error("No line of sight to target")]
    NoLineOfSight,

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Battle is terminal; no further actions accepted")]
    BattleAlreadyTerminal,

    #[error("Battle log corruption: {0}")]
    LogCorruption(String),

    #[error("Judge error: {0}")]
    JudgeError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the orchestrator can degrade this error to a safe default
    /// action instead of halting the battle.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EngineError::LogCorruption(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_recoverable() {
        assert!(EngineError::OccupiedHex { q: 0, r: 0 }.is_recoverable());
        assert!(EngineError::NotReachable.is_recoverable());
        assert!(EngineError::BattleAlreadyTerminal.is_recoverable());
    }

    #[test]
    fn test_log_corruption_is_fatal() {
        assert!(!EngineError::LogCorruption("seq 4 mismatch".into()).is_recoverable());
    }
}
