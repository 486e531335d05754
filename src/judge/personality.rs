//! Judge personality configuration loaded from TOML
//!
//! Personalities define ruling tendencies. The three built-in judges sit
//! on every battle's bench; custom ones can be dropped into
//! `data/judges/{name}.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::core::error::{EngineError, Result};

/// Ruling tendencies (0 to 100)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulingTendencies {
    /// How harshly deviations are punished
    pub strictness: u8,
    /// How much creative chaos is rewarded
    pub creativity: u8,
    /// How much story weighs against mechanics
    pub narrative_focus: u8,
}

impl Default for RulingTendencies {
    fn default() -> Self {
        Self {
            strictness: 50,
            creativity: 50,
            narrative_focus: 50,
        }
    }
}

/// Complete judge personality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgePersonality {
    /// Name of this judge (set from filename when loaded)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tendencies: RulingTendencies,
}

impl Default for JudgePersonality {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            title: String::new(),
            tendencies: RulingTendencies::default(),
        }
    }
}

/// The built-in bench every battle can draw from
pub fn builtin_bench() -> Vec<JudgePersonality> {
    vec![
        JudgePersonality {
            name: "anubis".into(),
            title: "Weigher of Hearts".into(),
            tendencies: RulingTendencies {
                strictness: 95,
                creativity: 40,
                narrative_focus: 70,
            },
        },
        JudgePersonality {
            name: "eleanor_roosevelt".into(),
            title: "The Humanitarian".into(),
            tendencies: RulingTendencies {
                strictness: 30,
                creativity: 80,
                narrative_focus: 85,
            },
        },
        JudgePersonality {
            name: "king_solomon".into(),
            title: "The Wise".into(),
            tendencies: RulingTendencies {
                strictness: 70,
                creativity: 65,
                narrative_focus: 60,
            },
        },
    ]
}

/// Pick a bench judge deterministically from the battle seed
pub fn bench_judge_for_seed(seed: u64) -> JudgePersonality {
    let bench = builtin_bench();
    let index = (seed % bench.len() as u64) as usize;
    bench[index].clone()
}

/// Load a judge personality from TOML
///
/// Loads from `data/judges/{name}.toml`; falls back to the built-in bench
/// entry with the same name.
pub fn load_judge(name: &str) -> Result<JudgePersonality> {
    let path = judge_path(name);

    if let Ok(contents) = fs::read_to_string(&path) {
        let mut personality: JudgePersonality = toml::from_str(&contents)
            .map_err(|e| EngineError::ConfigError(format!("bad judge TOML {:?}: {}", path, e)))?;
        personality.name = name.to_string();
        return Ok(personality);
    }

    builtin_bench()
        .into_iter()
        .find(|j| j.name == name)
        .ok_or_else(|| EngineError::ConfigError(format!("unknown judge '{}'", name)))
}

fn judge_path(name: &str) -> PathBuf {
    PathBuf::from("data/judges").join(format!("{}.toml", name))
}
