//! Judge arbitration - rulings on combatants that go off-script
//!
//! The ruling provider is a narrow seam: situation in, ruling out. The
//! engine never assumes how the ruling text was produced, only that the
//! numeric effect is bounded and applied through the ordinary economy path.

pub mod llm;
pub mod personality;
pub mod provider;
pub mod ruling;

pub use llm::LlmJudge;
pub use personality::{bench_judge_for_seed, builtin_bench, load_judge, JudgePersonality};
pub use provider::{RulingProvider, TemplateJudge};
pub use ruling::{GameplayEffect, JudgeRuling, JudgeSituation, RulingTag};
