//! Ruling providers
//!
//! `TemplateJudge` is the deterministic default: ruling choice is a pure
//! function of the personality, the deviation, and the precedent count for
//! that deviation kind. Repeat offenses escalate.

use ahash::AHashMap;

use crate::core::error::{EngineError, Result};
use crate::judge::personality::JudgePersonality;
use crate::judge::ruling::{GameplayEffect, JudgeRuling, JudgeSituation, RulingTag};
use crate::psychology::DeviationKind;

/// Situation in, ruling out
pub trait RulingProvider: Send {
    fn rule(&mut self, situation: &JudgeSituation) -> Result<JudgeRuling>;
}

/// Deterministic template-based judge
#[derive(Debug, Clone)]
pub struct TemplateJudge {
    personality: JudgePersonality,
    precedents: AHashMap<DeviationKind, u32>,
}

impl TemplateJudge {
    pub fn new(personality: JudgePersonality) -> Self {
        Self {
            personality,
            precedents: AHashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.personality.name
    }

    /// How many times this judge has ruled on a deviation kind
    pub fn precedent_count(&self, kind: DeviationKind) -> u32 {
        self.precedents.get(&kind).copied().unwrap_or(0)
    }

    fn decide(&self, situation: &JudgeSituation, precedent: u32) -> (RulingTag, GameplayEffect) {
        let strict = self.personality.tendencies.strictness >= 70;
        let lenient = self.personality.tendencies.strictness <= 40;
        let creative = self.personality.tendencies.creativity >= 60;

        match situation.kind {
            DeviationKind::MinorInsubordination => match situation.nearest_enemy {
                Some(target) => (
                    RulingTag::DamageOverride,
                    GameplayEffect::Strike { target, power: 0.9 },
                ),
                None => (RulingTag::TurnForfeited, GameplayEffect::Forfeit),
            },
            DeviationKind::StrategyOverride => match situation.nearest_enemy {
                Some(target) => {
                    // Creative judges reward improvisation; strict ones dock it
                    let power = if creative { 1.1 } else { 0.8 };
                    let tag = if creative {
                        RulingTag::Bonus
                    } else {
                        RulingTag::Penalty
                    };
                    (tag, GameplayEffect::Strike { target, power })
                }
                None => (RulingTag::TurnForfeited, GameplayEffect::Forfeit),
            },
            DeviationKind::PacifistStand => {
                if strict && precedent > 0 {
                    // Contempt: repeat refusals draw a fine
                    (
                        RulingTag::Penalty,
                        GameplayEffect::DirectDamage {
                            target: situation.deviant,
                            amount: 5 + 5 * precedent as i32,
                        },
                    )
                } else {
                    (RulingTag::TurnForfeited, GameplayEffect::Forfeit)
                }
            }
            DeviationKind::BerserkerRage => match situation.nearest_any {
                Some(target) => (
                    RulingTag::DamageOverride,
                    GameplayEffect::Strike { target, power: 1.2 },
                ),
                None => (RulingTag::TurnForfeited, GameplayEffect::Forfeit),
            },
            DeviationKind::FriendlyFire => match situation.nearest_ally {
                Some(target) => {
                    let power = if lenient { 0.6 } else { 0.8 };
                    (RulingTag::Penalty, GameplayEffect::Strike { target, power })
                }
                // Nobody to betray: the lunge goes wide and hurts
                None => (
                    RulingTag::Penalty,
                    GameplayEffect::DirectDamage {
                        target: situation.deviant,
                        amount: 10,
                    },
                ),
            },
            DeviationKind::PanickedFlight => {
                let hexes = (2 + precedent.min(1)) as u8;
                (RulingTag::ForcedRetreat, GameplayEffect::Retreat { hexes })
            }
        }
    }

    fn commentary(&self, situation: &JudgeSituation) -> String {
        let severity = situation.kind.severity();
        match self.personality.name.as_str() {
            "anubis" => match severity {
                1 => format!(
                    "The scales of Ma'at tip slightly. Your heart grows heavier, {}.",
                    situation.deviant_name
                ),
                2 => "By the 42 Laws, this defiance darkens your soul!".to_string(),
                _ => "APOPHIS HIMSELF would blush at such betrayal!".to_string(),
            },
            "eleanor_roosevelt" => match severity {
                1 => format!(
                    "We must understand what {} is going through right now.",
                    situation.deviant_name
                ),
                2 => "Courage takes strange shapes under pressure.".to_string(),
                _ => "Even this can be a lesson, though it must carry consequences.".to_string(),
            },
            "king_solomon" => match severity {
                1 => "A small matter, weighed and measured.".to_string(),
                2 => format!(
                    "{} chose their own counsel over their coach's. So be it.",
                    situation.deviant_name
                ),
                _ => "Wisdom demands this be divided fairly - and firmly.".to_string(),
            },
            _ => format!(
                "The bench has considered {}'s conduct and ruled.",
                situation.deviant_name
            ),
        }
    }
}

impl RulingProvider for TemplateJudge {
    fn rule(&mut self, situation: &JudgeSituation) -> Result<JudgeRuling> {
        if situation.deviant_name.is_empty() {
            return Err(EngineError::JudgeError("situation missing deviant name".into()));
        }

        let precedent = self.precedent_count(situation.kind);
        let (tag, effect) = self.decide(situation, precedent);
        *self.precedents.entry(situation.kind).or_insert(0) += 1;

        let penalized = match tag {
            RulingTag::Penalty | RulingTag::ForcedRetreat | RulingTag::TurnForfeited => {
                Some(situation.deviant)
            }
            _ => None,
        };
        let benefited = match (tag, effect) {
            (RulingTag::Bonus, _) => Some(situation.deviant),
            _ => None,
        };

        Ok(JudgeRuling {
            judge: self.personality.name.clone(),
            situation: format!(
                "Round {}: {} was ordered to {} but {}",
                situation.round, situation.deviant_name, situation.coach_ordered,
                situation.declaration,
            ),
            tag,
            effect,
            narrative: self.commentary(situation),
            benefited,
            penalized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::CombatantId;
    use crate::judge::personality::builtin_bench;
    use uuid::Uuid;

    fn judge(name: &str) -> TemplateJudge {
        let personality = builtin_bench().into_iter().find(|j| j.name == name).unwrap();
        TemplateJudge::new(personality)
    }

    fn situation(kind: DeviationKind) -> JudgeSituation {
        JudgeSituation {
            round: 2,
            deviant: CombatantId(Uuid::from_u128(1)),
            deviant_name: "Loki".into(),
            kind,
            declaration: "went rogue".into(),
            coach_ordered: "attack".into(),
            deviant_health_percent: 80,
            nearest_enemy: Some(CombatantId(Uuid::from_u128(9))),
            nearest_ally: Some(CombatantId(Uuid::from_u128(2))),
            nearest_any: Some(CombatantId(Uuid::from_u128(9))),
        }
    }

    #[test]
    fn test_ruling_stable_for_fixed_inputs() {
        let mut a = judge("king_solomon");
        let mut b = judge("king_solomon");
        let s = situation(DeviationKind::MinorInsubordination);
        assert_eq!(a.rule(&s).unwrap(), b.rule(&s).unwrap());
    }

    #[test]
    fn test_pacifist_forfeits_first_offense() {
        let mut j = judge("anubis");
        let ruling = j.rule(&situation(DeviationKind::PacifistStand)).unwrap();
        assert_eq!(ruling.tag, RulingTag::TurnForfeited);
        assert_eq!(ruling.effect, GameplayEffect::Forfeit);
    }

    #[test]
    fn test_strict_judge_escalates_repeat_offense() {
        let mut j = judge("anubis");
        let s = situation(DeviationKind::PacifistStand);
        let first = j.rule(&s).unwrap();
        let second = j.rule(&s).unwrap();
        assert_eq!(first.effect, GameplayEffect::Forfeit);
        assert!(matches!(
            second.effect,
            GameplayEffect::DirectDamage { .. }
        ));
    }

    #[test]
    fn test_lenient_judge_never_fines_pacifists() {
        let mut j = judge("eleanor_roosevelt");
        let s = situation(DeviationKind::PacifistStand);
        for _ in 0..3 {
            assert_eq!(j.rule(&s).unwrap().effect, GameplayEffect::Forfeit);
        }
    }

    #[test]
    fn test_creative_judge_rewards_override() {
        let mut creative = judge("eleanor_roosevelt");
        let mut strict = judge("anubis");
        let s = situation(DeviationKind::StrategyOverride);
        let r1 = creative.rule(&s).unwrap();
        let r2 = strict.rule(&s).unwrap();
        assert_eq!(r1.tag, RulingTag::Bonus);
        assert_eq!(r2.tag, RulingTag::Penalty);
    }

    #[test]
    fn test_friendly_fire_targets_the_ally() {
        let mut j = judge("king_solomon");
        let s = situation(DeviationKind::FriendlyFire);
        match j.rule(&s).unwrap().effect {
            GameplayEffect::Strike { target, .. } => {
                assert_eq!(target, s.nearest_ally.unwrap());
            }
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn test_flight_is_forced_retreat() {
        let mut j = judge("king_solomon");
        let ruling = j.rule(&situation(DeviationKind::PanickedFlight)).unwrap();
        assert_eq!(ruling.tag, RulingTag::ForcedRetreat);
        assert!(matches!(ruling.effect, GameplayEffect::Retreat { hexes } if hexes >= 2));
    }

    #[test]
    fn test_ruling_references_battle_facts_only() {
        let mut j = judge("anubis");
        let s = situation(DeviationKind::MinorInsubordination);
        let ruling = j.rule(&s).unwrap();
        assert!(ruling.situation.contains("Round 2"));
        assert!(ruling.situation.contains("Loki"));
    }
}
