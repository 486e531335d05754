//! LLM-backed ruling provider
//!
//! Model-agnostic HTTP client for judge rulings, supporting Anthropic and
//! OpenAI-compatible APIs. The model writes the verdict and commentary; the
//! engine clamps every numeric field before anything touches the battle, so
//! a misbehaving model can flavor a ruling but never break an invariant.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::CombatantId;
use crate::judge::provider::RulingProvider;
use crate::judge::ruling::{GameplayEffect, JudgeRuling, JudgeSituation, RulingTag};

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Async LLM judge client
pub struct LlmJudge {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
    judge_name: String,
    damage_cap: i32,
    ap_cap: u8,
    runtime: Option<tokio::runtime::Runtime>,
}

impl LlmJudge {
    /// Create a judge client with explicit configuration
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        judge_name: String,
        damage_cap: i32,
        ap_cap: u8,
    ) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            model,
            api_format,
            judge_name,
            damage_cap,
            ap_cap,
            runtime: None,
        }
    }

    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: JUDGE_API_KEY
    /// Optional: JUDGE_API_URL (defaults to Anthropic), JUDGE_MODEL
    pub fn from_env(judge_name: &str, damage_cap: i32, ap_cap: u8) -> Result<Self> {
        let api_key = std::env::var("JUDGE_API_KEY")
            .map_err(|_| EngineError::JudgeError("JUDGE_API_KEY not set".into()))?;
        let api_url = std::env::var("JUDGE_API_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".into());
        let model =
            std::env::var("JUDGE_MODEL").unwrap_or_else(|_| "claude-3-haiku-20240307".into());

        Ok(Self::new(
            api_key,
            api_url,
            model,
            judge_name.to_string(),
            damage_cap,
            ap_cap,
        ))
    }

    /// Request a ruling from the model
    pub async fn rule_async(&self, situation: &JudgeSituation) -> Result<JudgeRuling> {
        let system = self.system_prompt(situation);
        let user = "Make your ruling now.".to_string();

        let content = match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(&system, &user).await?,
            ApiFormat::OpenAI => self.complete_openai(&system, &user).await?,
        };

        self.parse_ruling(&content, situation)
    }

    fn system_prompt(&self, situation: &JudgeSituation) -> String {
        format!(
            concat!(
                "You are {judge}, arena judge. A combatant has defied their coach.\n",
                "Round {round}. {name} ({hp}% health) was ordered to {ordered}, ",
                "but instead: {declaration}\n\n",
                "Respond with JSON only:\n",
                "{{\"verdict\": \"damage_override|forced_retreat|bonus|penalty|turn_forfeited\",\n",
                "  \"commentary\": \"one sentence in your voice\",\n",
                "  \"mechanical_effect\": {{\"type\": \"strike|direct_damage|retreat|forfeit\",\n",
                "    \"target\": \"deviant|nearest_enemy|nearest_ally\", \"amount\": <number>}}}}"
            ),
            judge = self.judge_name,
            round = situation.round,
            name = situation.deviant_name,
            hp = situation.deviant_health_percent,
            ordered = situation.coach_ordered,
            declaration = situation.declaration,
        )
    }

    fn parse_ruling(&self, content: &str, situation: &JudgeSituation) -> Result<JudgeRuling> {
        let parsed: LlmRulingResponse = serde_json::from_str(content.trim())
            .map_err(|e| EngineError::JudgeError(format!("unparseable ruling: {}", e)))?;

        let tag = match parsed.verdict.as_str() {
            "damage_override" => RulingTag::DamageOverride,
            "forced_retreat" => RulingTag::ForcedRetreat,
            "bonus" => RulingTag::Bonus,
            "penalty" => RulingTag::Penalty,
            "turn_forfeited" => RulingTag::TurnForfeited,
            other => {
                return Err(EngineError::JudgeError(format!("unknown verdict: {}", other)));
            }
        };

        let target = |name: &str| -> Option<CombatantId> {
            match name {
                "deviant" => Some(situation.deviant),
                "nearest_enemy" => situation.nearest_enemy,
                "nearest_ally" => situation.nearest_ally,
                _ => None,
            }
        };

        let effect = match parsed.mechanical_effect.effect_type.as_str() {
            "strike" => {
                let t = target(&parsed.mechanical_effect.target)
                    .or(situation.nearest_enemy)
                    .ok_or_else(|| EngineError::JudgeError("strike with no target".into()))?;
                GameplayEffect::Strike {
                    target: t,
                    power: parsed.mechanical_effect.amount.unwrap_or(10.0) / 10.0,
                }
            }
            "direct_damage" => {
                let t = target(&parsed.mechanical_effect.target).unwrap_or(situation.deviant);
                GameplayEffect::DirectDamage {
                    target: t,
                    amount: parsed.mechanical_effect.amount.unwrap_or(10.0) as i32,
                }
            }
            "retreat" => GameplayEffect::Retreat {
                hexes: parsed.mechanical_effect.amount.unwrap_or(2.0) as u8,
            },
            "forfeit" => GameplayEffect::Forfeit,
            other => {
                return Err(EngineError::JudgeError(format!("unknown effect: {}", other)));
            }
        };

        Ok(JudgeRuling {
            judge: self.judge_name.clone(),
            situation: situation.declaration.clone(),
            tag,
            effect: effect.clamped(self.damage_cap, self.ap_cap),
            narrative: parsed.commentary,
            benefited: if tag == RulingTag::Bonus {
                Some(situation.deviant)
            } else {
                None
            },
            penalized: if matches!(
                tag,
                RulingTag::Penalty | RulingTag::ForcedRetreat | RulingTag::TurnForfeited
            ) {
                Some(situation.deviant)
            } else {
                None
            },
        })
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: 512,
            system: system.into(),
            messages: vec![Message {
                role: "user".into(),
                content: user.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::JudgeError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::JudgeError(format!("API error: {}", error_text)));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| EngineError::JudgeError(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| EngineError::JudgeError("Empty response".into()))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: 512,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: system.into(),
                },
                Message {
                    role: "user".into(),
                    content: user.into(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::JudgeError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::JudgeError(format!("API error: {}", error_text)));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| EngineError::JudgeError(e.to_string()))?;

        completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| EngineError::JudgeError("Empty response".into()))
    }
}

impl RulingProvider for LlmJudge {
    /// Blocking bridge for the synchronous turn pipeline
    ///
    /// Lazily owns a current-thread runtime; not for use inside an async
    /// context (the session layer should call `rule_async` directly).
    fn rule(&mut self, situation: &JudgeSituation) -> Result<JudgeRuling> {
        if self.runtime.is_none() {
            self.runtime = Some(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| EngineError::JudgeError(e.to_string()))?,
            );
        }
        match &self.runtime {
            Some(runtime) => runtime.block_on(self.rule_async(situation)),
            None => Err(EngineError::JudgeError("runtime unavailable".into())),
        }
    }
}

// Expected JSON shape from the model
#[derive(Deserialize)]
struct LlmRulingResponse {
    verdict: String,
    commentary: String,
    mechanical_effect: LlmEffect,
}

#[derive(Deserialize)]
struct LlmEffect {
    #[serde(rename = "type")]
    effect_type: String,
    #[serde(default)]
    target: String,
    amount: Option<f32>,
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psychology::DeviationKind;
    use uuid::Uuid;

    fn client() -> LlmJudge {
        LlmJudge::new(
            "test-key".into(),
            "https://api.example.com".into(),
            "test-model".into(),
            "anubis".into(),
            50,
            3,
        )
    }

    fn situation() -> JudgeSituation {
        JudgeSituation {
            round: 1,
            deviant: CombatantId(Uuid::from_u128(1)),
            deviant_name: "Loki".into(),
            kind: DeviationKind::BerserkerRage,
            declaration: "swung at everyone".into(),
            coach_ordered: "defend".into(),
            deviant_health_percent: 55,
            nearest_enemy: Some(CombatantId(Uuid::from_u128(9))),
            nearest_ally: None,
            nearest_any: Some(CombatantId(Uuid::from_u128(9))),
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            LlmJudge::detect_api_format("https://api.anthropic.com/v1/messages"),
            ApiFormat::Anthropic
        );
        assert_eq!(
            LlmJudge::detect_api_format("https://api.deepseek.com/v1/chat"),
            ApiFormat::OpenAI
        );
    }

    #[test]
    fn test_parse_ruling_clamps_damage() {
        let judge = client();
        let content = r#"{
            "verdict": "penalty",
            "commentary": "The underworld stirs.",
            "mechanical_effect": {"type": "direct_damage", "target": "deviant", "amount": 400}
        }"#;
        let ruling = judge.parse_ruling(content, &situation()).unwrap();
        match ruling.effect {
            GameplayEffect::DirectDamage { amount, .. } => assert_eq!(amount, 50),
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(ruling.penalized, Some(situation().deviant));
    }

    #[test]
    fn test_parse_ruling_retreat_clamped_to_ap() {
        let judge = client();
        let content = r#"{
            "verdict": "forced_retreat",
            "commentary": "Flee, then.",
            "mechanical_effect": {"type": "retreat", "amount": 9}
        }"#;
        let ruling = judge.parse_ruling(content, &situation()).unwrap();
        assert_eq!(ruling.effect, GameplayEffect::Retreat { hexes: 3 });
    }

    #[test]
    fn test_parse_rejects_unknown_verdict() {
        let judge = client();
        let content = r#"{
            "verdict": "execution",
            "commentary": "no",
            "mechanical_effect": {"type": "forfeit"}
        }"#;
        assert!(judge.parse_ruling(content, &situation()).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let judge = client();
        assert!(judge.parse_ruling("the judge waves vaguely", &situation()).is_err());
    }
}
