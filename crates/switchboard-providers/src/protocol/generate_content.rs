//! Gemini-style `:generateContent`.
//!
//! The conversation is flattened into one prompt string; safety filtering is
//! reported either as `promptFeedback.blockReason` (no candidates at all) or
//! as a candidate with `finishReason: "SAFETY"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use switchboard_core::{ChatMessage, Provider, Role};

use super::{decode_error, present};
use crate::catalog::ProviderConfig;
use crate::error::ProviderError;

const TOP_K: u32 = 40;

const SAFETY_CATEGORIES: [&str; 2] = ["HARM_CATEGORY_HARASSMENT", "HARM_CATEGORY_HATE_SPEECH"];

const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

// ── request ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
    top_p: f64,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

// ── response ──

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default, deserialize_with = "present")]
    text: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

/// Flatten a conversation into a single prompt, one paragraph per message.
pub fn render_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|msg| {
            let label = match msg.role {
                Role::System => "System Instructions",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{label}: {}", msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn build_payload(config: &ProviderConfig, messages: &[ChatMessage], temperature: f64) -> Value {
    let request = GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: render_prompt(messages),
            }],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: config.max_tokens,
            temperature,
            top_p: config.top_p,
            top_k: TOP_K,
        },
        safety_settings: SAFETY_CATEGORIES
            .into_iter()
            .map(|category| SafetySetting {
                category,
                threshold: SAFETY_THRESHOLD,
            })
            .collect(),
    };
    serde_json::to_value(&request).unwrap_or(Value::Null)
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
pub(crate) fn parse_response(provider: Provider, body: &str) -> Result<Option<String>, ProviderError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| decode_error(provider, &e))?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::Blocked { provider, reason });
        }
        return Err(ProviderError::protocol(provider, "response has no candidates"));
    };

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(ProviderError::Blocked {
            provider,
            reason: "response blocked by safety filters".to_string(),
        });
    }

    let part = candidate
        .content
        .and_then(|c| c.parts)
        .and_then(|parts| parts.into_iter().next())
        .ok_or_else(|| ProviderError::protocol(provider, "missing content in candidate"))?;

    part.text
        .ok_or_else(|| ProviderError::protocol(provider, "content part has no text field"))
}
