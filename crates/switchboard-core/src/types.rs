//! Core types for Switchboard: provider identities and the canonical
//! conversation format every protocol adapter translates from.
//!
//! Messages are plain `(role, content)` pairs. Provider-specific shapes
//! (chat-completions, generate-content) live in `switchboard-providers`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────
// Provider identity
// ─────────────────────────────────────────────

/// One of the remote text-completion backends Switchboard knows about.
///
/// The set is closed: adding a backend means a new variant, a new
/// catalog entry, and (if it speaks a new wire format) a new protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenRouter,
    Groq,
    Gemini,
    OpenAi,
}

impl Provider {
    /// Every provider, in default configuration order.
    pub const ALL: [Provider; 4] = [
        Provider::OpenRouter,
        Provider::Groq,
        Provider::Gemini,
        Provider::OpenAi,
    ];

    /// Lowercase name used in config keys, logs, and the CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenRouter => "openrouter",
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
            Provider::OpenAi => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider: {0}")]
pub struct ParseProviderError(pub String);

impl FromStr for Provider {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| ParseProviderError(s.to_string()))
    }
}

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Speaker of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single `(role, content)` pair in the canonical conversation format.
///
/// Serializes as `{"role": "user", "content": "..."}`, which is already
/// the chat-completions wire shape.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ─────────────────────────────────────────────
// Request envelope
// ─────────────────────────────────────────────

/// Default number of attempts per provider.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// One routing request: the conversation plus per-call knobs.
///
/// Built per call and discarded afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestEnvelope {
    /// Conversation, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature. Passed through unchanged; providers clamp.
    pub temperature: f64,
    /// Provider to try first, if it is currently a candidate.
    pub preferred_provider: Option<Provider>,
    /// Attempts per provider before failing over.
    pub max_retries: u32,
}

impl RequestEnvelope {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        RequestEnvelope {
            messages,
            temperature: DEFAULT_TEMPERATURE,
            preferred_provider: None,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_preferred_provider(mut self, provider: Option<Provider>) -> Self {
        self.preferred_provider = provider;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_round_trips_through_name() {
        for provider in Provider::ALL {
            assert_eq!(provider.as_str().parse::<Provider>().unwrap(), provider);
        }
    }

    #[test]
    fn test_provider_parse_is_case_insensitive() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!(" groq ".parse::<Provider>().unwrap(), Provider::Groq);
    }

    #[test]
    fn test_provider_parse_unknown() {
        let err = "anthropic".parse::<Provider>().unwrap_err();
        assert_eq!(err.to_string(), "unknown provider: anthropic");
    }

    #[test]
    fn test_message_serializes_to_wire_shape() {
        let json = serde_json::to_value(ChatMessage::user("Hello")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Hello"}));
    }

    #[test]
    fn test_provider_serde_lowercase() {
        let json = serde_json::to_string(&Provider::OpenRouter).unwrap();
        assert_eq!(json, "\"openrouter\"");
    }

    #[test]
    fn test_envelope_defaults() {
        let env = RequestEnvelope::new(vec![ChatMessage::user("hi")]);
        assert_eq!(env.max_retries, 3);
        assert_eq!(env.temperature, 0.7);
        assert!(env.preferred_provider.is_none());
    }

    #[test]
    fn test_envelope_builders() {
        let env = RequestEnvelope::new(vec![ChatMessage::user("hi")])
            .with_temperature(0.1)
            .with_max_retries(1)
            .with_preferred_provider(Some(Provider::Gemini));
        assert_eq!(env.temperature, 0.1);
        assert_eq!(env.max_retries, 1);
        assert_eq!(env.preferred_provider, Some(Provider::Gemini));
    }
}
