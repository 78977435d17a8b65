//! Wire protocols: one request builder and one response parser per variant.
//!
//! Providers speak one of two shapes:
//! - [`Protocol::ChatCompletions`]: OpenAI-style `messages` in, `choices[0].message.content` out.
//! - [`Protocol::GenerateContent`]: Gemini-style flattened prompt in,
//!   `candidates[0].content.parts[0].text` out.

pub mod chat_completions;
pub mod generate_content;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use switchboard_core::ChatMessage;

use crate::catalog::ProviderConfig;
use crate::error::ProviderError;

/// How credentials are attached to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `?key=<key>` on the URL.
    QueryKey,
}

/// Request/response shape a provider speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    ChatCompletions,
    GenerateContent,
}

impl Protocol {
    pub fn auth_style(&self) -> AuthStyle {
        match self {
            Protocol::ChatCompletions => AuthStyle::Bearer,
            Protocol::GenerateContent => AuthStyle::QueryKey,
        }
    }

    /// Build the JSON body for one call.
    pub fn build_payload(
        &self,
        config: &ProviderConfig,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> Value {
        match self {
            Protocol::ChatCompletions => chat_completions::build_payload(config, messages, temperature),
            Protocol::GenerateContent => generate_content::build_payload(config, messages, temperature),
        }
    }

    /// Extract trimmed, non-empty text from a 200 response body.
    pub fn parse_response(&self, config: &ProviderConfig, body: &str) -> Result<String, ProviderError> {
        let text = match self {
            Protocol::ChatCompletions => chat_completions::parse_response(config.provider, body)?,
            Protocol::GenerateContent => generate_content::parse_response(config.provider, body)?,
        };
        non_blank(config, text)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::ChatCompletions => "chat-completions",
            Protocol::GenerateContent => "generate-content",
        }
    }
}

fn non_blank(config: &ProviderConfig, text: Option<String>) -> Result<String, ProviderError> {
    match text.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(ProviderError::EmptyResponse {
            provider: config.provider,
        }),
    }
}

/// Tells a present-but-null field (`Some(None)`) apart from a missing one
/// (`None`, via `#[serde(default)]`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Map a serde failure to a protocol error, separating bad JSON from bad shape.
fn decode_error(provider: switchboard_core::Provider, err: &serde_json::Error) -> ProviderError {
    if err.is_syntax() || err.is_eof() {
        ProviderError::protocol(provider, format!("invalid JSON response: {err}"))
    } else {
        ProviderError::protocol(provider, format!("invalid response structure: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::find_spec;
    use switchboard_core::Provider;

    fn config(provider: Provider) -> ProviderConfig {
        ProviderConfig::from_spec(find_spec(provider).unwrap())
    }

    #[test]
    fn test_auth_styles() {
        assert_eq!(Protocol::ChatCompletions.auth_style(), AuthStyle::Bearer);
        assert_eq!(Protocol::GenerateContent.auth_style(), AuthStyle::QueryKey);
    }

    #[test]
    fn test_parse_trims_text() {
        let body = r#"{"choices":[{"message":{"content":"  hi there \n"}}]}"#;
        let text = Protocol::ChatCompletions
            .parse_response(&config(Provider::Groq), body)
            .unwrap();
        assert_eq!(text, "hi there");
    }

    #[test]
    fn test_blank_text_is_empty_response() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#;
        let err = Protocol::GenerateContent
            .parse_response(&config(Provider::Gemini), body)
            .unwrap_err();
        assert_eq!(err, ProviderError::EmptyResponse { provider: Provider::Gemini });
    }

    #[test]
    fn test_missing_text_field_is_protocol_error() {
        let cases = [
            (Protocol::ChatCompletions, Provider::OpenAi, r#"{"choices":[{"message":{"role":"assistant"}}]}"#),
            (Protocol::GenerateContent, Provider::Gemini, r#"{"candidates":[{"content":{"parts":[{}]}}]}"#),
        ];
        for (protocol, provider, body) in cases {
            let err = protocol.parse_response(&config(provider), body).unwrap_err();
            assert!(matches!(err, ProviderError::Protocol { .. }), "{body}: {err:?}");
        }
    }

    #[test]
    fn test_null_text_is_empty_response() {
        let cases = [
            (Protocol::ChatCompletions, Provider::Groq, r#"{"choices":[{"message":{"content":null}}]}"#),
            (Protocol::GenerateContent, Provider::Gemini, r#"{"candidates":[{"content":{"parts":[{"text":null}]}}]}"#),
        ];
        for (protocol, provider, body) in cases {
            let err = protocol.parse_response(&config(provider), body).unwrap_err();
            assert_eq!(err, ProviderError::EmptyResponse { provider }, "{body}");
        }
    }

    #[test]
    fn test_protocol_names() {
        assert_eq!(Protocol::ChatCompletions.as_str(), "chat-completions");
        assert_eq!(
            serde_json::to_string(&Protocol::GenerateContent).unwrap(),
            "\"generate-content\""
        );
    }
}
