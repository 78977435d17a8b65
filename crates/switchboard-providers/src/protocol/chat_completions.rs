//! OpenAI-compatible `/chat/completions` (OpenRouter, Groq, OpenAI).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use switchboard_core::{ChatMessage, Provider};

use super::{decode_error, present};
use crate::catalog::ProviderConfig;
use crate::error::ProviderError;

/// Request body. `extra` carries per-provider parameters such as `stop`.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    top_p: f64,
    stream: bool,
    #[serde(flatten)]
    extra: &'a serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default, deserialize_with = "present")]
    content: Option<Option<String>>,
}

pub(crate) fn build_payload(config: &ProviderConfig, messages: &[ChatMessage], temperature: f64) -> Value {
    let request = ChatCompletionRequest {
        model: &config.model,
        messages,
        max_tokens: config.max_tokens,
        temperature,
        top_p: config.top_p,
        stream: false,
        extra: &config.extra_params,
    };
    serde_json::to_value(&request).unwrap_or(Value::Null)
}

/// Pull `choices[0].message.content` out of a response body.
pub(crate) fn parse_response(provider: Provider, body: &str) -> Result<Option<String>, ProviderError> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| decode_error(provider, &e))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::protocol(provider, "response has no choices"))?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(ProviderError::Blocked {
            provider,
            reason: "content_filter".to_string(),
        });
    }

    let message = choice
        .message
        .ok_or_else(|| ProviderError::protocol(provider, "choice has no message"))?;

    message
        .content
        .ok_or_else(|| ProviderError::protocol(provider, "message has no content field"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::find_spec;
    use serde_json::json;

    fn config(provider: Provider) -> ProviderConfig {
        ProviderConfig::from_spec(find_spec(provider).unwrap())
    }

    #[test]
    fn test_payload_shape() {
        let messages = vec![ChatMessage::system("Be brief."), ChatMessage::user("Hi")];
        let payload = build_payload(&config(Provider::OpenAi), &messages, 0.3);
        assert_eq!(
            payload,
            json!({
                "model": "gpt-4o-mini",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"}
                ],
                "max_tokens": 2000,
                "temperature": 0.3,
                "top_p": 0.9,
                "stream": false
            })
        );
    }

    #[test]
    fn test_payload_includes_extra_params() {
        let payload = build_payload(&config(Provider::Groq), &[ChatMessage::user("Hi")], 0.7);
        assert!(payload.get("stop").unwrap().is_null());
        assert_eq!(payload["model"], "llama-3.1-70b-versatile");
    }

    #[test]
    fn test_temperature_passed_through_unclamped() {
        let payload = build_payload(&config(Provider::OpenAi), &[ChatMessage::user("Hi")], 1.7);
        assert_eq!(payload["temperature"], 1.7);
    }

    #[test]
    fn test_parse_content() {
        let body = r#"{"id":"x","choices":[{"message":{"role":"assistant","content":"Hello"},"finish_reason":"stop"}]}"#;
        assert_eq!(
            parse_response(Provider::OpenAi, body).unwrap().as_deref(),
            Some("Hello")
        );
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_response(Provider::Groq, "<html>oops</html>").unwrap_err();
        match err {
            ProviderError::Protocol { detail, .. } => assert!(detail.contains("invalid JSON")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_no_choices() {
        for body in [r#"{"choices":[]}"#, r#"{"error":"nope"}"#] {
            let err = parse_response(Provider::Groq, body).unwrap_err();
            assert!(matches!(err, ProviderError::Protocol { .. }), "{body}");
        }
    }

    #[test]
    fn test_parse_wrong_structure() {
        let err = parse_response(Provider::Groq, r#"{"choices":"nope"}"#).unwrap_err();
        match err {
            ProviderError::Protocol { detail, .. } => {
                assert!(detail.contains("invalid response structure"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_message() {
        let err = parse_response(Provider::OpenAi, r#"{"choices":[{"finish_reason":"stop"}]}"#)
            .unwrap_err();
        assert!(matches!(err, ProviderError::Protocol { .. }));
    }

    #[test]
    fn test_parse_null_content() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert_eq!(parse_response(Provider::OpenAi, body).unwrap(), None);
    }

    #[test]
    fn test_parse_missing_content_field() {
        let body = r#"{"choices":[{"message":{"role":"assistant"}}]}"#;
        let err = parse_response(Provider::OpenAi, body).unwrap_err();
        match err {
            ProviderError::Protocol { detail, .. } => assert!(detail.contains("no content field")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_content_filter() {
        let body = r#"{"choices":[{"message":{"content":""},"finish_reason":"content_filter"}]}"#;
        let err = parse_response(Provider::OpenAi, body).unwrap_err();
        assert!(!err.is_retryable());
    }
}
