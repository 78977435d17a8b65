//! Provider registry: built-in defaults for every supported backend.
//!
//! Each `ProviderSpec` describes how to reach one provider out of the box:
//! endpoint, model, secret name, priority, timeout, wire protocol, and any
//! static headers or body parameters it needs. User config can override
//! most of these (see [`crate::catalog`]).

use switchboard_core::Provider;

use crate::protocol::Protocol;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one provider's defaults.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub provider: Provider,
    /// Human-readable name for logs. E.g. `"OpenRouter"`.
    pub display_name: &'static str,
    /// Full endpoint URL.
    pub endpoint: &'static str,
    /// Default model identifier.
    pub model: &'static str,
    /// Environment variable holding the API key.
    pub env_key: &'static str,
    /// Lower is preferred.
    pub priority: u32,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub protocol: Protocol,
    pub top_p: f64,
    /// Headers sent with every request.
    pub extra_headers: &'static [(&'static str, HeaderSource)],
    /// Extra top-level body parameters (chat-completions only).
    pub extra_params: &'static [(&'static str, ParamValue)],
}

/// Where a static header's value comes from.
#[derive(Clone, Copy, Debug)]
pub enum HeaderSource {
    Fixed(&'static str),
    /// Read from an env var at catalog build time, with a fallback.
    EnvOr {
        var: &'static str,
        default: &'static str,
    },
}

impl HeaderSource {
    pub fn resolve(&self) -> String {
        match self {
            HeaderSource::Fixed(v) => v.to_string(),
            HeaderSource::EnvOr { var, default } => {
                std::env::var(var).unwrap_or_else(|_| default.to_string())
            }
        }
    }
}

/// A static JSON body parameter.
#[derive(Clone, Copy, Debug)]
pub enum ParamValue {
    Null,
    Number(f64),
}

impl ParamValue {
    pub fn to_json(self) -> serde_json::Value {
        match self {
            ParamValue::Null => serde_json::Value::Null,
            ParamValue::Number(n) => serde_json::json!(n),
        }
    }
}

// ─────────────────────────────────────────────
// All providers (in configuration order)
// ─────────────────────────────────────────────

/// Built-in provider specifications, in configuration order.
pub static PROVIDERS: &[ProviderSpec] = &[
    // 1. OpenRouter: gateway, wants attribution headers
    ProviderSpec {
        provider: Provider::OpenRouter,
        display_name: "OpenRouter",
        endpoint: "https://openrouter.ai/api/v1/chat/completions",
        model: "anthropic/claude-3.5-sonnet",
        env_key: "OPENROUTER_API_KEY",
        priority: 1,
        timeout_secs: 30,
        max_tokens: 2000,
        protocol: Protocol::ChatCompletions,
        top_p: 0.9,
        extra_headers: &[
            (
                "HTTP-Referer",
                HeaderSource::EnvOr {
                    var: "DOMAIN_URL",
                    default: "https://yourdomain.com",
                },
            ),
            ("X-Title", HeaderSource::Fixed("Enterprise Chatbot")),
        ],
        extra_params: &[],
    },
    // 2. Groq: explicit `stop: null`
    ProviderSpec {
        provider: Provider::Groq,
        display_name: "Groq",
        endpoint: "https://api.groq.com/openai/v1/chat/completions",
        model: "llama-3.1-70b-versatile",
        env_key: "GROQ_API_KEY",
        priority: 2,
        timeout_secs: 25,
        max_tokens: 2000,
        protocol: Protocol::ChatCompletions,
        top_p: 0.9,
        extra_headers: &[],
        extra_params: &[("stop", ParamValue::Null)],
    },
    // 3. Gemini: generate-content, key in query string
    ProviderSpec {
        provider: Provider::Gemini,
        display_name: "Gemini",
        endpoint: "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash-latest:generateContent",
        model: "gemini-1.5-flash",
        env_key: "GEMINI_API_KEY",
        priority: 3,
        timeout_secs: 30,
        max_tokens: 2000,
        protocol: Protocol::GenerateContent,
        top_p: 0.9,
        extra_headers: &[],
        extra_params: &[],
    },
    // 4. OpenAI
    ProviderSpec {
        provider: Provider::OpenAi,
        display_name: "OpenAI",
        endpoint: "https://api.openai.com/v1/chat/completions",
        model: "gpt-4o-mini",
        env_key: "OPENAI_API_KEY",
        priority: 4,
        timeout_secs: 35,
        max_tokens: 2000,
        protocol: Protocol::ChatCompletions,
        top_p: 0.9,
        extra_headers: &[],
        extra_params: &[],
    },
];

/// Find the built-in spec for a provider.
pub fn find_spec(provider: Provider) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().find(|spec| spec.provider == provider)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
