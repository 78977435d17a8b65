//! Configuration schema.
//!
//! Hierarchy: `Config` → `ProvidersConfig`, `RouterSettings`, `TransportConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.
//! Every field has a default so a partial (or empty) file is valid.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{Provider, DEFAULT_MAX_RETRIES, DEFAULT_TEMPERATURE};

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration: loaded from `~/.switchboard/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub router: RouterSettings,
    pub transport: TransportConfig,
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Per-provider overrides on top of the built-in catalog defaults.
///
/// `None` means "use the catalog default".
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderOverrides {
    /// Whether the provider takes part in routing at all.
    pub enabled: bool,
    /// Endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Name of the secret holding the API key (e.g. an env var name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Static priority, lower is preferred.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    /// Per-request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Maximum output tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Extra HTTP headers, merged over the catalog's.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for ProviderOverrides {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: None,
            model: None,
            api_key_env: None,
            priority: None,
            timeout_secs: None,
            max_tokens: None,
            extra_headers: None,
        }
    }
}

/// Overrides for every known provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openrouter: ProviderOverrides,
    pub groq: ProviderOverrides,
    pub gemini: ProviderOverrides,
    pub openai: ProviderOverrides,
}

impl ProvidersConfig {
    pub fn get(&self, provider: Provider) -> &ProviderOverrides {
        match provider {
            Provider::OpenRouter => &self.openrouter,
            Provider::Groq => &self.groq,
            Provider::Gemini => &self.gemini,
            Provider::OpenAi => &self.openai,
        }
    }

    pub fn get_mut(&mut self, provider: Provider) -> &mut ProviderOverrides {
        match provider {
            Provider::OpenRouter => &mut self.openrouter,
            Provider::Groq => &mut self.groq,
            Provider::Gemini => &mut self.gemini,
            Provider::OpenAi => &mut self.openai,
        }
    }
}

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Retry, backoff, and probing settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouterSettings {
    /// Attempts per provider before failing over.
    pub max_retries: u32,
    /// Default sampling temperature.
    pub temperature: f64,
    /// Timeout for a single health probe.
    pub probe_timeout_secs: u64,
    /// Interval between periodic health refreshes.
    pub probe_interval_secs: u64,
    /// Length of one backoff time-unit in milliseconds.
    pub backoff_unit_ms: u64,
    /// Backoff cap, in time-units.
    pub max_backoff_units: f64,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            temperature: DEFAULT_TEMPERATURE,
            probe_timeout_secs: 15,
            probe_interval_secs: 300,
            backoff_unit_ms: 1000,
            max_backoff_units: 10.0,
        }
    }
}

// ─────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────

/// Shared HTTP connection pool limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransportConfig {
    /// Cap on concurrent in-flight requests across all providers.
    pub max_connections: usize,
    /// Cap on concurrent in-flight requests to one provider.
    pub max_connections_per_provider: usize,
    pub connect_timeout_secs: u64,
    /// Outer bound for any request; per-provider timeouts are tighter.
    pub request_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_connections: 100,
            max_connections_per_provider: 30,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
