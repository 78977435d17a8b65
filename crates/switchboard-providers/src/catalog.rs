//! Provider catalog: resolved, immutable per-provider configuration.
//!
//! Built once at startup from the registry defaults, user overrides, and a
//! [`SecretSource`]. Secrets are resolved here and never again; a provider
//! without a credential stays in the catalog but is never routed to.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use switchboard_core::config::{ProviderOverrides, ProvidersConfig};
use switchboard_core::Provider;

use crate::error::CatalogError;
use crate::protocol::Protocol;
use crate::registry::{ProviderSpec, PROVIDERS};
use crate::secrets::SecretSource;

// ─────────────────────────────────────────────
// ProviderConfig
// ─────────────────────────────────────────────

/// Everything needed to call one provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub display_name: String,
    pub endpoint: String,
    pub model: String,
    /// Name of the secret holding the API key.
    pub api_key_env: String,
    /// Lower is preferred.
    pub priority: u32,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub protocol: Protocol,
    pub top_p: f64,
    pub extra_headers: BTreeMap<String, String>,
    pub extra_params: Map<String, Value>,
    pub enabled: bool,
}

impl ProviderConfig {
    /// Defaults for a provider, straight from its registry spec.
    pub fn from_spec(spec: &ProviderSpec) -> Self {
        ProviderConfig {
            provider: spec.provider,
            display_name: spec.display_name.to_string(),
            endpoint: spec.endpoint.to_string(),
            model: spec.model.to_string(),
            api_key_env: spec.env_key.to_string(),
            priority: spec.priority,
            timeout: Duration::from_secs(spec.timeout_secs),
            max_tokens: spec.max_tokens,
            protocol: spec.protocol,
            top_p: spec.top_p,
            extra_headers: spec
                .extra_headers
                .iter()
                .map(|(name, source)| (name.to_string(), source.resolve()))
                .collect(),
            extra_params: spec
                .extra_params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_json()))
                .collect(),
            enabled: true,
        }
    }

    /// Layer user overrides on top of these settings.
    pub fn with_overrides(mut self, overrides: &ProviderOverrides) -> Self {
        if let Some(ref base) = overrides.api_base {
            self.endpoint = base.clone();
        }
        if let Some(ref model) = overrides.model {
            self.model = model.clone();
        }
        if let Some(ref env) = overrides.api_key_env {
            self.api_key_env = env.clone();
        }
        if let Some(priority) = overrides.priority {
            self.priority = priority;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(max_tokens) = overrides.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(ref headers) = overrides.extra_headers {
            for (name, value) in headers {
                self.extra_headers.insert(name.clone(), value.clone());
            }
        }
        self.enabled = overrides.enabled;
        self
    }
}

// ─────────────────────────────────────────────
// ProviderCatalog
// ─────────────────────────────────────────────

struct CatalogEntry {
    config: ProviderConfig,
    credential: Option<String>,
}

/// Immutable lookup table of configured providers, in configuration order.
pub struct ProviderCatalog {
    entries: Vec<CatalogEntry>,
}

impl fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for entry in &self.entries {
            list.entry(&(
                entry.config.provider,
                &entry.config.endpoint,
                entry.credential.is_some(),
            ));
        }
        list.finish()
    }
}

impl ProviderCatalog {
    /// Build a catalog from explicit configs, resolving each secret once.
    ///
    /// Disabled providers are kept but get no credential. A provider listed
    /// twice keeps its first entry.
    pub fn new(configs: Vec<ProviderConfig>, secrets: &dyn SecretSource) -> Self {
        let mut seen = HashSet::new();
        let entries = configs
            .into_iter()
            .filter(|config| {
                let first = seen.insert(config.provider);
                if !first {
                    warn!(provider = %config.provider, "duplicate provider entry ignored");
                }
                first
            })
            .map(|config| {
                let credential = if config.enabled {
                    secrets.resolve(&config.api_key_env)
                } else {
                    None
                };
                if credential.is_none() {
                    warn!(
                        provider = %config.provider,
                        secret = %config.api_key_env,
                        enabled = config.enabled,
                        "no credential, provider will not be used"
                    );
                } else {
                    debug!(provider = %config.provider, endpoint = %config.endpoint, "provider configured");
                }
                CatalogEntry { config, credential }
            })
            .collect();
        ProviderCatalog { entries }
    }

    /// Build the standard catalog: registry defaults + user overrides.
    pub fn from_config(providers: &ProvidersConfig, secrets: &dyn SecretSource) -> Self {
        let configs = PROVIDERS
            .iter()
            .map(|spec| ProviderConfig::from_spec(spec).with_overrides(providers.get(spec.provider)))
            .collect();
        Self::new(configs, secrets)
    }

    fn entry(&self, provider: Provider) -> Result<&CatalogEntry, CatalogError> {
        self.entries
            .iter()
            .find(|e| e.config.provider == provider)
            .ok_or_else(|| CatalogError::UnknownProvider(provider.to_string()))
    }

    /// Configuration for a provider.
    pub fn config_for(&self, provider: Provider) -> Result<&ProviderConfig, CatalogError> {
        self.entry(provider).map(|e| &e.config)
    }

    /// Resolved credential for a provider, if it has one.
    pub fn credential_for(&self, provider: Provider) -> Result<Option<&str>, CatalogError> {
        self.entry(provider).map(|e| e.credential.as_deref())
    }

    /// Whether a provider has a usable credential. Unknown providers have none.
    pub fn has_credential(&self, provider: Provider) -> bool {
        self.entry(provider)
            .map(|e| e.credential.is_some())
            .unwrap_or(false)
    }

    /// All configured providers, in configuration order.
    pub fn all_providers(&self) -> Vec<Provider> {
        self.entries.iter().map(|e| e.config.provider).collect()
    }

    /// All configs, in configuration order.
    pub fn configs(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.entries.iter().map(|e| &e.config)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
