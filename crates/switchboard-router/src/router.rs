//! Router: the single entry point for text completions.
//!
//! Walks the health-ranked candidate list, retrying each provider with
//! backoff before failing over to the next. Per-attempt errors are folded
//! into the [`HealthTracker`] and only surface as one terminal
//! [`RouterError`] once every provider and retry is exhausted.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use switchboard_core::config::{Config, RouterSettings};
use switchboard_core::{ChatMessage, Provider, RequestEnvelope};
use switchboard_providers::{
    ProtocolAdapter, ProviderCatalog, ProviderConfig, ProviderError, SecretSource, Transport,
};

use crate::backoff::BackoffPolicy;
use crate::error::RouterError;
use crate::health::{HealthReport, HealthSnapshot, HealthTracker};

const PROBE_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const PROBE_USER_PROMPT: &str = "Say 'OK' if you can respond.";
const PROBE_TEMPERATURE: f64 = 0.1;

// ─────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────

/// Runtime knobs for retries and probing.
#[derive(Clone, Debug, PartialEq)]
pub struct RouterOptions {
    pub backoff: BackoffPolicy,
    /// Upper bound for one health probe, on top of the provider timeout.
    pub probe_timeout: Duration,
    /// Used by [`Router::complete`].
    pub max_retries: u32,
    /// Used by [`Router::complete`].
    pub temperature: f64,
}

impl Default for RouterOptions {
    fn default() -> Self {
        RouterOptions::from(&RouterSettings::default())
    }
}

impl From<&RouterSettings> for RouterOptions {
    fn from(settings: &RouterSettings) -> Self {
        RouterOptions {
            backoff: BackoffPolicy::from(settings),
            probe_timeout: Duration::from_secs(settings.probe_timeout_secs),
            max_retries: settings.max_retries,
            temperature: settings.temperature,
        }
    }
}

/// Result of one health probe.
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeOutcome {
    pub provider: Provider,
    /// `None` when the provider answered.
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ─────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────

/// Cheaply cloneable; clones share the catalog, health state and transport.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

struct RouterInner {
    catalog: ProviderCatalog,
    adapter: ProtocolAdapter,
    health: HealthTracker,
    options: RouterOptions,
}

impl Router {
    /// Build a router without probing anything.
    pub fn new(catalog: ProviderCatalog, transport: Transport, options: RouterOptions) -> Self {
        let health = HealthTracker::new(&catalog);
        Router {
            inner: Arc::new(RouterInner {
                catalog,
                adapter: ProtocolAdapter::new(transport),
                health,
                options,
            }),
        }
    }

    /// Build a router from loaded configuration. Secrets are resolved once, here.
    pub fn from_config(config: &Config, secrets: &dyn SecretSource) -> Result<Self, RouterError> {
        let catalog = ProviderCatalog::from_config(&config.providers, secrets);
        let transport = Transport::new(&config.transport)?;
        Ok(Router::new(catalog, transport, RouterOptions::from(&config.router)))
    }

    /// Build a router and run an initial health probe.
    pub async fn connect(config: &Config, secrets: &dyn SecretSource) -> Result<Self, RouterError> {
        let router = Router::from_config(config, secrets)?;
        router.refresh_health().await;
        let available = router.inner.health.candidates().len();
        info!(
            available,
            total = router.inner.catalog.len(),
            "router initialized"
        );
        Ok(router)
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.inner.catalog
    }

    pub fn options(&self) -> &RouterOptions {
        &self.inner.options
    }

    pub fn health(&self) -> &HealthTracker {
        &self.inner.health
    }

    /// Route with the configured default retries and temperature.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, RouterError> {
        let envelope = RequestEnvelope::new(messages)
            .with_max_retries(self.inner.options.max_retries)
            .with_temperature(self.inner.options.temperature);
        self.route(&envelope).await
    }

    /// Candidate order for one call, with `preferred` moved to the front
    /// when it is currently routable.
    pub fn candidates(&self, preferred: Option<Provider>) -> Vec<Provider> {
        let mut order = self.inner.health.candidates();
        if let Some(pos) = preferred.and_then(|p| order.iter().position(|c| *c == p)) {
            let provider = order.remove(pos);
            order.insert(0, provider);
        }
        order
    }

    /// Produce non-blank text from the best available provider.
    ///
    /// Attempts are strictly sequential. Every attempt updates exactly one
    /// provider's metrics. A blocked response skips the remaining retries
    /// for that provider.
    pub async fn route(&self, envelope: &RequestEnvelope) -> Result<String, RouterError> {
        if envelope.messages.is_empty() {
            return Err(RouterError::EmptyConversation);
        }
        if let Some(preferred) = envelope.preferred_provider {
            self.inner.catalog.config_for(preferred)?;
        }

        let order = self.candidates(envelope.preferred_provider);
        if order.is_empty() {
            warn!("no LLM providers available");
            return Err(RouterError::NoProviderAvailable);
        }

        let retries = envelope.max_retries.max(1);
        let backoff = self.inner.options.backoff;
        let mut attempts = 0u32;
        let mut last_error = None;

        for (index, &provider) in order.iter().enumerate() {
            let is_last_provider = index + 1 == order.len();
            let (config, api_key) = self.resolve(provider)?;

            for attempt in 0..retries {
                attempts += 1;
                let started = Instant::now();
                let outcome = self
                    .inner
                    .adapter
                    .call(config, api_key, &envelope.messages, envelope.temperature)
                    .await;

                let err = match outcome {
                    Ok(text) => {
                        let latency = started.elapsed();
                        self.inner.health.record_success(provider, latency);
                        debug!(
                            provider = %provider,
                            latency_ms = latency.as_millis() as u64,
                            "request succeeded"
                        );
                        return Ok(text);
                    }
                    Err(e) => e,
                };

                self.inner.health.record_failure(provider, &err.to_string());
                warn!(
                    provider = %provider,
                    attempt = attempt + 1,
                    error = %err,
                    "attempt failed"
                );

                let give_up_on_provider = !err.is_retryable() || attempt + 1 == retries;
                last_error = Some(err);

                if !(is_last_provider && give_up_on_provider) {
                    tokio::time::sleep(backoff.delay(attempt)).await;
                }
                if give_up_on_provider {
                    break;
                }
            }
        }

        match last_error {
            Some(last) => {
                error!(attempts, error = %last, "all LLM providers failed");
                Err(RouterError::AllProvidersFailed { attempts, last })
            }
            None => Err(RouterError::NoProviderAvailable),
        }
    }

    fn resolve(&self, provider: Provider) -> Result<(&ProviderConfig, &str), RouterError> {
        let config = self.inner.catalog.config_for(provider)?;
        let api_key = self
            .inner
            .catalog
            .credential_for(provider)?
            .ok_or(RouterError::NoProviderAvailable)?;
        Ok((config, api_key))
    }

    // ── Health ──

    /// Probe every credentialed provider concurrently.
    ///
    /// Each probe runs as its own task under its own timeout, so a hung or
    /// failing provider never delays or cancels the others. Outcomes are
    /// returned in completion order.
    pub async fn refresh_health(&self) -> Vec<ProbeOutcome> {
        let mut probes = JoinSet::new();
        for provider in self.inner.catalog.all_providers() {
            if !self.inner.catalog.has_credential(provider) {
                continue;
            }
            let router = self.clone();
            probes.spawn(async move { router.probe(provider).await });
        }

        let mut outcomes = Vec::with_capacity(probes.len());
        while let Some(joined) = probes.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!(error = %e, "health probe task failed"),
            }
        }
        outcomes
    }

    async fn probe(&self, provider: Provider) -> ProbeOutcome {
        let started = Instant::now();
        let result = match self.resolve(provider) {
            Ok((config, api_key)) => {
                let messages = [
                    ChatMessage::system(PROBE_SYSTEM_PROMPT),
                    ChatMessage::user(PROBE_USER_PROMPT),
                ];
                let call = self
                    .inner
                    .adapter
                    .call(config, api_key, &messages, PROBE_TEMPERATURE);
                tokio::time::timeout(self.inner.options.probe_timeout, call)
                    .await
                    .unwrap_or(Err(ProviderError::Timeout { provider }))
                    .map(|_| ())
            }
            Err(e) => Err(ProviderError::Network {
                provider,
                detail: e.to_string(),
            }),
        };

        let error = result.err().map(|e| e.to_string());
        self.inner.health.record_probe(
            provider,
            match &error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            },
        );

        ProbeOutcome {
            provider,
            error,
            elapsed: started.elapsed(),
        }
    }

    pub fn health_snapshot(&self) -> HealthSnapshot {
        self.inner.health.snapshot()
    }

    /// Probe everything, then summarise.
    pub async fn health_report(&self) -> HealthReport {
        self.refresh_health().await;
        HealthReport::from(self.health_snapshot())
    }

    /// Refuse new provider calls. In-flight calls finish normally.
    pub fn shutdown(&self) {
        self.inner.adapter.transport().close();
        info!("router shut down");
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
