//! Per-provider health: rolling metrics, availability hysteresis, ranking.
//!
//! Every completed attempt feeds [`HealthTracker::record_success`] or
//! [`HealthTracker::record_failure`]. The success rate is an exponential
//! moving average; a provider is switched off once it drops below
//! [`DISABLE_BELOW`] and only a successful call pushing it back above
//! [`REENABLE_ABOVE`] switches it on again.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use switchboard_core::Provider;
use switchboard_providers::ProviderCatalog;

/// EMA learning rate.
pub const SUCCESS_RATE_ALPHA: f64 = 0.1;

/// Successful response times kept per provider.
pub const RESPONSE_WINDOW: usize = 100;

/// Success rate under which a provider is disabled (and filtered out).
pub const DISABLE_BELOW: f64 = 0.1;

/// Requests a provider must have seen before it can be disabled.
pub const MIN_REQUESTS_TO_DISABLE: u64 = 5;

/// Success rate a successful call must reach to re-enable a provider.
pub const REENABLE_ABOVE: f64 = 0.5;

/// Weight of the success rate in the composite score.
pub const SCORE_SUCCESS_WEIGHT: f64 = 0.5;

/// Available providers below this rate count as degraded in reports.
pub const DEGRADED_BELOW: f64 = 0.8;

const LOW_SUCCESS_RATE: &str = "Low success rate";
const NO_CREDENTIAL: &str = "API key not found";

// ─────────────────────────────────────────────
// ProviderMetrics
// ─────────────────────────────────────────────

/// Rolling health record for one provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderMetrics {
    /// Latencies of recent successful calls, oldest first.
    pub response_times: VecDeque<Duration>,
    /// EMA of call outcomes, always within `[0, 1]`.
    pub success_rate: f64,
    pub available: bool,
    pub last_error: Option<String>,
    pub total_requests: u64,
    pub successful_requests: u64,
    /// When the last health probe finished.
    pub last_probe: Option<DateTime<Utc>>,
}

/// Availability change caused by one update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    Disabled,
    Reenabled,
}

impl ProviderMetrics {
    /// Fresh metrics: optimistic when credentialed, dead otherwise.
    pub fn new(has_credential: bool) -> Self {
        ProviderMetrics {
            response_times: VecDeque::with_capacity(RESPONSE_WINDOW),
            success_rate: if has_credential { 1.0 } else { 0.0 },
            available: has_credential,
            last_error: (!has_credential).then(|| NO_CREDENTIAL.to_string()),
            total_requests: 0,
            successful_requests: 0,
            last_probe: None,
        }
    }

    /// Fold one attempt outcome in and re-evaluate availability.
    pub fn record(&mut self, success: bool, latency: Duration) -> Option<Transition> {
        self.total_requests += 1;
        if success {
            self.successful_requests += 1;
            if self.response_times.len() == RESPONSE_WINDOW {
                self.response_times.pop_front();
            }
            self.response_times.push_back(latency);
        }

        let point = if success { 1.0 } else { 0.0 };
        self.success_rate = SUCCESS_RATE_ALPHA * point + (1.0 - SUCCESS_RATE_ALPHA) * self.success_rate;

        if self.success_rate < DISABLE_BELOW && self.total_requests > MIN_REQUESTS_TO_DISABLE {
            let was_available = self.available;
            self.available = false;
            self.last_error = Some(LOW_SUCCESS_RATE.to_string());
            was_available.then_some(Transition::Disabled)
        } else if success && !self.available && self.success_rate > REENABLE_ABOVE {
            self.available = true;
            self.last_error = None;
            Some(Transition::Reenabled)
        } else {
            None
        }
    }

    pub fn avg_response_time(&self) -> Option<Duration> {
        let n = self.response_times.len() as u32;
        (n > 0).then(|| self.response_times.iter().sum::<Duration>() / n)
    }

    pub fn min_response_time(&self) -> Option<Duration> {
        self.response_times.iter().min().copied()
    }

    pub fn max_response_time(&self) -> Option<Duration> {
        self.response_times.iter().max().copied()
    }
}

// ─────────────────────────────────────────────
// HealthTracker
// ─────────────────────────────────────────────

struct Tracked {
    provider: Provider,
    priority: u32,
    has_credential: bool,
    metrics: Mutex<ProviderMetrics>,
}

/// Exactly one [`ProviderMetrics`] per configured provider, each behind its
/// own lock.
pub struct HealthTracker {
    tracked: Vec<Tracked>,
}

impl HealthTracker {
    pub fn new(catalog: &ProviderCatalog) -> Self {
        let tracked = catalog
            .configs()
            .map(|config| {
                let has_credential = catalog.has_credential(config.provider);
                Tracked {
                    provider: config.provider,
                    priority: config.priority,
                    has_credential,
                    metrics: Mutex::new(ProviderMetrics::new(has_credential)),
                }
            })
            .collect();
        HealthTracker { tracked }
    }

    fn with_metrics<R>(&self, provider: Provider, f: impl FnOnce(&mut ProviderMetrics) -> R) -> Option<R> {
        let tracked = self.tracked.iter().find(|t| t.provider == provider)?;
        let mut metrics = tracked.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut metrics))
    }

    /// Record a successful call and its latency.
    pub fn record_success(&self, provider: Provider, latency: Duration) {
        let transition = self.with_metrics(provider, |m| m.record(true, latency)).flatten();
        log_transition(provider, transition);
    }

    /// Record a failed call attempt.
    pub fn record_failure(&self, provider: Provider, error: &str) {
        let transition = self
            .with_metrics(provider, |m| {
                m.last_error = Some(error.to_string());
                m.record(false, Duration::ZERO)
            })
            .flatten();
        log_transition(provider, transition);
    }

    /// Record a health probe. Touches availability and `last_error` only.
    pub fn record_probe(&self, provider: Provider, outcome: Result<(), String>) {
        self.with_metrics(provider, |m| {
            m.last_probe = Some(Utc::now());
            match outcome {
                Ok(()) => {
                    m.available = true;
                    m.last_error = None;
                }
                Err(e) => {
                    debug!(provider = %provider, error = %e, "health check failed");
                    m.available = false;
                    m.last_error = Some(e);
                }
            }
        });
    }

    /// Copy of one provider's metrics.
    pub fn metrics(&self, provider: Provider) -> Option<ProviderMetrics> {
        self.with_metrics(provider, |m| m.clone())
    }

    pub fn has_credential(&self, provider: Provider) -> bool {
        self.tracked
            .iter()
            .any(|t| t.provider == provider && t.has_credential)
    }

    /// Routable providers, best first.
    ///
    /// A candidate has a credential, is available, and has a success rate
    /// above [`DISABLE_BELOW`]. Ranking is a stable ascending sort on
    /// `priority - success_rate * 0.5`, so ties keep configuration order.
    pub fn candidates(&self) -> Vec<Provider> {
        let mut scored: Vec<(Provider, f64)> = self
            .tracked
            .iter()
            .filter(|t| t.has_credential)
            .filter_map(|t| {
                let m = t.metrics.lock().unwrap_or_else(PoisonError::into_inner);
                (m.available && m.success_rate > DISABLE_BELOW)
                    .then(|| (t.provider, composite_score(t.priority, m.success_rate)))
            })
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.into_iter().map(|(p, _)| p).collect()
    }

    /// Point-in-time view of every provider, in configuration order.
    pub fn snapshot(&self) -> HealthSnapshot {
        let providers = self
            .tracked
            .iter()
            .map(|t| {
                let m = t.metrics.lock().unwrap_or_else(PoisonError::into_inner);
                ProviderHealth::from_metrics(t.provider, t.has_credential, &m)
            })
            .collect();
        HealthSnapshot { providers }
    }
}

/// Lower is better.
pub fn composite_score(priority: u32, success_rate: f64) -> f64 {
    f64::from(priority) - success_rate * SCORE_SUCCESS_WEIGHT
}

fn log_transition(provider: Provider, transition: Option<Transition>) {
    match transition {
        Some(Transition::Disabled) => {
            warn!(provider = %provider, "Marking provider as unavailable due to low success rate")
        }
        Some(Transition::Reenabled) => {
            info!(provider = %provider, "Re-enabling provider due to improved success rate")
        }
        None => {}
    }
}

// ─────────────────────────────────────────────
// Snapshots & reports
// ─────────────────────────────────────────────

/// Observability view of one provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProviderHealth {
    pub provider: Provider,
    pub available: bool,
    pub has_credential: bool,
    pub success_rate: f64,
    pub avg_response_time_ms: Option<f64>,
    pub min_response_time_ms: Option<f64>,
    pub max_response_time_ms: Option<f64>,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub last_error: Option<String>,
    pub last_probe: Option<DateTime<Utc>>,
}

impl ProviderHealth {
    fn from_metrics(provider: Provider, has_credential: bool, m: &ProviderMetrics) -> Self {
        let ms = |d: Option<Duration>| d.map(|d| d.as_secs_f64() * 1000.0);
        ProviderHealth {
            provider,
            available: m.available,
            has_credential,
            success_rate: m.success_rate,
            avg_response_time_ms: ms(m.avg_response_time()),
            min_response_time_ms: ms(m.min_response_time()),
            max_response_time_ms: ms(m.max_response_time()),
            total_requests: m.total_requests,
            successful_requests: m.successful_requests,
            last_error: m.last_error.clone(),
            last_probe: m.last_probe,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.available && self.success_rate < DEGRADED_BELOW
    }
}

/// Health of every provider, in configuration order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthSnapshot {
    pub providers: Vec<ProviderHealth>,
}

impl HealthSnapshot {
    pub fn get(&self, provider: Provider) -> Option<&ProviderHealth> {
        self.providers.iter().find(|p| p.provider == provider)
    }
}

/// Overall system verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Summary for monitoring consumers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub total_providers: usize,
    pub available_providers: usize,
    pub degraded_providers: usize,
    pub providers: Vec<ProviderHealth>,
}

impl From<HealthSnapshot> for HealthReport {
    fn from(snapshot: HealthSnapshot) -> Self {
        let total = snapshot.providers.len();
        let available = snapshot.providers.iter().filter(|p| p.available).count();
        let degraded = snapshot.providers.iter().filter(|p| p.is_degraded()).count();

        let status = if available == 0 {
            OverallStatus::Unhealthy
        } else if (available as f64) < total as f64 * 0.5 || degraded > 0 {
            OverallStatus::Degraded
        } else {
            OverallStatus::Healthy
        };

        HealthReport {
            status,
            total_providers: total,
            available_providers: available,
            degraded_providers: degraded,
            providers: snapshot.providers,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
