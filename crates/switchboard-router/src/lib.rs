//! Health-aware failover routing across LLM providers.
//!
//! # Architecture
//!
//! - [`health::HealthTracker`]: per-provider EMA success rate, latency window, hysteresis
//! - [`backoff::BackoffPolicy`]: exponential backoff with jitter
//! - [`router::Router`]: sequential failover, concurrent health probes
//! - [`monitor::HealthMonitor`]: periodic probe cycles

pub mod backoff;
pub mod error;
pub mod health;
pub mod monitor;
pub mod router;

pub use backoff::BackoffPolicy;
pub use error::RouterError;
pub use health::{HealthReport, HealthSnapshot, HealthTracker, OverallStatus, ProviderHealth, ProviderMetrics};
pub use monitor::{HealthMonitor, OnCycleFn};
pub use router::{ProbeOutcome, Router, RouterOptions};
