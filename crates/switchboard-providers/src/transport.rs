//! Shared HTTP transport: one connection pool for every provider.
//!
//! Concurrency is bounded twice: a global cap on in-flight requests and a
//! per-provider cap. Permits are RAII guards, so they are returned on every
//! exit path including cancellation. [`Transport::close`] refuses all new
//! requests; the pool itself is released when the last clone is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::{debug, info};

use switchboard_core::config::TransportConfig;
use switchboard_core::Provider;

use crate::error::ProviderError;

/// Cheaply cloneable handle to the shared pool.
#[derive(Clone)]
pub struct Transport {
    inner: Arc<TransportInner>,
}

struct TransportInner {
    client: reqwest::Client,
    global: Semaphore,
    per_provider: HashMap<Provider, Semaphore>,
}

/// Both permits held for the duration of one request.
pub(crate) struct InFlight<'a> {
    _global: SemaphorePermit<'a>,
    _provider: SemaphorePermit<'a>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("available", &self.inner.global.available_permits())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Transport {
    /// Build the pool from transport settings.
    pub fn new(config: &TransportConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(config.max_connections_per_provider)
            .build()?;

        debug!(
            max_connections = config.max_connections,
            per_provider = config.max_connections_per_provider,
            "transport ready"
        );

        let per_provider = Provider::ALL
            .into_iter()
            .map(|p| (p, Semaphore::new(config.max_connections_per_provider.max(1))))
            .collect();

        Ok(Transport {
            inner: Arc::new(TransportInner {
                client,
                global: Semaphore::new(config.max_connections.max(1)),
                per_provider,
            }),
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Wait for room to send one request to `provider`.
    pub(crate) async fn acquire(&self, provider: Provider) -> Result<InFlight<'_>, ProviderError> {
        let closed = || ProviderError::Network {
            provider,
            detail: "transport closed".to_string(),
        };

        let global = self.inner.global.acquire().await.map_err(|_| closed())?;
        let per_provider = self.inner.per_provider.get(&provider).ok_or_else(closed)?;
        let provider_permit = per_provider.acquire().await.map_err(|_| closed())?;

        Ok(InFlight {
            _global: global,
            _provider: provider_permit,
        })
    }

    /// Stop accepting requests. In-flight requests run to completion.
    pub fn close(&self) {
        if !self.is_closed() {
            info!("transport closed");
        }
        self.inner.global.close();
        for sem in self.inner.per_provider.values() {
            sem.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.global.is_closed()
    }

    /// Free global request slots right now.
    pub fn available_permits(&self) -> usize {
        self.inner.global.available_permits()
    }
}
