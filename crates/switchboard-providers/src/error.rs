//! Error types for provider calls and catalog lookups.

use switchboard_core::Provider;
use thiserror::Error;

/// Maximum characters of an error body kept in [`ProviderError::Http`].
pub const ERROR_BODY_LIMIT: usize = 200;

/// Failure of a single call attempt against one provider.
///
/// All variants are absorbed by the router and counted against the
/// provider's health; only the last one surfaces to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The provider answered with a non-200 status.
    #[error("{provider} API error {status}: {body}")]
    Http {
        provider: Provider,
        status: u16,
        /// Response body, truncated to [`ERROR_BODY_LIMIT`] characters.
        body: String,
    },

    /// The body was not valid JSON or lacked the expected structure.
    #[error("{provider} protocol error: {detail}")]
    Protocol { provider: Provider, detail: String },

    /// Provider-side safety/policy filtering refused the request.
    #[error("{provider} blocked request: {reason}")]
    Blocked { provider: Provider, reason: String },

    /// The extracted text was empty or whitespace.
    #[error("empty response from {provider}")]
    EmptyResponse { provider: Provider },

    /// The attempt exceeded its timeout.
    #[error("timeout calling {provider}")]
    Timeout { provider: Provider },

    /// Lower-level transport failure (connect, TLS, closed pool, ...).
    #[error("network error calling {provider}: {detail}")]
    Network { provider: Provider, detail: String },
}

impl ProviderError {
    /// Provider the failed attempt was made against.
    pub fn provider(&self) -> Provider {
        match self {
            ProviderError::Http { provider, .. }
            | ProviderError::Protocol { provider, .. }
            | ProviderError::Blocked { provider, .. }
            | ProviderError::EmptyResponse { provider }
            | ProviderError::Timeout { provider }
            | ProviderError::Network { provider, .. } => *provider,
        }
    }

    /// Whether retrying the same request against the same provider can help.
    ///
    /// A blocked request will be blocked again; everything else may be
    /// transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProviderError::Blocked { .. })
    }

    pub(crate) fn protocol(provider: Provider, detail: impl Into<String>) -> Self {
        ProviderError::Protocol {
            provider,
            detail: detail.into(),
        }
    }

    /// Classify a `reqwest` failure as timeout or network error.
    pub(crate) fn from_reqwest(provider: Provider, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout { provider }
        } else {
            ProviderError::Network {
                provider,
                detail: err.to_string(),
            }
        }
    }
}

/// Catalog lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}
