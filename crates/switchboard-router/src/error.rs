//! Caller-visible routing errors.

use switchboard_core::ParseProviderError;
use switchboard_providers::{CatalogError, ProviderError};
use thiserror::Error;

/// The single terminal error a `route()` call can end with.
///
/// Per-attempt [`ProviderError`]s never escape on their own; they are
/// absorbed until every provider and retry is exhausted.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A provider name or id that is not configured.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// No provider is currently a routing candidate.
    #[error("no LLM providers available")]
    NoProviderAvailable,

    /// The request carried no messages.
    #[error("message list is empty")]
    EmptyConversation,

    /// Every provider/attempt combination failed.
    #[error("all LLM providers failed after {attempts} attempts, last error: {last}")]
    AllProvidersFailed {
        attempts: u32,
        #[source]
        last: ProviderError,
    },

    /// The shared HTTP client could not be built.
    #[error("failed to build HTTP transport: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<CatalogError> for RouterError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownProvider(name) => RouterError::UnknownProvider(name),
        }
    }
}

impl From<ParseProviderError> for RouterError {
    fn from(err: ParseProviderError) -> Self {
        RouterError::UnknownProvider(err.0)
    }
}
