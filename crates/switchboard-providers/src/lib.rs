//! Provider layer for Switchboard.
//!
//! # Architecture
//!
//! - [`registry`]: static defaults for every supported provider
//! - [`catalog::ProviderCatalog`]: resolved configs + credentials, built once
//! - [`protocol::Protocol`]: chat-completions / generate-content translation
//! - [`transport::Transport`]: the single shared, bounded connection pool
//! - [`adapter::ProtocolAdapter`]: one call against one provider

pub mod adapter;
pub mod catalog;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod secrets;
pub mod transport;

// Re-export main types for convenience
pub use adapter::ProtocolAdapter;
pub use catalog::{ProviderCatalog, ProviderConfig};
pub use error::{CatalogError, ProviderError};
pub use protocol::Protocol;
pub use registry::{ProviderSpec, PROVIDERS};
pub use secrets::{EnvSecrets, SecretSource, StaticSecrets};
pub use transport::Transport;
