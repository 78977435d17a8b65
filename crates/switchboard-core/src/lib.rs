//! Switchboard core: canonical message types, configuration, and helpers
//! shared by the provider and router crates.

pub mod config;
pub mod types;
pub mod utils;

pub use types::{ChatMessage, ParseProviderError, Provider, RequestEnvelope, Role};
