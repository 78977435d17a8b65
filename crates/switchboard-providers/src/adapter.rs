//! Protocol adapter: performs one provider call over the shared transport.
//!
//! Translates the canonical message list into the provider's wire format,
//! sends it with the provider's own timeout, and turns the reply into
//! trimmed text or a typed [`ProviderError`].

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, error, warn};

use switchboard_core::utils::truncate_string;
use switchboard_core::ChatMessage;

use crate::catalog::ProviderConfig;
use crate::error::{ProviderError, ERROR_BODY_LIMIT};
use crate::protocol::AuthStyle;
use crate::transport::Transport;

// ─────────────────────────────────────────────
// ProtocolAdapter
// ─────────────────────────────────────────────

/// Sends requests for any configured provider through one [`Transport`].
#[derive(Clone, Debug)]
pub struct ProtocolAdapter {
    transport: Transport,
}

impl ProtocolAdapter {
    pub fn new(transport: Transport) -> Self {
        ProtocolAdapter { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Call one provider once.
    ///
    /// Returns non-empty, whitespace-trimmed text or the reason it could not.
    pub async fn call(
        &self,
        config: &ProviderConfig,
        api_key: &str,
        messages: &[ChatMessage],
        temperature: f64,
    ) -> Result<String, ProviderError> {
        let provider = config.provider;
        if messages.is_empty() {
            return Err(ProviderError::protocol(provider, "message list is empty"));
        }

        let payload = config.protocol.build_payload(config, messages, temperature);

        debug!(
            provider = %provider,
            model = %config.model,
            protocol = config.protocol.as_str(),
            messages = messages.len(),
            "calling provider"
        );

        // The budget covers waiting for a pool slot, not just the request.
        let (status, body) = tokio::time::timeout(config.timeout, self.send(config, api_key, &payload))
            .await
            .map_err(|_| ProviderError::Timeout { provider })??;

        if status != reqwest::StatusCode::OK {
            error!(
                provider = %provider,
                status = %status,
                body = %body,
                "API error"
            );
            return Err(ProviderError::Http {
                provider,
                status: status.as_u16(),
                body: truncate_string(&body, ERROR_BODY_LIMIT),
            });
        }

        config.protocol.parse_response(config, &body).inspect_err(|e| {
            if let ProviderError::Protocol { .. } = e {
                error!(
                    provider = %provider,
                    body = %truncate_string(&body, ERROR_BODY_LIMIT),
                    "unexpected response"
                );
            }
        })
    }

    /// Acquire permits, send, and read the body.
    async fn send(
        &self,
        config: &ProviderConfig,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<(reqwest::StatusCode, String), ProviderError> {
        let provider = config.provider;
        let _permit = self.transport.acquire(provider).await?;

        let mut request = self
            .transport
            .client()
            .post(&config.endpoint)
            .headers(build_headers(config))
            .json(payload);

        request = match config.protocol.auth_style() {
            AuthStyle::Bearer => request.bearer_auth(api_key),
            AuthStyle::QueryKey => request.query(&[("key", api_key)]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider, &e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(provider, &e))?;
        Ok((status, body))
    }
}

/// Static headers from the config. Invalid entries are skipped.
fn build_headers(config: &ProviderConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (key, value) in &config.extra_headers {
        if let (Ok(name), Ok(val)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, val);
        } else {
            warn!(provider = %config.provider, "Invalid header: {}={}", key, value);
        }
    }
    headers
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
