//! Render backend that goes through the relay endpoint.
//!
//! The relay holds the API key server-side, so this backend needs no
//! credential of its own. The request body is the same `{model, contents,
//! config}` shape the relay forwards upstream.

use crate::error::{Result, StudioError};
use crate::relay::RelayRequest;
use crate::render::gemini::{GeminiRequest, GeminiResponse};
use crate::render::provider::RenderProvider;
use crate::render::types::{RenderMetadata, RenderRequest, RenderedImage, MODEL_NAME};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Instant;

/// Builder for [`RelayProvider`].
#[derive(Debug, Clone, Default)]
pub struct RelayProviderBuilder {
    relay_url: Option<String>,
}

impl RelayProviderBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relay base URL (e.g. `http://127.0.0.1:8787`).
    pub fn relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = Some(url.into());
        self
    }

    /// Builds the provider. Falls back to `LOOKSTUDIO_RELAY_URL` env var.
    pub fn build(self) -> Result<RelayProvider> {
        let relay_url = self
            .relay_url
            .or_else(|| std::env::var("LOOKSTUDIO_RELAY_URL").ok())
            .ok_or_else(|| StudioError::Config("relay URL not configured".into()))?;

        Ok(RelayProvider {
            client: reqwest::Client::new(),
            relay_url: relay_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Render backend calling the relay endpoint instead of Gemini directly.
pub struct RelayProvider {
    client: reqwest::Client,
    relay_url: String,
}

/// Error body the relay returns on failure.
#[derive(Debug, Deserialize)]
struct RelayErrorBody {
    error: String,
}

impl RelayProvider {
    /// Creates a new [`RelayProviderBuilder`].
    pub fn builder() -> RelayProviderBuilder {
        RelayProviderBuilder::new()
    }

    async fn render_impl(&self, request: &RenderRequest) -> Result<RenderedImage> {
        request.validate()?;
        let start = Instant::now();

        let wire = GeminiRequest::from_render_request(request);
        let body = RelayRequest {
            model: MODEL_NAME.to_string(),
            contents: serde_json::to_value(&wire.contents)?,
            config: serde_json::to_value(&wire.generation_config)?,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.relay_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(relay_error(status.as_u16(), &text));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        let (data, format) = gemini_response.into_image()?;

        Ok(RenderedImage::new(
            data,
            format,
            RenderMetadata {
                model: Some(MODEL_NAME.to_string()),
                duration_ms: Some(start.elapsed().as_millis() as u64),
            },
        ))
    }
}

/// Maps a relay failure body onto a `StudioError`, surfacing key problems
/// as `Auth`.
fn relay_error(status: u16, text: &str) -> StudioError {
    let message = serde_json::from_str::<RelayErrorBody>(text)
        .map(|b| b.error)
        .unwrap_or_else(|_| text.to_string());
    if message.contains("API Key") || message.contains("401") || message.contains("403") {
        return StudioError::Auth(message);
    }
    StudioError::Api { status, message }
}

#[async_trait]
impl RenderProvider for RelayProvider {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedImage> {
        self.render_impl(request).await
    }

    /// The relay holds the key, so availability means the relay's own key
    /// check passes, not merely that the relay answers.
    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/api/key-check", self.relay_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(relay_error(status.as_u16(), &text));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_requires_url() {
        // Only meaningful when the env fallback is unset.
        if std::env::var("LOOKSTUDIO_RELAY_URL").is_err() {
            assert!(RelayProviderBuilder::new().build().is_err());
        }
    }

    #[test]
    fn test_relay_error_maps_key_messages_to_auth() {
        let err = relay_error(500, r#"{"error":"upstream error 403: API key not valid"}"#);
        assert!(matches!(err, StudioError::Auth(_)));

        let err = relay_error(500, r#"{"error":"upstream error 502: bad gateway"}"#);
        assert!(matches!(err, StudioError::Api { status: 500, .. }));

        // Non-JSON bodies fall back to the raw text.
        let err = relay_error(500, "plain 401 failure");
        assert!(matches!(err, StudioError::Auth(_)));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let provider = RelayProviderBuilder::new()
            .relay_url("http://127.0.0.1:8787/")
            .build()
            .unwrap();
        assert_eq!(provider.relay_url, "http://127.0.0.1:8787");
    }
}
