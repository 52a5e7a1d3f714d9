//! Render generation module.

pub(crate) mod gemini;
mod provider;
mod relay_client;
mod types;

pub use gemini::{GeminiProvider, GeminiProviderBuilder};
pub use provider::RenderProvider;
pub use relay_client::{RelayProvider, RelayProviderBuilder};
pub use types::{
    ImageFormat, Mode, ReferenceImage, RenderMetadata, RenderRequest, RenderedImage, MODEL_NAME,
};

use crate::error::{Result, StudioError};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Wraps a provider and enforces the one-outstanding-render-per-session
/// contract.
///
/// The UI disables its generate action while a request is in flight; this
/// guard makes the same rule explicit at the API boundary. A second call
/// while one render is outstanding fails fast with [`StudioError::Busy`]
/// rather than queueing.
pub struct Renderer {
    provider: Arc<dyn RenderProvider>,
    in_flight: Semaphore,
}

impl Renderer {
    /// Creates a renderer around the given provider.
    pub fn new(provider: Arc<dyn RenderProvider>) -> Self {
        Self {
            provider,
            in_flight: Semaphore::new(1),
        }
    }

    /// Renders the request, single attempt, no timeout, no retry.
    pub async fn render(&self, request: &RenderRequest) -> Result<RenderedImage> {
        let _permit = self.in_flight.try_acquire().map_err(|_| StudioError::Busy)?;
        self.provider.render(request).await
    }

    /// Probes whether a usable API key is connected.
    pub async fn key_available(&self) -> bool {
        self.provider.health_check().await.is_ok()
    }
}
