//! Render provider trait.

use crate::error::Result;
use crate::render::types::{RenderRequest, RenderedImage};
use async_trait::async_trait;

/// Trait for render backends.
///
/// A render is a single attempt: implementations must not retry, and any
/// timeout is whatever the underlying transport imposes. Every failure is
/// terminal for that invocation.
#[async_trait]
pub trait RenderProvider: Send + Sync {
    /// Renders an image from the given request.
    async fn render(&self, request: &RenderRequest) -> Result<RenderedImage>;

    /// Checks that a usable API key is connected.
    ///
    /// This is the credential-availability probe the session gate runs after
    /// login before showing the dashboard.
    async fn health_check(&self) -> Result<()>;
}
