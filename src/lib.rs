#![warn(missing_docs)]
//! LookStudio - stylized studio renders from reference images.
//!
//! This crate drives an operator-facing render studio: an authenticated
//! operator uploads reference images, the studio asks the Gemini image API
//! for a stylized render, and the result comes back as a downloadable image.
//!
//! # Quick Start
//!
//! ```no_run
//! use lookstudio::render::{GeminiProvider, Mode, ReferenceImage, RenderProvider, RenderRequest};
//!
//! #[tokio::main]
//! async fn main() -> lookstudio::Result<()> {
//!     let provider = GeminiProvider::builder().build()?;
//!     let photo = ReferenceImage::from_bytes(std::fs::read("sneaker.png")?)?;
//!     let request = RenderRequest::new(Mode::Single).with_reference(photo);
//!     let image = provider.render(&request).await?;
//!     image.save("render.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Layout
//!
//! - [`render`]: generation client, provider trait, Gemini and relay backends.
//! - [`relay`]: the server-side pass-through endpoint holding the API key.
//! - [`session`]: the login / credential-gate / dashboard / generator state
//!   machine, plus the persisted auth flag.
//! - [`studio`]: selection clamping and per-mode generator interaction state.
//! - [`auth`]: pluggable login verification.
//! - [`config`]: file + environment configuration.

mod error;

pub mod auth;
pub mod config;
pub mod relay;
pub mod render;
pub mod session;
pub mod studio;

pub use error::{Result, StudioError};

// Re-export the types most callers need at the crate root.
pub use config::StudioConfig;
pub use render::{
    GeminiProvider, Mode, ReferenceImage, RenderProvider, RenderRequest, RenderedImage, Renderer,
};
pub use session::{Session, Stage, View};
pub use studio::{clamp_selection, Workbench};
