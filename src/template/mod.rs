// ABOUTME: Template rendering module for templar
// ABOUTME: Source resolution, helper registry and the Handlebars render pipeline

pub mod engine;
pub mod error;
pub mod helpers;
pub mod layout;
pub mod registry;
pub mod source;

pub use engine::{trim_output, Renderer, RendererOptions};
pub use error::{Result, TemplateError};
pub use registry::{Helper, HelperKind, HelperRegistry, Signature};
pub use source::{HttpFileLoader, SourceLoader, TemplateSource};

use serde::Serialize;
use std::sync::OnceLock;

static DEFAULT_RENDERER: OnceLock<Renderer> = OnceLock::new();

/// Process-wide renderer with the built-in helpers and default options
pub fn default_renderer() -> Result<&'static Renderer> {
    if let Some(renderer) = DEFAULT_RENDERER.get() {
        return Ok(renderer);
    }
    let renderer = Renderer::new()?;
    Ok(DEFAULT_RENDERER.get_or_init(|| renderer))
}

/// Render the template at `reference` (path or http(s) URL) against `payload`
pub async fn render<T: Serialize>(reference: &str, payload: &T) -> Result<String> {
    default_renderer()?.render(reference, payload).await
}

/// Render and strip leading/trailing spaces and newlines
pub async fn render_trim<T: Serialize>(reference: &str, payload: &T) -> Result<String> {
    default_renderer()?.render_trim(reference, payload).await
}
