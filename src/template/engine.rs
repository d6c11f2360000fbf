// ABOUTME: Render pipeline built on Handlebars
// ABOUTME: Resolves the template source, compiles it, executes it and optionally trims

use handlebars::{Context, Handlebars, RenderContext, Renderable, StringOutput, Template};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::error::Result;
use super::registry::HelperRegistry;
use super::source::{HttpFileLoader, SourceLoader, TemplateSource};

/// Engine and transport settings for a [`Renderer`].
#[derive(Debug, Clone)]
pub struct RendererOptions {
    /// HTML-escape `{{value}}` and inline helper output. `{{{value}}}` is
    /// never escaped.
    pub escape_html: bool,
    /// Overall timeout for fetching remote templates. None means no limit.
    pub http_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            escape_html: true,
            http_timeout: None,
            user_agent: None,
        }
    }
}

/// Renders templates against payloads with a fixed helper registry.
///
/// A renderer holds no per-render state, so a single instance can be shared
/// across tasks.
#[derive(Clone)]
pub struct Renderer {
    handlebars: Handlebars<'static>,
    registry: HelperRegistry,
    loader: Arc<dyn SourceLoader>,
}

impl Renderer {
    /// Create a renderer with the built-in helpers and default options
    pub fn new() -> Result<Self> {
        Self::with_options(RendererOptions::default())
    }

    pub fn with_options(options: RendererOptions) -> Result<Self> {
        let loader = HttpFileLoader::new(options.http_timeout, options.user_agent.as_deref())?;
        Self::with_loader(options, HelperRegistry::builtin()?, Arc::new(loader))
    }

    /// Create a renderer with an explicit registry and source loader
    pub fn with_loader(
        options: RendererOptions,
        registry: HelperRegistry,
        loader: Arc<dyn SourceLoader>,
    ) -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Missing payload paths render as empty
        handlebars.set_strict_mode(false);
        handlebars.set_dev_mode(false);

        if !options.escape_html {
            handlebars.register_escape_fn(handlebars::no_escape);
        }

        registry.install(&mut handlebars);

        Ok(Self {
            handlebars,
            registry,
            loader,
        })
    }

    pub fn registry(&self) -> &HelperRegistry {
        &self.registry
    }

    /// Resolve `reference`, then render it against `payload`
    pub async fn render<T: Serialize>(&self, reference: &str, payload: &T) -> Result<String> {
        let text = self.resolve(reference).await?;
        self.render_str(&text, payload)
    }

    /// Like [`Renderer::render`], with leading and trailing spaces and
    /// newlines removed
    pub async fn render_trim<T: Serialize>(&self, reference: &str, payload: &T) -> Result<String> {
        let out = self.render(reference, payload).await?;
        Ok(trim_output(&out).to_string())
    }

    /// Render template text that has already been resolved
    pub fn render_str<T: Serialize>(&self, text: &str, payload: &T) -> Result<String> {
        let template = self.compile(text)?;
        let ctx = Context::wraps(payload)?;
        let mut rc = RenderContext::new(None);
        let mut out = StringOutput::new();
        template.render(&self.handlebars, &ctx, &mut rc, &mut out)?;

        let out = out
            .into_string()
            .map_err(handlebars::RenderError::from)?;
        debug!("Rendered template, {} characters", out.len());
        Ok(out)
    }

    pub fn render_str_trim<T: Serialize>(&self, text: &str, payload: &T) -> Result<String> {
        let out = self.render_str(text, payload)?;
        Ok(trim_output(&out).to_string())
    }

    /// Resolve and compile without executing
    pub async fn check(&self, reference: &str) -> Result<()> {
        let text = self.resolve(reference).await?;
        self.compile(&text)?;
        Ok(())
    }

    /// Fetch the raw template text a reference points at
    pub async fn resolve(&self, reference: &str) -> Result<String> {
        let source = TemplateSource::parse(reference);
        debug!(
            "Resolved template reference {} as {} source",
            reference,
            if source.is_remote() { "remote" } else { "local" }
        );
        self.loader.load(&source).await
    }

    fn compile(&self, text: &str) -> Result<Template> {
        Ok(Template::compile(text)?)
    }
}

/// Strip ASCII spaces and newlines from both ends. Other whitespace such as
/// tabs and carriage returns is kept.
pub fn trim_output(out: &str) -> &str {
    out.trim_matches(|c: char| c == ' ' || c == '\n')
}
