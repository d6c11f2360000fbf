// ABOUTME: Error types for template resolution, compilation and rendering
// ABOUTME: Separates source failures from syntax and execution failures

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to fetch template from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read template file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Template syntax error: {0}")]
    Compile(#[from] handlebars::TemplateError),

    #[error("Template render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Invalid helper registry: {0}")]
    Registry(String),

    #[error("HTTP client error: {0}")]
    Client(#[source] reqwest::Error),
}

impl TemplateError {
    /// True when the template text could not be obtained at all
    pub fn is_source_error(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::FileRead { .. })
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
