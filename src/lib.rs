// ABOUTME: Main library module for templar
// ABOUTME: Exports the template pipeline and the CLI building blocks

pub mod cli;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use template::{render, render_trim, Renderer, RendererOptions, TemplateError};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
