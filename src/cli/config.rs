// ABOUTME: Configuration management for the templar application
// ABOUTME: Loads YAML configuration and applies environment variable overrides

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::template::RendererOptions;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub template_vars: HashMap<String, String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpConfig {
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_escape_html")]
    pub escape_html: bool,
    #[serde(default)]
    pub trim: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            escape_html: default_escape_html(),
            trim: false,
        }
    }
}

fn default_escape_html() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            serde_yaml::from_str(&contents)?
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("templar.yaml"),
            PathBuf::from("templar.yml"),
            PathBuf::from(".templar.yaml"),
            PathBuf::from(".templar.yml"),
        ];

        // Check current directory
        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        // Check home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".templar").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Return default path (may not exist)
        PathBuf::from("templar.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("TEMPLAR_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("TEMPLAR_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Some(timeout) = lookup("TEMPLAR_HTTP_TIMEOUT") {
            self.http.timeout_secs = Some(timeout.parse()?);
        }
        if let Some(user_agent) = lookup("TEMPLAR_USER_AGENT") {
            self.http.user_agent = Some(user_agent);
        }

        if let Some(escape) = lookup("TEMPLAR_ESCAPE_HTML") {
            self.render.escape_html = escape.parse()?;
        }

        Ok(())
    }

    /// Renderer settings derived from this configuration
    pub fn renderer_options(&self) -> RendererOptions {
        RendererOptions {
            escape_html: self.render.escape_html,
            http_timeout: self.http.timeout_secs.map(Duration::from_secs),
            user_agent: self.http.user_agent.clone(),
        }
    }
}
