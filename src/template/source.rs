// ABOUTME: Resolves a template reference to raw template text
// ABOUTME: http(s) URLs are fetched over HTTP, everything else is read from disk

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::{ParseError, Url};

use super::error::{Result, TemplateError};

/// Where a template reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Remote(Url),
    Local(PathBuf),
}

impl TemplateSource {
    /// Classify a reference. It is parsed as a URL first; only `http` and
    /// `https` are remote. Any other scheme, or a scheme-less relative
    /// reference, uses the decoded path component. A reference that does not
    /// parse at all is used verbatim.
    pub fn parse(reference: &str) -> Self {
        match Url::parse(reference) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            Ok(url) => {
                let path = decoded_path(url.path()).unwrap_or_else(|| url.path().to_string());
                Self::Local(PathBuf::from(path))
            }
            Err(ParseError::RelativeUrlWithoutBase) => {
                let path = reference
                    .split(|c: char| c == '?' || c == '#')
                    .next()
                    .unwrap_or(reference);
                match decoded_path(path) {
                    Some(path) => Self::Local(PathBuf::from(path)),
                    None => Self::Local(PathBuf::from(reference)),
                }
            }
            Err(_) => Self::Local(PathBuf::from(reference)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Percent-decode a URL path. None for a malformed `%` escape or a result
/// that is not UTF-8.
fn decoded_path(path: &str) -> Option<String> {
    let bytes = path.as_bytes();
    let well_formed = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
    });
    if !well_formed {
        return None;
    }

    urlencoding::decode(path).ok().map(|p| p.into_owned())
}

/// Fetches template text for a resolved source.
#[async_trait]
pub trait SourceLoader: Send + Sync {
    async fn load(&self, source: &TemplateSource) -> Result<String>;
}

/// Default loader: reqwest for remote sources, tokio::fs for local ones.
#[derive(Debug, Clone)]
pub struct HttpFileLoader {
    client: reqwest::Client,
}

impl HttpFileLoader {
    pub fn new(timeout: Option<Duration>, user_agent: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = user_agent {
            builder = builder.user_agent(user_agent.to_string());
        }

        let client = builder.build().map_err(TemplateError::Client)?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        let fetch_error = |source: reqwest::Error| TemplateError::Fetch {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(fetch_error)?;

        // The body is the template whatever the status code says.
        debug!("Fetched template {} with status {}", url, response.status());
        response.text().await.map_err(fetch_error)
    }

    async fn read(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TemplateError::FileRead {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl SourceLoader for HttpFileLoader {
    async fn load(&self, source: &TemplateSource) -> Result<String> {
        debug!("Loading template from {}", source);
        match source {
            TemplateSource::Remote(url) => self.fetch(url).await,
            TemplateSource::Local(path) => self.read(path).await,
        }
    }
}
