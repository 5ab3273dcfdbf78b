//! HTTP fetch against the configured origin.
//!
//! ### Request
//! - Single GET, no body, no headers beyond the client defaults
//! - Resource path and query resolved against the origin base address
//! - Redirects follow reqwest's default policy
//!
//! ### Limits
//! - Timeout: 20s (configurable)
//! - Max body bytes: 5MB (configurable)
//!
//! Status, media type and entity tag are passed through untouched; the
//! proxy policy decides what is acceptable.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use reqwest::Url;

use deltaproxy_core::{AppConfig, Error, Upstream, UpstreamResponse};

pub use self::url::{UrlError, canonicalize_origin, resolve};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "deltaproxy/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "deltaproxy/0.1".to_string(), max_bytes: 5 * 1024 * 1024, timeout: Duration::from_millis(20000) }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self { user_agent: config.user_agent.clone(), max_bytes: config.max_bytes, timeout: config.timeout() }
    }
}

/// reqwest-backed [`Upstream`] bound to one origin.
pub struct HttpUpstream {
    http: Client,
    origin: Url,
    config: FetchConfig,
}

impl HttpUpstream {
    /// Create a new upstream for `origin` with the given configuration.
    pub fn new(origin: Url, config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, origin, config })
    }

    fn transport_error(&self, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Transport(format!("upstream timed out after {}ms", self.config.timeout.as_millis()))
        } else {
            Error::Transport(format!("network error: {err}"))
        }
    }

    fn too_large(&self, len: u64) -> Error {
        Error::Transport(format!("{len} bytes exceeds {}", self.config.max_bytes))
    }
}

/// Whether a declared content length is over `max_bytes`. Lengths that do not
/// fit in `usize` always are.
fn exceeds_limit(len: u64, max_bytes: usize) -> bool {
    usize::try_from(len).map_or(true, |len| len > max_bytes)
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, resource: &str) -> Result<UpstreamResponse, Error> {
        let start = Instant::now();
        let url = resolve(&self.origin, resource).map_err(|e| Error::Transport(e.to_string()))?;

        let response = self
            .http
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if let Some(len) = response.content_length()
            && exceeds_limit(len, self.config.max_bytes)
        {
            return Err(self.too_large(len));
        }

        let status = response.status();
        let headers = response.headers().clone();

        let body = response.bytes().await.map_err(|e| self.transport_error(&e))?;

        if body.len() > self.config.max_bytes {
            return Err(self.too_large(body.len() as u64));
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            status.as_u16(),
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(UpstreamResponse { status, headers, body })
    }
}
