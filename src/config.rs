//! Client configuration
//!
//! [`ClientOptions`] holds every tunable of a [`StackApi`](crate::StackApi) client.
//! Unset fields take the documented defaults, both when built in code and when
//! loaded from a YAML or JSON file.

use crate::error::{Error, Result, ResultExt};
use crate::http::RateLimiterConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default API version
pub const DEFAULT_VERSION: &str = "2.2";

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com";

/// Largest page size the API accepts on most endpoints
pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Proxy
// ============================================================================

/// HTTP and HTTPS proxy locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy for `http://` URLs
    #[serde(default)]
    pub http: Option<String>,
    /// Proxy for `https://` URLs
    #[serde(default)]
    pub https: Option<String>,
}

impl ProxyConfig {
    /// Route both schemes through the same proxy
    pub fn all(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            http: Some(url.clone()),
            https: Some(url),
        }
    }

    /// Check if no proxy is set
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }
}

// ============================================================================
// Client Options
// ============================================================================

/// Options for a client.
///
/// | field | default |
/// |-------|---------|
/// | `version` | `2.2` |
/// | `base_url` | `https://api.stackexchange.com` |
/// | `proxy` | none |
/// | `max_pages` | 100 |
/// | `page_size` | 100 |
/// | `key` | none |
/// | `access_token` | none |
/// | `timeout_secs` | 30 |
/// | `user_agent` | `stackapi/<crate version>` |
/// | `rate_limit` | 30 requests per second |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// API version segment of every URL
    pub version: String,
    /// API root, without the version
    pub base_url: String,
    /// Proxy routing
    pub proxy: ProxyConfig,
    /// Maximum number of pages a single fetch retrieves
    pub max_pages: u32,
    /// Number of items per page
    pub page_size: u32,
    /// Application key, raises the daily quota
    pub key: Option<String>,
    /// Access token, required for write endpoints
    pub access_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent string
    pub user_agent: String,
    /// Client-side request throttle
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            proxy: ProxyConfig::default(),
            max_pages: 100,
            page_size: MAX_PAGE_SIZE,
            key: None,
            access_token: None,
            timeout_secs: 30,
            user_agent: format!("stackapi/{}", env!("CARGO_PKG_VERSION")),
            rate_limit: Some(RateLimiterConfig::default()),
        }
    }
}

impl ClientOptions {
    /// Create a new options builder
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }

    /// Load options from a YAML or JSON file (chosen by extension, YAML otherwise)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse options from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Root of every endpoint URL: `{base_url}/{version}`
    pub fn api_root(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.version)
    }

    /// Check the options before a client is built
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(Error::invalid_argument("max_pages must be at least 1"));
        }
        if self.page_size == 0 {
            return Err(Error::invalid_argument("page_size must be at least 1"));
        }
        if self.version.trim().is_empty() {
            return Err(Error::invalid_argument("No API version provided"));
        }
        Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_argument(format!("base_url '{}': {e}", self.base_url)))?;
        for proxy in [&self.proxy.http, &self.proxy.https].into_iter().flatten() {
            Url::parse(proxy)
                .map_err(|e| Error::invalid_argument(format!("proxy '{proxy}': {e}")))?;
        }
        if self.page_size > MAX_PAGE_SIZE {
            warn!(
                "page_size {} exceeds the API limit of {} on most endpoints",
                self.page_size, MAX_PAGE_SIZE
            );
        }
        Ok(())
    }
}

/// Builder for client options
#[derive(Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Set the API version
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.options.version = version.into();
        self
    }

    /// Set the API root
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = url.into();
        self
    }

    /// Set the proxy configuration
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.options.proxy = proxy;
        self
    }

    /// Set max pages per fetch
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.options.max_pages = max_pages;
        self
    }

    /// Set the page size
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.options.page_size = page_size;
        self
    }

    /// Set the application key
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.options.key = Some(key.into());
        self
    }

    /// Set the access token
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.options.access_token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout_secs = timeout.as_secs();
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.options.user_agent = agent.into();
        self
    }

    /// Set the request throttle
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.options.rate_limit = Some(config);
        self
    }

    /// Disable the request throttle
    pub fn no_rate_limit(mut self) -> Self {
        self.options.rate_limit = None;
        self
    }

    /// Build the options
    pub fn build(self) -> ClientOptions {
        self.options
    }
}
