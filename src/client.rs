//! The API client
//!
//! [`StackApi`] ties a validated [`ClientOptions`], a transport, and an optional
//! site binding together and exposes the read ([`StackApi::fetch`]) and write
//! ([`StackApi::send`]) calls.
//!
//! The client remembers the endpoint and URL of its most recent call for
//! diagnostics. Calls made concurrently through a shared client overwrite each
//! other's record (last writer wins); every [`AggregatedResult`] and [`ApiError`]
//! also carries its own URL.
//!
//! [`ApiError`]: crate::error::ApiError

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::http::{HttpTransport, Transport};
use crate::pagination::{AggregatedResult, FetchRequest, Paginator, Sleeper};
use crate::site::{self, Site};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct CallLog {
    endpoint: Option<String>,
    url: Option<String>,
}

/// Client for one site of the network
pub struct StackApi {
    paginator: Paginator,
    options: ClientOptions,
    site: Option<Site>,
    calls: Mutex<CallLog>,
}

impl StackApi {
    /// Connect to `site` using API `version`.
    ///
    /// Looks the site up in the network's site directory, which costs at least
    /// one request of quota.
    pub async fn new(site: &str, version: &str, options: ClientOptions) -> Result<Self> {
        let options = ClientOptions {
            version: version.to_string(),
            ..options
        };
        Self::network(options)?.bind(site).await
    }

    /// Create a client not bound to any site, for network-wide endpoints
    pub fn network(options: ClientOptions) -> Result<Self> {
        options.validate()?;
        let transport = Arc::new(HttpTransport::new(&options)?);
        Self::with_transport(options, transport)
    }

    /// Create an unbound client over a custom transport
    pub fn with_transport(options: ClientOptions, transport: Arc<dyn Transport>) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            paginator: Paginator::new(&options, transport),
            options,
            site: None,
            calls: Mutex::new(CallLog::default()),
        })
    }

    /// Replace the sleeper used for backoff
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.paginator.set_sleeper(sleeper);
        self
    }

    /// Bind the client to a site, resolving its name through the site directory
    pub async fn bind(mut self, identifier: &str) -> Result<Self> {
        let resolved = self
            .record(site::SITES_ENDPOINT, site::resolve(&self.paginator, identifier))
            .await?;
        self.paginator.set_site(resolved.api_site_parameter.clone());
        self.site = Some(resolved);
        Ok(self)
    }

    /// Read an endpoint, following pages up to `max_pages`
    pub async fn fetch(&self, request: impl Into<FetchRequest>) -> Result<AggregatedResult> {
        let request = request.into();
        let result = self
            .record(&request.endpoint, self.paginator.fetch(&request))
            .await?;
        self.set_last_url(&result.url);
        Ok(result)
    }

    /// Write to an endpoint with a single POST.
    ///
    /// Write endpoints need an access token with write scope; the API rejects the
    /// call otherwise.
    pub async fn send(&self, request: impl Into<FetchRequest>) -> Result<AggregatedResult> {
        let request = request.into();
        let result = self
            .record(&request.endpoint, self.paginator.send(&request))
            .await?;
        self.set_last_url(&result.url);
        Ok(result)
    }

    /// List every site of the network
    pub async fn sites(&self) -> Result<Vec<Site>> {
        self.fetch(site::sites_request()).await?.items_as()
    }

    /// The bound site
    pub fn site(&self) -> Option<&Site> {
        self.site.as_ref()
    }

    /// Display name of the bound site
    pub fn name(&self) -> Option<&str> {
        self.site.as_ref().map(|s| s.name.as_str())
    }

    /// Key fragment of the bound site
    pub fn api_key(&self) -> Option<&str> {
        self.paginator.site()
    }

    /// API version
    pub fn version(&self) -> &str {
        &self.options.version
    }

    /// The options this client was built with
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Endpoint of the most recent call
    pub fn last_endpoint(&self) -> Option<String> {
        self.calls().endpoint.clone()
    }

    /// URL of the most recent request
    pub fn last_url(&self) -> Option<String> {
        self.calls().url.clone()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, CallLog> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_last_url(&self, url: &str) {
        self.calls().url = Some(url.to_string());
    }

    async fn record<T>(
        &self,
        endpoint: &str,
        call: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        self.calls().endpoint = Some(endpoint.to_string());
        let outcome = call.await;
        if let Err(Error::Api(ref err)) = outcome {
            self.set_last_url(&err.url);
        }
        outcome
    }
}

impl From<&str> for FetchRequest {
    fn from(endpoint: &str) -> Self {
        FetchRequest::new(endpoint)
    }
}

impl From<String> for FetchRequest {
    fn from(endpoint: String) -> Self {
        FetchRequest::new(endpoint)
    }
}

impl fmt::Display for StackApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let calls = self.calls();
        write!(
            f,
            "<{}> v:<{}> endpoint: {}  Last URL: {}",
            self.name().unwrap_or("None"),
            self.options.version,
            calls.endpoint.as_deref().unwrap_or("None"),
            calls.url.as_deref().unwrap_or("None")
        )
    }
}

impl fmt::Debug for StackApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackApi")
            .field("site", &self.site)
            .field("version", &self.options.version)
            .field("paginator", &self.paginator)
            .finish_non_exhaustive()
    }
}
