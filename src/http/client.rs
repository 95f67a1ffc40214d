//! HTTP transport
//!
//! Issues the GET and POST requests of the fetch pipeline:
//! - Query-string parameters for reads, form-encoded bodies for writes
//! - Optional proxy routing
//! - Transparent gzip/deflate decompression of response bodies
//! - Client-side throttling before each request
//!
//! Connection failures are reported as transport [`ApiError`]s. HTTP status codes are
//! not interpreted here; the API puts its own error object in the body.

use super::rate_limit::RateLimiter;
use crate::config::ClientOptions;
use crate::error::{ApiError, Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, Proxy};
use tracing::debug;

/// A completed HTTP exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// URL that produced the response, including the query string
    pub url: String,
    /// Raw response body
    pub body: Bytes,
}

impl TransportResponse {
    /// Check if the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The HTTP capability the fetch pipeline consumes
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` with `params` in the query string
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<TransportResponse>;

    /// POST `params` to `url` as a form-encoded body
    async fn post(&self, url: &str, params: &[(String, String)]) -> Result<TransportResponse>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: Client,
    rate_limiter: Option<RateLimiter>,
}

impl HttpTransport {
    /// Create a transport from client options
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(options.timeout())
            .user_agent(&options.user_agent);

        if let Some(ref proxy) = options.proxy.http {
            builder = builder.proxy(Proxy::http(proxy).map_err(|e| {
                Error::invalid_argument(format!("Invalid http proxy '{proxy}': {e}"))
            })?);
        }
        if let Some(ref proxy) = options.proxy.https {
            builder = builder.proxy(Proxy::https(proxy).map_err(|e| {
                Error::invalid_argument(format!("Invalid https proxy '{proxy}': {e}"))
            })?);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            rate_limiter: options.rate_limit.as_ref().map(RateLimiter::new),
        })
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
    ) -> Result<TransportResponse> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let req = self.client.request(method.clone(), url);
        let req = if method == Method::GET {
            req.query(params)
        } else {
            req.form(params)
        };

        debug!("{} {}", method, url);
        let response = req
            .send()
            .await
            .map_err(|e| ApiError::transport(url, e.to_string()))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(&final_url, e.to_string()))?;

        debug!("{} {} -> {} ({} bytes)", method, final_url, status, body.len());
        Ok(TransportResponse {
            status,
            url: final_url,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, params: &[(String, String)]) -> Result<TransportResponse> {
        self.execute(Method::GET, url, params).await
    }

    async fn post(&self, url: &str, params: &[(String, String)]) -> Result<TransportResponse> {
        self.execute(Method::POST, url, params).await
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
