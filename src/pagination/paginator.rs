//! Sequential page retrieval
//!
//! A read walks pages with GET requests until the API reports `has_more = false`
//! or `max_pages` requests were issued, sleeping whenever a page asks for backoff.
//! A write is a single form-encoded POST.

use super::types::{
    param_text, AggregatedResult, FetchRequest, PreparedRequest, ResponseEnvelope, IDS_PARAM,
};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::http::Transport;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Placeholders an endpoint may use to position its ids
const ID_PLACEHOLDERS: [&str; 2] = ["{ids}", "{}"];

/// Something that can pause the pipeline
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Pause for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Builds requests and walks pages for one client
pub struct Paginator {
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    api_root: String,
    page_size: u32,
    max_pages: u32,
    key: Option<String>,
    access_token: Option<String>,
    site: Option<String>,
}

impl Paginator {
    /// Create a paginator over a transport.
    ///
    /// `options` must have passed [`ClientOptions::validate`].
    pub fn new(options: &ClientOptions, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            sleeper: Arc::new(TokioSleeper),
            api_root: options.api_root(),
            page_size: options.page_size,
            max_pages: options.max_pages.max(1),
            key: options.key.clone(),
            access_token: options.access_token.clone(),
            site: None,
        }
    }

    /// Replace the sleeper used for backoff
    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    /// Send the `site` parameter on every request
    pub fn set_site(&mut self, site: impl Into<String>) {
        self.site = Some(site.into());
    }

    /// The bound site key fragment
    pub fn site(&self) -> Option<&str> {
        self.site.as_deref()
    }

    /// Resolve the URL and parameters of a request
    pub fn prepare(&self, request: &FetchRequest) -> Result<PreparedRequest> {
        let endpoint = request.endpoint.trim_matches('/');
        if endpoint.is_empty() {
            return Err(Error::invalid_argument("No end point provided"));
        }

        let mut params = BTreeMap::new();
        params.insert("pagesize".to_string(), self.page_size.to_string());
        params.insert("filter".to_string(), request.filter.clone());
        if let Some(ref key) = self.key {
            params.insert("key".to_string(), key.clone());
        }
        if let Some(ref token) = self.access_token {
            params.insert("access_token".to_string(), token.clone());
        }

        let mut ids = None;
        for (name, value) in &request.params {
            if name == IDS_PARAM {
                ids = param_text(value).filter(|ids| !ids.is_empty());
            } else if name != "page" {
                if let Some(text) = param_text(value) {
                    params.insert(name.clone(), text);
                }
            }
        }

        if let Some(ref site) = self.site {
            params.insert("site".to_string(), site.clone());
        }

        Ok(PreparedRequest {
            url: self.endpoint_url(endpoint, ids.as_deref())?,
            page: request.page,
            params,
        })
    }

    fn endpoint_url(&self, endpoint: &str, ids: Option<&str>) -> Result<String> {
        let placeholder = ID_PLACEHOLDERS.iter().find(|p| endpoint.contains(*p));
        match (placeholder, ids) {
            (Some(placeholder), Some(ids)) => Ok(format!(
                "{}/{}/",
                self.api_root,
                endpoint.replacen(placeholder, ids, 1)
            )),
            (Some(_), None) => Err(Error::invalid_argument(format!(
                "End point '{endpoint}' requires ids"
            ))),
            (None, Some(ids)) => Ok(format!("{}/{endpoint}/{ids}", self.api_root)),
            (None, None) => Ok(format!("{}/{endpoint}/", self.api_root)),
        }
    }

    /// Read every page of a request
    pub async fn fetch(&self, request: &FetchRequest) -> Result<AggregatedResult> {
        self.fetch_pages(request, |_| ControlFlow::Continue(())).await
    }

    /// Read pages of a request, handing each to `visit` as it arrives.
    ///
    /// `visit` can end the walk early with `ControlFlow::Break`; the result then
    /// covers the pages read so far.
    pub async fn fetch_pages<F>(
        &self,
        request: &FetchRequest,
        mut visit: F,
    ) -> Result<AggregatedResult>
    where
        F: FnMut(&ResponseEnvelope) -> ControlFlow<()> + Send,
    {
        let mut prepared = self.prepare(request)?;
        let mut pages: Vec<ResponseEnvelope> = Vec::new();
        let mut last_url = prepared.url.clone();

        let mut counter = 1;
        while counter <= self.max_pages {
            counter += 1;

            let response = self
                .transport
                .get(&prepared.url, &prepared.wire_params())
                .await?;
            last_url.clone_from(&response.url);

            let page = ResponseEnvelope::decode(&response, request.sub_key.as_deref())?;
            if !response.is_success() {
                warn!(
                    "{} answered {} without an error_id",
                    response.url, response.status
                );
            }
            debug!(
                "Fetched {} page {}: {} items, has_more={}",
                request.endpoint,
                prepared.page,
                page.items.len(),
                page.has_more
            );

            let flow = visit(&page);
            let has_more = page.has_more;
            let backoff = page.backoff;
            pages.push(page);

            if let Some(seconds) = backoff {
                warn!("Backoff of {}s requested by {}", seconds, response.url);
                self.sleeper.sleep(Duration::from_secs(seconds.saturating_add(1))).await;
            }

            if !has_more || flow.is_break() {
                break;
            }
            prepared.page += 1;
        }

        let requests = pages.len() as u32;
        let Some(last) = pages.last() else {
            unreachable!("max_pages is at least 1, so one page is always requested");
        };
        let mut result = AggregatedResult {
            backoff: Some(last.backoff.unwrap_or(0)),
            has_more: last.has_more,
            page: prepared.page,
            quota_max: last.quota_max,
            quota_remaining: last.quota_remaining,
            total: Some(last.total.unwrap_or(0)),
            items: Vec::new(),
            url: last_url,
            requests,
        };
        result.items = pages.into_iter().flat_map(|page| page.items).collect();

        Ok(result)
    }

    /// Write to an endpoint with a single POST
    pub async fn send(&self, request: &FetchRequest) -> Result<AggregatedResult> {
        let prepared = self.prepare(request)?;

        let response = self
            .transport
            .post(&prepared.url, &prepared.wire_params())
            .await?;
        let page = ResponseEnvelope::decode(&response, request.sub_key.as_deref())?;
        if !response.is_success() {
            warn!(
                "{} answered {} without an error_id",
                response.url, response.status
            );
        }
        debug!(
            "Sent to {}: {} items returned",
            request.endpoint,
            page.items.len()
        );

        Ok(AggregatedResult {
            backoff: None,
            has_more: page.has_more,
            page: prepared.page,
            quota_max: page.quota_max,
            quota_remaining: page.quota_remaining,
            total: None,
            items: page.items,
            url: response.url,
            requests: 1,
        })
    }
}

impl std::fmt::Debug for Paginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("api_root", &self.api_root)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("site", &self.site)
            .finish_non_exhaustive()
    }
}
