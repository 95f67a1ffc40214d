//! Request and response types of the fetch pipeline

use crate::error::{ApiError, ErrorId, Result};
use crate::http::TransportResponse;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Filter used when none is given
pub const DEFAULT_FILTER: &str = "default";

/// Parameter holding entity ids; spliced into the URL path instead of the query
pub const IDS_PARAM: &str = "ids";

/// UTF-8 byte order mark
const BOM: &[u8] = b"\xEF\xBB\xBF";

// ============================================================================
// FetchRequest
// ============================================================================

/// One call to an endpoint.
///
/// ```rust,ignore
/// let request = FetchRequest::new("answers")
///     .ids([100, 200])
///     .param("sort", "votes")
///     .filter("withbody");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Endpoint path, e.g. `questions` or `answers/{ids}/comments`
    pub endpoint: String,
    /// First page to request
    pub page: u64,
    /// Field of each response to take the page data from
    pub sub_key: Option<String>,
    /// API filter
    pub filter: String,
    /// Endpoint-specific parameters
    pub params: BTreeMap<String, Value>,
}

impl FetchRequest {
    /// Create a request for an endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            page: 1,
            sub_key: None,
            filter: DEFAULT_FILTER.to_string(),
            params: BTreeMap::new(),
        }
    }

    /// Set the starting page
    #[must_use]
    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    /// Take each page's data from this response field
    #[must_use]
    pub fn sub_key(mut self, key: impl Into<String>) -> Self {
        self.sub_key = Some(key.into());
        self
    }

    /// Set the filter
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Add an endpoint parameter.
    ///
    /// A `page` parameter is ignored; the page counter comes from [`Self::page`].
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the entity ids
    #[must_use]
    pub fn ids<I, T>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        self.param(IDS_PARAM, ids)
    }
}

/// Render a parameter value the way the API expects it.
///
/// Arrays are joined with `;`, the API's vector separator. Null yields `None`.
pub fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(values) => Some(
            values
                .iter()
                .filter_map(param_text)
                .collect::<Vec<_>>()
                .join(";"),
        ),
        other => Some(other.to_string()),
    }
}

// ============================================================================
// PreparedRequest
// ============================================================================

/// A request with its URL and parameters resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    /// Endpoint URL, ids included
    pub url: String,
    /// Current `page` parameter
    pub page: u64,
    /// Every parameter except `page`
    pub params: BTreeMap<String, String>,
}

impl PreparedRequest {
    /// Parameters for the wire, `page` included
    pub fn wire_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push(("page".to_string(), self.page.to_string()));
        params
    }
}

// ============================================================================
// ResponseEnvelope
// ============================================================================

/// The wrapper object of one raw page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Whether another page follows
    #[serde(default)]
    pub has_more: bool,
    /// Seconds to wait before the next request
    #[serde(default)]
    pub backoff: Option<u64>,
    /// Total number of matching items, when the filter includes it
    #[serde(default)]
    pub total: Option<u64>,
    /// Daily request quota
    #[serde(default)]
    pub quota_max: u64,
    /// Requests left today
    #[serde(default)]
    pub quota_remaining: u64,
    /// Page items
    #[serde(default)]
    pub items: Vec<Value>,
}

impl ResponseEnvelope {
    /// Decode one response.
    ///
    /// Fails when the body is not a JSON object, when the API reports an
    /// `error_id`, or when `sub_key` names a missing field.
    pub fn decode(response: &TransportResponse, sub_key: Option<&str>) -> Result<Self> {
        let url = response.url.as_str();
        let bytes = response.body.strip_prefix(BOM).unwrap_or(&response.body[..]);

        let body: Value =
            serde_json::from_slice(bytes).map_err(|e| ApiError::parse(url, e.to_string()))?;
        if !body.is_object() {
            return Err(ApiError::parse(url, "response is not a JSON object").into());
        }

        if let Some(error_id) = body.get("error_id") {
            let text = |field: &str| {
                body.get(field)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            return Err(ApiError::remote(
                url,
                ErrorId::from_value(error_id),
                text("error_name"),
                text("error_message"),
            )
            .into());
        }

        let mut envelope =
            Self::deserialize(&body).map_err(|e| ApiError::parse(url, e.to_string()))?;

        if let Some(key) = sub_key {
            let data = body
                .get(key)
                .ok_or_else(|| ApiError::parse(url, format!("response has no '{key}' field")))?;
            envelope.items = match data {
                Value::Array(items) => items.clone(),
                other => match other.get("items") {
                    Some(Value::Array(items)) => items.clone(),
                    _ => Vec::new(),
                },
            };
        }

        Ok(envelope)
    }
}

// ============================================================================
// AggregatedResult
// ============================================================================

/// Items of every page of a call, with the last page's metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedResult {
    /// Backoff of the last page, 0 when absent; `None` for writes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff: Option<u64>,
    /// `has_more` of the last page
    pub has_more: bool,
    /// Page parameter reached
    pub page: u64,
    /// `quota_max` of the last page
    pub quota_max: u64,
    /// `quota_remaining` of the last page
    pub quota_remaining: u64,
    /// Total of the last page, 0 when absent; `None` for writes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Items of all pages, in fetch order
    pub items: Vec<Value>,
    /// URL of the last request
    #[serde(skip)]
    pub url: String,
    /// Number of requests issued
    #[serde(skip)]
    pub requests: u32,
}

impl AggregatedResult {
    /// Deserialize the items into a typed value
    pub fn items_as<T: serde::de::DeserializeOwned>(&self) -> Result<Vec<T>> {
        self.items
            .iter()
            .map(|item| T::deserialize(item).map_err(Into::into))
            .collect()
    }
}
