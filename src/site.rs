//! Site resolution
//!
//! Every request to a network site carries the site's `api_site_parameter`.
//! A client is bound to a site by looking the identifier up in the `sites`
//! directory, which also yields the site's display name.

use crate::error::{Error, Result};
use crate::pagination::{FetchRequest, Paginator};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::ControlFlow;
use tracing::{debug, info};

/// Compact filter returning just enough of each site to resolve it
pub const SITES_FILTER: &str = "!*L1*AY-85YllAr2)";

/// Endpoint listing every site of the network
pub const SITES_ENDPOINT: &str = "sites";

/// A site of the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Display name, e.g. `Stack Overflow`
    pub name: String,
    /// Key fragment sent as the `site` parameter, e.g. `stackoverflow`
    pub api_site_parameter: String,
}

/// The request that lists sites
pub fn sites_request() -> FetchRequest {
    FetchRequest::new(SITES_ENDPOINT).filter(SITES_FILTER)
}

/// Look `identifier` up in the sites directory.
///
/// Pages are read until a site whose `api_site_parameter` equals `identifier`
/// shows up. Fails with [`Error::InvalidArgument`] when the identifier is empty
/// or no site matches.
pub async fn resolve(paginator: &Paginator, identifier: &str) -> Result<Site> {
    if identifier.is_empty() {
        return Err(Error::invalid_argument("No Site Name provided"));
    }

    let mut found: Option<Site> = None;
    let result = paginator
        .fetch_pages(&sites_request(), |page| {
            found = page
                .items
                .iter()
                .filter(|item| {
                    item.get("api_site_parameter").and_then(Value::as_str) == Some(identifier)
                })
                .find_map(|item| Site::deserialize(item).ok());
            if found.is_some() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;
    debug!(
        "Scanned {} site pages ({} sites)",
        result.requests,
        result.items.len()
    );

    match found {
        Some(site) => {
            info!("Resolved site '{}' as {}", identifier, site.name);
            Ok(site)
        }
        None => Err(Error::invalid_argument(format!(
            "Invalid Site Name provided: unknown site '{identifier}'"
        ))),
    }
}
