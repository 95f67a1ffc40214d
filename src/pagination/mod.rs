//! Pagination module
//!
//! Turns a [`FetchRequest`] into one or more HTTP calls and folds the pages into
//! an [`AggregatedResult`].
//!
//! # Overview
//!
//! Every response is wrapped in the same envelope (`items`, `has_more`,
//! `quota_max`, `quota_remaining`, and optionally `backoff` and `total`). Reads
//! keep requesting the next page while `has_more` is true, up to the client's
//! `max_pages`. An `error_id` in any response aborts the call.

mod paginator;
mod types;

pub use paginator::{Paginator, Sleeper, TokioSleeper};
pub use types::{
    param_text, AggregatedResult, FetchRequest, PreparedRequest, ResponseEnvelope,
    DEFAULT_FILTER, IDS_PARAM,
};

#[cfg(test)]
mod tests;
