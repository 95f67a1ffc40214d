// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # stackapi
//!
//! A client for the Stack Exchange API that takes care of the tedious parts:
//! building request URLs, walking paginated results, waiting out server-requested
//! backoff, and turning API error objects into errors.
//!
//! ## Features
//!
//! - **Site Resolution**: Validate a site identifier against the network's site directory
//! - **Automatic Pagination**: Follow `has_more` up to a page limit and merge the items
//! - **Backoff Handling**: Sleep whenever the API asks for it
//! - **Uniform Errors**: Connection, decoding and API failures share one error shape
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stackapi::{ClientOptions, FetchRequest, Result, StackApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let api = StackApi::new("stackoverflow", "2.2", ClientOptions::default()).await?;
//!
//!     let answers = api.fetch(FetchRequest::new("answers").ids([6841333])).await?;
//!     println!("{} answers, {} requests left", answers.items.len(), answers.quota_remaining);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        StackApi                          │
//! │   new(site) → bind     fetch(request)     send(request)  │
//! └──────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────┬──────────────┴──────────┬─────────────────┐
//! │     Site     │        Paginator        │    Transport    │
//! ├──────────────┼─────────────────────────┼─────────────────┤
//! │ sites lookup │ request building        │ GET / POST      │
//! │              │ page walk + backoff     │ proxy           │
//! │              │ error_id detection      │ rate limit      │
//! └──────────────┴─────────────────────────┴─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Client configuration
pub mod config;

/// HTTP transport with rate limiting
pub mod http;

/// Request building and page walking
pub mod pagination;

/// Site resolution
pub mod site;

/// The API client
pub mod client;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use client::StackApi;
pub use config::{ClientOptions, ProxyConfig};
pub use error::{ApiError, ApiErrorKind, Error, ErrorId, Result};
pub use pagination::{AggregatedResult, FetchRequest, ResponseEnvelope};
pub use site::Site;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
