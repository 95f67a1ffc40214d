//! HTTP transport module
//!
//! The fetch pipeline talks to the network only through the [`Transport`] trait.
//! [`HttpTransport`] is the `reqwest` implementation used by default.
//!
//! # Features
//!
//! - **Proxy Routing**: Optional HTTP and HTTPS proxies
//! - **Rate Limiting**: Token bucket throttle using governor
//! - **Final URL Tracking**: The URL actually answered, after redirects

mod client;
mod rate_limit;

pub use client::{HttpTransport, Transport, TransportResponse};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
