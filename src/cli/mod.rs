//! CLI module
//!
//! Command-line driver for the client.
//!
//! # Commands
//!
//! - `fetch` - Read an endpoint, following pages
//! - `send` - Write to an endpoint
//! - `sites` - List the sites of the network

mod commands;
mod runner;

pub use commands::{Cli, Commands, RequestArgs};
pub use runner::Runner;
