//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Stack Exchange API client
#[derive(Parser, Debug)]
#[command(name = "stackapi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Site to query (its api_site_parameter, e.g. stackoverflow)
    #[arg(short, long, global = true)]
    pub site: Option<String>,

    /// API version
    #[arg(long, global = true, default_value = "2.2")]
    pub api_version: String,

    /// Options file (YAML or JSON)
    #[arg(short = 'O', long, global = true)]
    pub options: Option<PathBuf>,

    /// Application key
    #[arg(long, global = true)]
    pub key: Option<String>,

    /// Access token
    #[arg(long, global = true)]
    pub access_token: Option<String>,

    /// Maximum pages per fetch
    #[arg(long, global = true)]
    pub max_pages: Option<u32>,

    /// Items per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Proxy for both http and https
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read an endpoint, following pages
    Fetch(RequestArgs),

    /// Write to an endpoint (needs an access token)
    Send(RequestArgs),

    /// List the sites of the network
    Sites,
}

/// Arguments shared by `fetch` and `send`
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// Endpoint path, e.g. questions or answers/{ids}/comments
    pub endpoint: String,

    /// Entity ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<String>,

    /// Endpoint parameter as key=value (repeatable)
    #[arg(short, long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// API filter
    #[arg(long, default_value = "default")]
    pub filter: String,

    /// First page
    #[arg(long, default_value = "1")]
    pub page: u64,

    /// Response field to take items from
    #[arg(long)]
    pub sub_key: Option<String>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.to_string(), value.to_string()))
}
