//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, RequestArgs};
use crate::client::StackApi;
use crate::config::{ClientOptions, ProxyConfig};
use crate::error::Result;
use crate::pagination::FetchRequest;
use serde::Serialize;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch(args) => {
                let api = self.client().await?;
                print_json(&api.fetch(build_request(args)).await?)
            }
            Commands::Send(args) => {
                let api = self.client().await?;
                print_json(&api.send(build_request(args)).await?)
            }
            Commands::Sites => {
                let api = StackApi::network(self.options()?)?;
                print_json(&api.sites().await?)
            }
        }
    }

    /// Options file (if any) with command-line overrides applied
    pub fn options(&self) -> Result<ClientOptions> {
        let mut options = match &self.cli.options {
            Some(path) => ClientOptions::from_file(path)?,
            None => ClientOptions::default(),
        };

        options.version.clone_from(&self.cli.api_version);
        if let Some(ref key) = self.cli.key {
            options.key = Some(key.clone());
        }
        if let Some(ref token) = self.cli.access_token {
            options.access_token = Some(token.clone());
        }
        if let Some(max_pages) = self.cli.max_pages {
            options.max_pages = max_pages;
        }
        if let Some(page_size) = self.cli.page_size {
            options.page_size = page_size;
        }
        if let Some(ref proxy) = self.cli.proxy {
            options.proxy = ProxyConfig::all(proxy);
        }

        Ok(options)
    }

    /// A client bound to `--site`, or a network client without one
    async fn client(&self) -> Result<StackApi> {
        let options = self.options()?;
        match &self.cli.site {
            Some(site) => StackApi::new(site, &self.cli.api_version, options).await,
            None => StackApi::network(options),
        }
    }
}

/// Turn request arguments into a request
pub fn build_request(args: &RequestArgs) -> FetchRequest {
    let mut request = FetchRequest::new(&args.endpoint)
        .filter(&args.filter)
        .page(args.page);
    if let Some(ref sub_key) = args.sub_key {
        request = request.sub_key(sub_key);
    }
    if !args.ids.is_empty() {
        request = request.ids(args.ids.iter().cloned());
    }
    for (key, value) in &args.params {
        request = request.param(key, value.as_str());
    }
    request
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
