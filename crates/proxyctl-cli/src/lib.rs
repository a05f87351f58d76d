//! proxyctl CLI - command line surface for proxyctl
//!
//! Parses arguments, folds flag overrides into the loaded configuration and
//! runs one of the `update`, `validate` or `scan` commands.

pub mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use proxyctl_core::config::DEFAULT_CONFIG_FILE;
use proxyctl_core::Config;
use std::path::PathBuf;

/// Largest accepted `--chain`
pub const MAX_CHAIN_SIZE: usize = 10;

#[derive(Debug, Parser)]
#[command(
    name = "proxyctl",
    version,
    about = "A tool for managing and using proxy servers"
)]
pub struct Cli {
    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to the TOML config file (created with defaults if missing)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Fetch and save the latest list of HTTP proxies
    Update {
        /// Override the list source URL
        #[arg(long)]
        source: Option<String>,
    },
    /// Validate all saved proxies and keep only working ones
    Validate {
        /// Number of concurrent probes
        #[arg(short = 'n', long)]
        concurrency: Option<usize>,
        /// Per-probe timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Scan domains via rotating proxies with random User-Agent
    Scan {
        /// File containing one domain per line
        #[arg(long)]
        domains: PathBuf,
        /// Number of validated proxies to rotate through (1-10)
        #[arg(short, long)]
        chain: Option<usize>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Load the config file and apply command line overrides
    pub fn load_config(&self) -> Result<Config> {
        let config = Config::load_or_default(&self.config)
            .with_context(|| format!("failed to load config from {}", self.config.display()))?;
        Ok(self.apply_overrides(config))
    }

    pub fn apply_overrides(&self, mut config: Config) -> Config {
        config.logging = config.logging.with_debug(self.debug);

        match &self.command {
            Command::Update { source } => {
                if let Some(source) = source {
                    config.files.source_url = source.clone();
                }
            }
            Command::Validate {
                concurrency,
                timeout,
            } => {
                if let Some(concurrency) = concurrency {
                    config.validation.concurrency = *concurrency;
                }
                if let Some(timeout) = timeout {
                    config.validation.timeout_secs = *timeout;
                }
            }
            Command::Scan { chain, .. } => {
                if let Some(chain) = chain {
                    config.dispatcher.chain_size = *chain;
                }
            }
        }

        config
    }
}

/// Run the parsed command against an already loaded config
pub async fn run(cli: &Cli, config: &Config) -> Result<()> {
    match &cli.command {
        Command::Update { .. } => commands::update(config).await.map(|_| ()),
        Command::Validate { .. } => commands::validate(config).await.map(|_| ()),
        Command::Scan { domains, .. } => commands::scan(config, domains).await.map(|_| ()),
    }
}
