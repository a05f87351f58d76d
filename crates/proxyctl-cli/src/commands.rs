//! Command runners

use crate::MAX_CHAIN_SIZE;
use anyhow::{Context, Result};
use colored::*;
use proxyctl_core::backoff::LinearBackoff;
use proxyctl_core::source::{fetch_proxy_list, DEFAULT_SOURCE_TIMEOUT};
use proxyctl_core::{
    list, Config, ConsoleProgress, Dispatcher, DispatcherOptions, Error, ScanOptions,
    ScanOutcome, ScanSummary, Scanner, ValidationEngine, ValidationReport,
};
use std::path::Path;
use tracing::{debug, info};

/// Download the configured source list and overwrite the proxy file.
///
/// Returns the number of proxies written.
pub async fn update(config: &Config) -> Result<usize> {
    let proxies = fetch_proxy_list(&config.files.source_url, DEFAULT_SOURCE_TIMEOUT)
        .await
        .context("failed to fetch proxies")?;

    list::save_proxies(&proxies, &config.files.proxy_file)
        .with_context(|| format!("failed to save proxies to {}", config.files.proxy_file))?;

    println!(
        "{} {} {}",
        "Downloaded and saved".green().bold(),
        proxies.len().to_string().yellow().bold(),
        "HTTP proxies".green().bold()
    );
    Ok(proxies.len())
}

/// Validate the proxy file and write the passing subset to the valid file.
pub async fn validate(config: &Config) -> Result<ValidationReport> {
    let proxies = list::load_proxies(&config.files.proxy_file)
        .with_context(|| format!("failed to load proxies from {}", config.files.proxy_file))?;
    println!("Total proxies to validate: {}", proxies.len());

    let engine = ValidationEngine::from_settings(&config.validation);
    let mut progress = ConsoleProgress::new();
    let report = engine.run(&proxies, &mut progress).await?;

    list::save_proxies(&report.valid, &config.files.valid_file)
        .with_context(|| format!("failed to save valid proxies to {}", config.files.valid_file))?;

    info!(
        "Validation took {:.1}s: {} valid, {} invalid",
        report.elapsed.as_secs_f64(),
        report.valid.len(),
        report.failed()
    );
    println!(
        "{} {} | {} {}",
        "Valid:".green().bold(),
        report.valid.len(),
        "Invalid:".red().bold(),
        report.failed()
    );
    Ok(report)
}

/// Scan every domain in `domains` through a dispatcher over the valid file.
pub async fn scan(config: &Config, domains: &Path) -> Result<ScanSummary> {
    let chain_size = check_chain_size(config.dispatcher.chain_size)?;

    let targets = list::load_targets(domains)
        .with_context(|| format!("failed to load domains from {}", domains.display()))?;
    let proxies = list::load_proxies(&config.files.valid_file).with_context(|| {
        format!(
            "failed to load valid proxies from {}",
            config.files.valid_file
        )
    })?;
    debug!("Loaded {} targets and {} proxies", targets.len(), proxies.len());

    let options = DispatcherOptions::from_config(config);
    let dispatcher =
        Dispatcher::build(&proxies, chain_size, options).context("failed to create proxy chain")?;
    println!(
        "{} {} ({} proxies)",
        "Scan session".cyan().bold(),
        dispatcher.session(),
        dispatcher.len()
    );
    let scanner = Scanner::new(dispatcher, ScanOptions::from_settings(&config.scan))
        .with_backoff(Box::new(LinearBackoff::new(config.scan.backoff_unit())));

    let summary = scanner.scan(&targets, print_outcome).await?;

    println!(
        "{} {} scanned, {} skipped",
        "Scan completed:".green().bold(),
        summary.scanned(),
        summary.skipped()
    );
    Ok(summary)
}

/// Accept chain sizes in `1..=MAX_CHAIN_SIZE`
pub fn check_chain_size(chain_size: usize) -> Result<usize> {
    if (1..=MAX_CHAIN_SIZE).contains(&chain_size) {
        Ok(chain_size)
    } else {
        Err(Error::Configuration(format!(
            "chain size must be between 1 and {}, got {}",
            MAX_CHAIN_SIZE, chain_size
        ))
        .into())
    }
}

fn print_outcome(outcome: &ScanOutcome) {
    match outcome {
        ScanOutcome::Fetched { .. } => println!("{} {}", "✓".green().bold(), outcome),
        ScanOutcome::Skipped { .. } => println!("{} {}", "✗".red().bold(), outcome),
    }
}
