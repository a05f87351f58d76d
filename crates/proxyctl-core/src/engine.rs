//! Concurrent validation of a candidate proxy set
//!
//! A fixed pool of workers drains a shared queue, probing one proxy at a
//! time. Every outcome is sent to a single consumer (the caller's task),
//! which owns the completed-count and the collected passes and drives the
//! progress reporter from a periodic tick.

use crate::config::ValidationSettings;
use crate::error::{Error, Result};
use crate::progress::{ProgressReporter, SilentProgress};
use crate::proxy::ProxyRecord;
use crate::validator::{HttpValidator, Probe, ValidationOutcome, ValidatorOptions};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default worker pool size
pub const DEFAULT_CONCURRENCY: usize = 50;

/// Default interval between progress refreshes
pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// Engine options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub concurrency: usize,
    pub tick: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            tick: DEFAULT_TICK,
        }
    }
}

impl EngineOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

/// Summary of one validation run
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub total: usize,
    /// Progress units consumed; equals `total` unless a worker died
    pub processed: usize,
    /// Passing proxies, in completion order
    pub valid: Vec<ProxyRecord>,
    pub elapsed: Duration,
}

impl ValidationReport {
    pub fn failed(&self) -> usize {
        self.total - self.valid.len()
    }
}

/// Runs a [`Probe`] over many proxies with bounded concurrency
pub struct ValidationEngine {
    probe: Arc<dyn Probe>,
    options: EngineOptions,
}

impl ValidationEngine {
    pub fn new(probe: Arc<dyn Probe>, options: EngineOptions) -> Self {
        Self { probe, options }
    }

    /// Engine backed by [`HttpValidator`] configured from settings
    pub fn from_settings(settings: &ValidationSettings) -> Self {
        let validator = HttpValidator::new(ValidatorOptions::from_settings(settings));
        Self::new(
            Arc::new(validator),
            EngineOptions::default().with_concurrency(settings.concurrency),
        )
    }

    /// Validate every proxy and return the passing subset, in no particular order.
    pub async fn validate_all(&self, proxies: &[ProxyRecord]) -> Result<Vec<ProxyRecord>> {
        let report = self.run(proxies, &mut SilentProgress).await?;
        Ok(report.valid)
    }

    /// Validate every proxy, reporting progress as outcomes arrive.
    pub async fn run(
        &self,
        proxies: &[ProxyRecord],
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ValidationReport> {
        if proxies.is_empty() {
            return Err(Error::NoProxiesAvailable);
        }

        let started = Instant::now();
        let total = proxies.len();
        let workers = self.options.concurrency.clamp(1, total);
        info!("Validating {} proxies with {} workers", total, workers);

        let queue = Arc::new(Mutex::new(proxies.iter().cloned().collect::<VecDeque<_>>()));
        // Buffered to the input size so a worker never waits on the consumer.
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<ValidationOutcome>(total);

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let queue = Arc::clone(&queue);
                let probe = Arc::clone(&self.probe);
                let outcome_tx = outcome_tx.clone();
                tokio::spawn(async move {
                    loop {
                        let next = queue.lock().await.pop_front();
                        let Some(proxy) = next else { break };
                        let outcome = probe.check(&proxy).await;
                        if outcome_tx.send(outcome).await.is_err() {
                            break;
                        }
                    }
                    debug!("Validation worker {} finished", id);
                })
            })
            .collect();
        drop(outcome_tx);

        reporter.on_start(total);
        let mut ticker = interval(self.options.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut processed = 0;
        let mut valid = Vec::new();
        while processed < total {
            tokio::select! {
                _ = ticker.tick() => reporter.on_tick(processed, total),
                outcome = outcome_rx.recv() => match outcome {
                    Some(outcome) => {
                        processed += 1;
                        debug!(
                            proxy = %outcome.proxy,
                            latency = ?outcome.latency,
                            checked_at = %outcome.checked_at.to_rfc3339(),
                            error = outcome.error.as_deref().unwrap_or("-"),
                            "Validation {}",
                            if outcome.passed { "passed" } else { "failed" }
                        );
                        if outcome.passed {
                            valid.push(outcome.proxy);
                        }
                    }
                    None => break,
                },
            }
        }

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("Validation worker aborted: {}", e);
            }
        }
        if processed < total {
            warn!("{} proxies were never validated", total - processed);
        }

        let report = ValidationReport {
            total,
            processed,
            valid,
            elapsed: started.elapsed(),
        };
        info!(
            "Validation completed: {} valid, {} invalid in {:?}",
            report.valid.len(),
            report.failed(),
            report.elapsed
        );
        reporter.on_finish(&report);
        Ok(report)
    }
}
