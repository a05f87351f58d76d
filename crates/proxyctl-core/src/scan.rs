//! Sequential scan of a target list through one dispatcher

use crate::backoff::{BackoffPolicy, LinearBackoff};
use crate::config::ScanSettings;
use crate::error::{Error, Result};
use crate::fetch::{fetch_with_retry, Fetch, FetchReport};
use std::fmt;
use tracing::{debug, info, warn};

/// Scan driver options
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Target checked once before the real targets
    pub canary: String,
    pub scheme: String,
    pub max_attempts: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::from_settings(&ScanSettings::default())
    }
}

impl ScanOptions {
    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self {
            canary: settings.canary.clone(),
            scheme: settings.scheme.clone(),
            max_attempts: settings.max_attempts,
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_canary(mut self, canary: impl Into<String>) -> Self {
        self.canary = canary.into();
        self
    }
}

/// Result for one target
#[derive(Debug)]
pub enum ScanOutcome {
    Fetched { target: String, report: FetchReport },
    Skipped { target: String, error: Error },
}

impl ScanOutcome {
    pub fn target(&self) -> &str {
        match self {
            ScanOutcome::Fetched { target, .. } | ScanOutcome::Skipped { target, .. } => target,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, ScanOutcome::Fetched { .. })
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanOutcome::Fetched { target, report } => {
                write!(f, "Domain: {} | {}", target, report)
            }
            ScanOutcome::Skipped { target, error } => {
                write!(f, "Error scanning {}: {}", target, error)
            }
        }
    }
}

/// Per-target outcomes of a finished scan
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub outcomes: Vec<ScanOutcome>,
}

impl ScanSummary {
    pub fn scanned(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_fetched()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.scanned()
    }
}

/// Drives fetches over a target list, one at a time, through a single
/// fetcher it owns for the whole session.
pub struct Scanner<F: Fetch> {
    fetcher: F,
    options: ScanOptions,
    backoff: Box<dyn BackoffPolicy>,
}

impl<F: Fetch> Scanner<F> {
    pub fn new(fetcher: F, options: ScanOptions) -> Self {
        Self {
            fetcher,
            options,
            backoff: Box::new(LinearBackoff::default()),
        }
    }

    pub fn with_backoff(mut self, backoff: Box<dyn BackoffPolicy>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn target_url(&self, target: &str) -> String {
        format!("{}://{}", self.options.scheme, target)
    }

    /// Fetch the canary; a failure means the fetcher itself is unusable.
    pub async fn check_canary(&self) -> Result<FetchReport> {
        let url = self.target_url(&self.options.canary);
        debug!("Testing proxy connectivity with {}", url);

        fetch_with_retry(&self.fetcher, &url, self.options.max_attempts, self.backoff.as_ref())
            .await
            .map_err(|e| Error::Connectivity {
                canary: url,
                source: Box::new(e),
            })
    }

    /// Scan every non-blank target; `on_outcome` sees each result as it lands.
    ///
    /// Fails only when the canary check fails, in which case no target is
    /// attempted.
    pub async fn scan<S, C>(&self, targets: &[S], mut on_outcome: C) -> Result<ScanSummary>
    where
        S: AsRef<str>,
        C: FnMut(&ScanOutcome),
    {
        let canary = self.check_canary().await?;
        info!("Proxy test successful: {}", canary);

        let mut summary = ScanSummary::default();
        for target in targets.iter().map(|t| t.as_ref().trim()) {
            if target.is_empty() {
                continue;
            }

            debug!("Starting scan for {}", target);
            let url = self.target_url(target);
            let outcome = match fetch_with_retry(
                &self.fetcher,
                &url,
                self.options.max_attempts,
                self.backoff.as_ref(),
            )
            .await
            {
                Ok(report) => ScanOutcome::Fetched {
                    target: target.to_string(),
                    report,
                },
                Err(error) => {
                    warn!("Scan failed for {}: {}", target, error);
                    ScanOutcome::Skipped {
                        target: target.to_string(),
                        error,
                    }
                }
            };

            on_outcome(&outcome);
            summary.outcomes.push(outcome);
        }

        info!(
            "Scan completed: {} scanned, {} skipped",
            summary.scanned(),
            summary.skipped()
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{Protocol, ProxyRecord};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails any URL containing one of `down`, records every call
    struct ScriptedFetch {
        down: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetch {
        fn new(down: Vec<&'static str>) -> Self {
            Self {
                down,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetch for ScriptedFetch {
        async fn fetch_once(&self, url: &str) -> Result<FetchReport> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.down.iter().any(|d| url.contains(d)) {
                return Err(Error::Timeout);
            }
            Ok(FetchReport {
                url: url.to_string(),
                status: 200,
                length: 2,
                elapsed: Duration::from_millis(3),
                sample: "ok".to_string(),
                via: ProxyRecord::new("127.0.0.1", "3128", Protocol::Http),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_canary_failure_aborts_before_targets() {
        let scanner = Scanner::new(ScriptedFetch::new(vec!["httpbin.org"]), ScanOptions::default());
        let mut seen = 0;

        let err = scanner
            .scan(&["example.com", "example.org"], |_| seen += 1)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Connectivity { .. }));
        assert_eq!(seen, 0);
        let calls = scanner.fetcher().calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c == "https://httpbin.org/ip"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_target_is_skipped_and_scan_continues() {
        let scanner = Scanner::new(ScriptedFetch::new(vec!["bad.test"]), ScanOptions::default());
        let mut lines = Vec::new();

        let summary = scanner
            .scan(&["good.test", "  ", "bad.test", " other.test "], |o| lines.push(o.to_string()))
            .await
            .unwrap();

        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.scanned(), 2);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.outcomes[2].target(), "other.test");
        assert_eq!(lines[0], "Domain: good.test | Status: 200 | Length: 2 | Sample: ok...");
        assert!(lines[1].starts_with("Error scanning bad.test: after 2 attempts"));

        let bad_calls = scanner
            .fetcher()
            .calls()
            .into_iter()
            .filter(|c| c == "https://bad.test")
            .count();
        assert_eq!(bad_calls, 2);
    }

    #[test]
    fn test_target_url_uses_scheme() {
        let scanner = Scanner::new(
            ScriptedFetch::new(vec![]),
            ScanOptions::default().with_scheme("http"),
        );
        assert_eq!(scanner.target_url("example.com"), "http://example.com");
    }
}
