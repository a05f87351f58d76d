//! Single fetches and the retry loop around them

use crate::backoff::BackoffPolicy;
use crate::error::{Error, Result};
use crate::proxy::ProxyRecord;
use crate::user_agent::random_user_agent;
use async_trait::async_trait;
use reqwest::header::{ACCEPT_ENCODING, USER_AGENT};
use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default cap on response bytes read per attempt
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

/// Characters of the body kept for display
const SAMPLE_CHARS: usize = 50;

/// Per-attempt fetch options
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub body_limit: usize,
    /// Dump response headers at debug level
    pub log_headers: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            body_limit: DEFAULT_BODY_LIMIT,
            log_headers: false,
        }
    }
}

/// What one successful attempt observed
#[derive(Debug, Clone)]
pub struct FetchReport {
    pub url: String,
    pub status: u16,
    /// Bytes read, at most the body limit
    pub length: usize,
    pub elapsed: Duration,
    pub sample: String,
    /// Proxy the request was routed through
    pub via: ProxyRecord,
}

impl fmt::Display for FetchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status: {} | Length: {} | Sample: {}...",
            self.status, self.length, self.sample
        )
    }
}

/// Anything that can perform one GET attempt
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch_once(&self, url: &str) -> Result<FetchReport>;
}

/// One GET through `client`, reading at most `options.body_limit` bytes.
///
/// Any HTTP status is a success; only transport failures are errors.
pub async fn fetch_via(
    client: &Client,
    via: &ProxyRecord,
    url: &str,
    options: &FetchOptions,
) -> Result<FetchReport> {
    let user_agent = random_user_agent();
    debug!("Fetching {} via {} (User-Agent: {})", url, via.endpoint(), user_agent);

    let start = Instant::now();
    let mut response = client
        .get(url)
        .header(USER_AGENT, user_agent)
        .header(ACCEPT_ENCODING, "identity")
        .send()
        .await?;
    let status = response.status();

    if options.log_headers {
        for (name, value) in response.headers() {
            debug!("Response header {}: {:?}", name, value);
        }
    }

    let mut body = Vec::new();
    while body.len() < options.body_limit {
        match response.chunk().await? {
            Some(chunk) => {
                let take = chunk.len().min(options.body_limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }
    let elapsed = start.elapsed();

    debug!(
        "Fetched {} (status: {}, length: {}, time: {:?})",
        url,
        status.as_u16(),
        body.len(),
        elapsed
    );

    Ok(FetchReport {
        url: url.to_string(),
        status: status.as_u16(),
        length: body.len(),
        elapsed,
        sample: String::from_utf8_lossy(&body).chars().take(SAMPLE_CHARS).collect(),
        via: via.clone(),
    })
}

/// Fetch `url`, retrying transport failures up to `max_attempts` times.
///
/// After failed attempt `i` (1-based) the loop sleeps `backoff.delay(i)`;
/// there is no sleep after the last attempt. A zero budget still makes one
/// attempt. A non-transport error is returned as is, without retrying.
pub async fn fetch_with_retry<F>(
    fetcher: &F,
    url: &str,
    max_attempts: u32,
    backoff: &dyn BackoffPolicy,
) -> Result<FetchReport>
where
    F: Fetch + ?Sized,
{
    let attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        debug!("Attempt {}/{} for {}", attempt, attempts, url);
        match fetcher.fetch_once(url).await {
            Ok(report) => return Ok(report),
            Err(e) if !e.is_transport() => {
                debug!("Attempt {} failed permanently: {}", attempt, e);
                return Err(e);
            }
            Err(e) => {
                if attempt < attempts {
                    let delay = backoff.delay(attempt);
                    debug!("Attempt {} failed: {}. Retrying in {:?}", attempt, e, delay);
                    tokio::time::sleep(delay).await;
                } else {
                    debug!("Attempt {} failed: {}", attempt, e);
                }
                last_error = Some(e);
            }
        }
    }

    Err(Error::RetriesExhausted {
        target: url.to_string(),
        attempts,
        source: Box::new(
            last_error.unwrap_or_else(|| Error::Request("no attempt was made".to_string())),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::LinearBackoff;
    use crate::proxy::Protocol;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` attempts, then succeeds
    struct FlakyFetch {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakyFetch {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetch for FlakyFetch {
        async fn fetch_once(&self, url: &str) -> Result<FetchReport> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(Error::ProxyConnection(format!("refused #{}", call)));
            }
            Ok(FetchReport {
                url: url.to_string(),
                status: 404,
                length: 0,
                elapsed: Duration::ZERO,
                sample: String::new(),
                via: ProxyRecord::new("127.0.0.1", "8080", Protocol::Http),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_backoff_between_attempts() {
        let fetcher = FlakyFetch::new(u32::MAX);
        let backoff = LinearBackoff::new(Duration::from_secs(1));
        let start = tokio::time::Instant::now();

        let err = fetch_with_retry(&fetcher, "https://down.test", 3, &backoff)
            .await
            .unwrap_err();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(3), "waited {:?}", waited);
        assert!(waited < Duration::from_secs(4), "waited {:?}", waited);
        match err {
            Error::RetriesExhausted { attempts, source, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(source.to_string(), "Proxy connection failed: refused #3");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_failure_counts_non_ok_status() {
        let fetcher = FlakyFetch::new(1);
        let backoff = LinearBackoff::new(Duration::from_secs(1));
        let start = tokio::time::Instant::now();

        let report = fetch_with_retry(&fetcher, "https://example.test", 2, &backoff)
            .await
            .unwrap();

        assert_eq!(report.status, 404);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(1) && waited < Duration::from_secs(2));
    }

    /// Always fails with an error no retry can fix
    struct MalformedFetch {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Fetch for MalformedFetch {
        async fn fetch_once(&self, url: &str) -> Result<FetchReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::InvalidUrl(format!("cannot parse {}", url)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transport_error_is_not_retried() {
        let fetcher = MalformedFetch {
            calls: AtomicU32::new(0),
        };
        let start = tokio::time::Instant::now();

        let err = fetch_with_retry(&fetcher, "https://bad host", 3, &LinearBackoff::default())
            .await
            .unwrap_err();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::InvalidUrl(_)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_makes_one_attempt() {
        let fetcher = FlakyFetch::new(u32::MAX);
        let err = fetch_with_retry(&fetcher, "https://down.test", 0, &LinearBackoff::default())
            .await
            .unwrap_err();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::RetriesExhausted { attempts: 1, .. }));
    }
}
