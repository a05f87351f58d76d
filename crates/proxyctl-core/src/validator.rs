use crate::config::ValidationSettings;
use crate::error::{Error, Result};
use crate::proxy::ProxyRecord;
use crate::user_agent::random_user_agent;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::debug;

/// Validator options
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Endpoint fetched through the proxy under test
    pub probe_url: String,
    /// Upper bound on one probe, connect included
    pub timeout: Duration,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self::from_settings(&ValidationSettings::default())
    }
}

impl ValidatorOptions {
    pub fn from_settings(settings: &ValidationSettings) -> Self {
        Self {
            probe_url: settings.probe_url.clone(),
            timeout: settings.timeout(),
        }
    }

    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Result of probing one proxy
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub proxy: ProxyRecord,
    pub passed: bool,
    /// Only meaningful when `passed` is true
    pub latency: Duration,
    pub error: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl ValidationOutcome {
    pub fn passed(proxy: ProxyRecord, latency: Duration) -> Self {
        Self {
            proxy,
            passed: true,
            latency,
            error: None,
            checked_at: chrono::Utc::now(),
        }
    }

    pub fn failed(proxy: ProxyRecord, latency: Duration, error: impl Into<String>) -> Self {
        Self {
            proxy,
            passed: false,
            latency,
            error: Some(error.into()),
            checked_at: chrono::Utc::now(),
        }
    }
}

/// One-shot liveness probe of a proxy.
///
/// Implementations never return an error: every failure mode collapses into
/// a failed [`ValidationOutcome`].
#[async_trait]
pub trait Probe: Send + Sync {
    async fn check(&self, proxy: &ProxyRecord) -> ValidationOutcome;
}

/// Probes a proxy by fetching the probe URL through it
#[derive(Debug, Clone, Default)]
pub struct HttpValidator {
    options: ValidatorOptions,
}

impl HttpValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Pass/fail only
    pub async fn validate(&self, proxy: &ProxyRecord) -> bool {
        self.check(proxy).await.passed
    }

    /// Throwaway client bound to a single proxy, no connection reuse
    fn build_client(&self, proxy: &ProxyRecord) -> Result<Client> {
        let client = Client::builder()
            .proxy(proxy.to_reqwest_proxy()?)
            .pool_max_idle_per_host(0)
            .timeout(self.options.timeout)
            .build()?;
        Ok(client)
    }
}

#[async_trait]
impl Probe for HttpValidator {
    async fn check(&self, proxy: &ProxyRecord) -> ValidationOutcome {
        let client = match self.build_client(proxy) {
            Ok(client) => client,
            Err(e) => {
                debug!("Proxy {} rejected: {}", proxy.endpoint(), e);
                return ValidationOutcome::failed(proxy.clone(), Duration::ZERO, e.to_string());
            }
        };

        let start = Instant::now();
        let result = client
            .get(&self.options.probe_url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await;
        let latency = start.elapsed();

        match result {
            Ok(response) => {
                let status = response.status();
                debug!(
                    "Proxy {} answered in {:?} (status: {})",
                    proxy.endpoint(),
                    latency,
                    status.as_u16()
                );
                if status == StatusCode::OK {
                    ValidationOutcome::passed(proxy.clone(), latency)
                } else {
                    ValidationOutcome::failed(
                        proxy.clone(),
                        latency,
                        format!("HTTP status: {}", status),
                    )
                }
            }
            Err(e) => {
                let err = Error::from(e);
                debug!("Proxy {} failed in {:?}: {}", proxy.endpoint(), latency, err);
                ValidationOutcome::failed(proxy.clone(), latency, err.to_string())
            }
        }
    }
}

/// Probe `proxy` against the default endpoint with the given timeout.
pub async fn validate(proxy: &ProxyRecord, timeout: Duration) -> bool {
    HttpValidator::new(ValidatorOptions::default().with_timeout(timeout))
        .validate(proxy)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::Protocol;

    #[test]
    fn test_options_from_settings() {
        let options = ValidatorOptions::default();
        assert_eq!(options.probe_url, "http://checkip.amazonaws.com");
        assert_eq!(options.timeout, Duration::from_secs(10));

        let options = options
            .with_probe_url("http://probe.test/")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(options.probe_url, "http://probe.test/");
        assert_eq!(options.timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_outcome_constructors() {
        let proxy = ProxyRecord::new("127.0.0.1", "8080", Protocol::Http);

        let ok = ValidationOutcome::passed(proxy.clone(), Duration::from_millis(42));
        assert!(ok.passed);
        assert!(ok.error.is_none());

        let bad = ValidationOutcome::failed(proxy, Duration::ZERO, "HTTP status: 403");
        assert!(!bad.passed);
        assert_eq!(bad.error.as_deref(), Some("HTTP status: 403"));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_fails() {
        let proxy = ProxyRecord::new("127.0.0.1", "9", Protocol::Other("gopher".to_string()));
        let validator = HttpValidator::new(
            ValidatorOptions::default().with_timeout(Duration::from_millis(500)),
        );
        let outcome = validator.check(&proxy).await;
        assert!(!outcome.passed);
        assert!(outcome.error.is_some());
    }
}
