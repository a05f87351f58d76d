//! proxyctl Core - proxy validation, rotating dispatch and retrying fetch
//!
//! This library validates candidate proxies concurrently, builds a dispatcher
//! that rotates validated proxies per request, and scans targets through it.

pub mod backoff;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod list;
pub mod progress;
pub mod proxy;
pub mod scan;
pub mod source;
pub mod user_agent;
pub mod validator;

pub use backoff::{BackoffPolicy, ExponentialBackoff, LinearBackoff};
pub use config::{Config, LoggingConfig};
pub use dispatcher::{Dispatcher, DispatcherOptions, Rotation};
pub use engine::{EngineOptions, ValidationEngine, ValidationReport};
pub use error::{Error, Result};
pub use fetch::{fetch_with_retry, Fetch, FetchOptions, FetchReport};
pub use progress::{ConsoleProgress, ProgressReporter, SilentProgress};
pub use proxy::{Protocol, ProxyRecord};
pub use scan::{ScanOptions, ScanOutcome, ScanSummary, Scanner};
pub use validator::{HttpValidator, Probe, ValidationOutcome, ValidatorOptions};

/// Initialize the logger from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logger(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter_directive()));

    // A subscriber may already be installed (tests); keep it.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
