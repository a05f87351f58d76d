//! proxyctl - fetch, validate and rotate through public HTTP proxies
//!
//! Re-exports the core library and, with the `ui` feature, terminal helpers
//! for the `proxyctl` binary.

pub use proxyctl_core::{
    init_logger, Config, Dispatcher, DispatcherOptions, Error, LoggingConfig, Protocol,
    ProxyRecord, Result, ScanOptions, ScanOutcome, ScanSummary, Scanner, ValidationEngine,
    ValidationReport,
};

pub use proxyctl_cli::{Cli, Command};

// Optional terminal output
#[cfg(feature = "ui")]
pub mod ui;
