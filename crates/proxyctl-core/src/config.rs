use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default location of the config file
pub const DEFAULT_CONFIG_FILE: &str = "proxyctl.toml";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub files: FileSettings,
    #[serde(default)]
    pub validation: ValidationSettings,
    #[serde(default)]
    pub dispatcher: DispatcherSettings,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where proxy lists are read from and written to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Raw candidate list written by `update`
    #[serde(default = "default_proxy_file")]
    pub proxy_file: String,
    /// Validated subset written by `validate`
    #[serde(default = "default_valid_file")]
    pub valid_file: String,
    /// Remote text list downloaded by `update`
    #[serde(default = "default_source_url")]
    pub source_url: String,
}

fn default_proxy_file() -> String { "proxies.txt".to_string() }
fn default_valid_file() -> String { "valid_proxies.txt".to_string() }
fn default_source_url() -> String {
    "https://raw.githubusercontent.com/TheSpeedX/PROXY-List/master/http.txt".to_string()
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            proxy_file: default_proxy_file(),
            valid_file: default_valid_file(),
            source_url: default_source_url(),
        }
    }
}

/// Validation engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// Worker pool size
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-probe timeout (seconds)
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
    /// Endpoint fetched through each proxy under test
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
}

fn default_concurrency() -> usize { 50 }
fn default_probe_timeout() -> u64 { 10 }
fn default_probe_url() -> String { "http://checkip.amazonaws.com".to_string() }

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_probe_timeout(),
            probe_url: default_probe_url(),
        }
    }
}

impl ValidationSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Dispatcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Number of validated proxies rotated through per scan
    #[serde(default = "default_chain_size")]
    pub chain_size: usize,
    /// Overall per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_chain_size() -> usize { 3 }
fn default_request_timeout() -> u64 { 15 }

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            chain_size: default_chain_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl DispatcherSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Scan driver settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Liveness target checked before any real target
    #[serde(default = "default_canary")]
    pub canary: String,
    /// Scheme prepended to each target line
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Attempt budget per target, canary included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff unit (milliseconds)
    #[serde(default = "default_backoff_unit")]
    pub backoff_unit_ms: u64,
    /// Maximum response bytes read per attempt
    #[serde(default = "default_body_limit")]
    pub body_limit: usize,
}

fn default_canary() -> String { "httpbin.org/ip".to_string() }
fn default_scheme() -> String { "https".to_string() }
fn default_max_attempts() -> u32 { 2 }
fn default_backoff_unit() -> u64 { 1000 }
fn default_body_limit() -> usize { 1024 * 1024 }

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            canary: default_canary(),
            scheme: default_scheme(),
            max_attempts: default_max_attempts(),
            backoff_unit_ms: default_backoff_unit(),
            body_limit: default_body_limit(),
        }
    }
}

impl ScanSettings {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

/// Logging configuration handed to the subscriber and to each component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Verbose diagnostics: debug level plus response header dumps
    #[serde(default)]
    pub debug: bool,
}

fn default_log_level() -> String { "info".to_string() }

/// Crates raised to debug by `--debug`; dependencies keep the base level
const DEBUG_DIRECTIVES: &str = "proxyctl=debug,proxyctl_core=debug,proxyctl_cli=debug";

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            debug: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = self.debug || debug;
        self
    }

    /// Directive for the env filter
    pub fn filter_directive(&self) -> String {
        if self.debug {
            format!("{},{}", self.level, DEBUG_DIRECTIVES)
        } else {
            self.level.clone()
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            warn!("Cannot read config file: {}", e);
            crate::error::Error::Configuration(format!("cannot read config file: {}", e))
        })?;

        let config: Self = toml::from_str(&content)?;
        info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Load `path` when it exists, otherwise write and return the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        info!("Using default config");
        let config = Config::default();
        if let Err(e) = config.save_to_file(path) {
            warn!("Failed to save default config to {}: {}", path.display(), e);
        } else {
            info!("Default config saved to {}", path.display());
        }
        Ok(config)
    }
}
