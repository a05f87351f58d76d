use std::io;

/// Error type for proxyctl operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure reading or writing a list or config file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Invalid settings supplied by the caller
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// An operation needed at least one proxy and got none
    #[error("No proxies available")]
    NoProxiesAvailable,
    /// A proxy record that cannot be turned into a client proxy
    #[error("Invalid proxy {proxy}: {reason}")]
    InvalidProxy { proxy: String, reason: String },
    /// The request did not complete within the client timeout
    #[error("Request timed out")]
    Timeout,
    /// The proxy refused or dropped the connection
    #[error("Proxy connection failed: {0}")]
    ProxyConnection(String),
    /// Any other transport-level request failure
    #[error("Request failed: {0}")]
    Request(String),
    /// The request could not be built, e.g. a malformed target URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Every attempt for one target failed
    #[error("after {attempts} attempts: {source}")]
    RetriesExhausted {
        target: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },
    /// The dispatcher could not reach the canary target
    #[error("proxy test failed against {canary}: {source}")]
    Connectivity {
        canary: String,
        #[source]
        source: Box<Error>,
    },
    /// Config (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for proxyctl operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error was produced by the transport rather than by local setup.
    ///
    /// Only transport errors are worth retrying.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Timeout | Error::ProxyConnection(_) | Error::Request(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Error::InvalidUrl(err.to_string())
        } else if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::ProxyConnection(err.to_string())
        } else {
            Error::Request(err.to_string())
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
