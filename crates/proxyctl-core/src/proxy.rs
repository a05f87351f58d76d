use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Protocol tag carried by a proxy record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
    /// Any tag not known to proxyctl, kept verbatim so lists round-trip
    Other(String),
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
            Protocol::Socks4 => "socks4",
            Protocol::Socks5 => "socks5",
            Protocol::Other(tag) => tag,
        }
    }
}

impl FromStr for Protocol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Ok(match tag.to_lowercase().as_str() {
            "http" => Protocol::Http,
            "https" => Protocol::Https,
            "socks4" => Protocol::Socks4,
            "socks5" => Protocol::Socks5,
            _ => Protocol::Other(tag.to_string()),
        })
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A third-party relay endpoint.
///
/// Records compare and hash by `(address, port)` only; two lines naming the
/// same endpoint with different protocol tags are the same proxy.
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    pub address: String,
    pub port: String,
    pub protocol: Protocol,
}

impl ProxyRecord {
    pub fn new(address: impl Into<String>, port: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            address: address.into(),
            port: port.into(),
            protocol,
        }
    }

    /// Proxy URL in `protocol://address:port` form
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.address, self.port)
    }

    /// `address:port`, used in log lines
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Line form written to list files: `address:port:protocol`
    pub fn to_line(&self) -> String {
        format!("{}:{}:{}", self.address, self.port, self.protocol)
    }

    /// Build the reqwest proxy that routes every request through this record.
    pub fn to_reqwest_proxy(&self) -> crate::Result<reqwest::Proxy> {
        reqwest::Proxy::all(self.url()).map_err(|e| crate::Error::InvalidProxy {
            proxy: self.url(),
            reason: e.to_string(),
        })
    }
}

impl PartialEq for ProxyRecord {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.port == other.port
    }
}

impl Eq for ProxyRecord {}

impl Hash for ProxyRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.port.hash(state);
    }
}

impl fmt::Display for ProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}
