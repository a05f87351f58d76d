//! Rotating outbound dispatcher
//!
//! A dispatcher samples a fixed selection of validated proxies and routes
//! every outbound request through exactly one of them, advancing a shared
//! cursor per request. This is single-hop rotation: traffic never passes
//! through more than one proxy.

use crate::config::{Config, DispatcherSettings};
use crate::error::{Error, Result};
use crate::fetch::{fetch_via, Fetch, FetchOptions, FetchReport};
use crate::proxy::ProxyRecord;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Default overall per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Dispatcher options
#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    pub request_timeout: Duration,
    pub fetch: FetchOptions,
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetch: FetchOptions::default(),
        }
    }
}

impl DispatcherOptions {
    pub fn from_config(config: &Config) -> Self {
        Self::from_settings(&config.dispatcher)
            .with_fetch(FetchOptions {
                body_limit: config.scan.body_limit,
                log_headers: config.logging.debug,
            })
    }

    pub fn from_settings(settings: &DispatcherSettings) -> Self {
        Self {
            request_timeout: settings.request_timeout(),
            ..Self::default()
        }
    }

    pub fn with_fetch(mut self, fetch: FetchOptions) -> Self {
        self.fetch = fetch;
        self
    }
}

/// How the cursor behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    /// One proxy, every request goes through it
    Static,
    /// Per-request round-robin over the selection
    RoundRobin,
}

/// One selected proxy with its dedicated client
#[derive(Debug)]
pub struct Route {
    proxy: ProxyRecord,
    client: Client,
}

impl Route {
    fn new(proxy: ProxyRecord, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .proxy(proxy.to_reqwest_proxy()?)
            .pool_max_idle_per_host(0)
            .timeout(timeout)
            .build()?;
        Ok(Self { proxy, client })
    }

    pub fn proxy(&self) -> &ProxyRecord {
        &self.proxy
    }
}

/// Outbound client that rotates proxies per request
#[derive(Debug)]
pub struct Dispatcher {
    session: Uuid,
    routes: Vec<Route>,
    rotation: Rotation,
    cursor: AtomicUsize,
    options: DispatcherOptions,
}

impl Dispatcher {
    /// Sample `chain_size` proxies at random and build a dispatcher over them.
    pub fn build(
        proxies: &[ProxyRecord],
        chain_size: usize,
        options: DispatcherOptions,
    ) -> Result<Self> {
        Self::build_with_rng(proxies, chain_size, options, &mut rand::thread_rng())
    }

    /// Like [`Dispatcher::build`] with a caller-supplied RNG.
    ///
    /// `chain_size` is clamped into `[1, candidates]`. Candidates are sampled by
    /// position, so a proxy listed twice may be selected twice. Only an empty
    /// candidate list is an error.
    pub fn build_with_rng<R: Rng + ?Sized>(
        proxies: &[ProxyRecord],
        chain_size: usize,
        options: DispatcherOptions,
        rng: &mut R,
    ) -> Result<Self> {
        if proxies.is_empty() {
            return Err(Error::NoProxiesAvailable);
        }

        let mut candidates = proxies.to_vec();
        let size = chain_size.clamp(1, candidates.len());
        candidates.shuffle(rng);
        candidates.truncate(size);

        let session = Uuid::new_v4();
        info!(
            %session,
            "Building dispatcher with {} proxies (selected from {} available)",
            size,
            proxies.len()
        );
        for (i, proxy) in candidates.iter().enumerate() {
            debug!(%session, "  {}: {}", i + 1, proxy);
        }

        let routes = candidates
            .into_iter()
            .map(|proxy| Route::new(proxy, options.request_timeout))
            .collect::<Result<Vec<_>>>()?;

        let rotation = if routes.len() == 1 {
            Rotation::Static
        } else {
            Rotation::RoundRobin
        };

        Ok(Self {
            session,
            routes,
            rotation,
            cursor: AtomicUsize::new(0),
            options,
        })
    }

    /// Id attached to every log line of this dispatcher
    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Number of selected proxies; fixed for the dispatcher's lifetime
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Selected proxies in rotation order
    pub fn selected(&self) -> impl Iterator<Item = &ProxyRecord> {
        self.routes.iter().map(Route::proxy)
    }

    /// Route for the next request; advances the cursor exactly once.
    pub fn next_route(&self) -> &Route {
        match self.rotation {
            Rotation::Static => &self.routes[0],
            Rotation::RoundRobin => {
                let idx = self.cursor.fetch_add(1, Ordering::Relaxed) % self.routes.len();
                &self.routes[idx]
            }
        }
    }
}

#[async_trait]
impl Fetch for Dispatcher {
    async fn fetch_once(&self, url: &str) -> Result<FetchReport> {
        let route = self.next_route();
        debug!(session = %self.session, "Routing {} via {}", url, route.proxy.endpoint());
        fetch_via(&route.client, &route.proxy, url, &self.options.fetch).await
    }
}
