use crate::error::Result;
use crate::list::parse_proxies;
use crate::proxy::ProxyRecord;
use crate::user_agent::random_user_agent;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Timeout for downloading a raw list
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Download a raw proxy list and parse it.
pub async fn fetch_proxy_list(url: &str, timeout: Duration) -> Result<Vec<ProxyRecord>> {
    info!("Fetching proxies from: {}", url);

    let client = Client::builder().timeout(timeout).build()?;
    let body = client
        .get(url)
        .header(USER_AGENT, random_user_agent())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let proxies = parse_proxies(&body);
    info!("Fetched {} proxies from {}", proxies.len(), url);
    Ok(proxies)
}
