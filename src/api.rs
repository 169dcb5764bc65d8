use crate::cache::CacheStore;
use crate::config::{Config, DEFAULT_API_URL, REQUEST_TIMEOUT};
use crate::error::{RateError, RateResult};
use crate::models::RateSnapshot;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Fetches rate snapshots, serving them from the cache while they are fresh.
///
/// Concurrent calls for the same uncached base each hit the network and each
/// write the cache; the last write wins.
#[derive(Clone)]
pub struct RateFetcher {
    client: Client,
    api_url: String,
    timeout: Duration,
    cache: CacheStore,
}

impl RateFetcher {
    pub fn new(cache: CacheStore) -> Self {
        Self {
            client: Client::new(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: REQUEST_TIMEOUT,
            cache,
        }
    }

    pub fn from_config(config: &Config, cache: CacheStore) -> Self {
        Self::new(cache)
            .with_api_url(config.api_url.clone())
            .with_timeout(config.request_timeout)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self, base: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            urlencoding::encode(base)
        )
    }

    pub async fn fetch_rates(&self, base: &str) -> RateResult<RateSnapshot> {
        self.fetch_rates_with_deadline(base, self.timeout).await
    }

    /// Like [`fetch_rates`](Self::fetch_rates), but the network request must
    /// produce a response within `deadline` or the call fails with
    /// [`RateError::Timeout`]. Reading the body gets its own `deadline`.
    /// Cache hits never touch the network.
    pub async fn fetch_rates_with_deadline(
        &self,
        base: &str,
        deadline: Duration,
    ) -> RateResult<RateSnapshot> {
        if let Some(cached) = self.cache.get(base) {
            debug!("cache hit for {}", base);
            return Ok(cached);
        }

        let url = self.endpoint(base);
        debug!("cache miss for {}, requesting {}", base, url);

        let response = tokio::time::timeout(deadline, self.client.get(&url).send())
            .await
            .map_err(|_| RateError::Timeout)?
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateError::Http(status.as_u16()));
        }

        let body = tokio::time::timeout(deadline, response.text())
            .await
            .map_err(|_| RateError::Timeout)?
            .map_err(classify)?;
        let data = parse_snapshot(&body)?;

        self.cache.set(base, &data);
        Ok(data)
    }
}

fn classify(e: reqwest::Error) -> RateError {
    if e.is_timeout() {
        RateError::Timeout
    } else {
        RateError::Network(e)
    }
}

/// `result` and `error-type` are read before the rest of the body is typed,
/// so an error reply with odd side fields still reports its `error-type`.
fn parse_snapshot(body: &str) -> RateResult<RateSnapshot> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| RateError::Api(format!("invalid response body: {}", e)))?;

    if value.get("result").and_then(|r| r.as_str()) != Some("success") {
        let message = value
            .get("error-type")
            .and_then(|t| t.as_str())
            .unwrap_or("API error");
        return Err(RateError::Api(message.to_string()));
    }

    let data: RateSnapshot = serde_json::from_value(value)
        .map_err(|e| RateError::Api(format!("invalid response body: {}", e)))?;
    if let Some(code) = data.invalid_rate() {
        return Err(RateError::Api(format!("malformed rate for {}", code)));
    }
    Ok(data)
}
