//! HTTP client for the chain registry and TVL feeds, with an optional response cache.

use crate::chain::cache::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_REGISTRY_URL: &str = "https://chainid.network/chains.json";
pub const DEFAULT_TVL_URL: &str = "https://api.llama.fi/chains";
const TIMEOUT_SECS: u64 = 30;
const RETRY_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 60_000;

#[derive(Clone, Debug)]
pub struct FetchConfig {
    pub registry_url: String,
    pub tvl_url: String,
    pub timeout_secs: u64,
    /// Extra attempts after the first failure. 0 = a failure aborts the cycle.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub offline: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            tvl_url: DEFAULT_TVL_URL.to_string(),
            timeout_secs: TIMEOUT_SECS,
            max_retries: 0,
            retry_backoff_ms: RETRY_BACKOFF_MS,
            offline: false,
        }
    }
}

impl FetchConfig {
    pub fn feed_urls(&self) -> FeedUrls {
        FeedUrls {
            registry: self.registry_url.clone(),
            tvl: self.tvl_url.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request: {0}")]
    Request(#[from] reqwest::Error),
    #[error("api error: status {0} body {1}")]
    Api(u16, String),
    #[error("parse {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cache: {0}")]
    Cache(#[from] crate::chain::cache::CacheError),
    #[error("offline mode: no cached body for {0}")]
    OfflineMiss(String),
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// The two feed locations read by one regeneration cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedUrls {
    pub registry: String,
    pub tvl: String,
}

/// Parsed but not yet validated feed documents.
#[derive(Clone, Debug)]
pub struct RawFeeds {
    pub registry: serde_json::Value,
    pub tvl: serde_json::Value,
}

/// Feed fetcher. Online it always hits the network (refreshing the cache);
/// offline it only reads the cache.
pub struct Fetcher {
    config: FetchConfig,
    client: Option<reqwest::Client>,
    cache: Option<Cache>,
    request_count: AtomicU64,
}

impl Fetcher {
    pub fn new(config: FetchConfig, cache: Option<Cache>) -> Result<Self, FetchError> {
        for url in [&config.registry_url, &config.tvl_url] {
            validate_url(url)?;
        }
        let client = if config.offline {
            None
        } else {
            Some(
                reqwest::Client::builder()
                    .use_rustls_tls()
                    .timeout(Duration::from_secs(config.timeout_secs))
                    .build()?,
            )
        };
        Ok(Self {
            config,
            client,
            cache,
            request_count: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// GET `url` and parse the body as JSON.
    pub async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let body = self.get_body(url).await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }

    /// Fetch both feeds concurrently. The first failure aborts the pair.
    pub async fn fetch_feeds(&self, urls: &FeedUrls) -> Result<RawFeeds, FetchError> {
        let (registry, tvl) =
            tokio::try_join!(self.fetch_json(&urls.registry), self.fetch_json(&urls.tvl))?;
        info!(
            registry_url = %urls.registry,
            tvl_url = %urls.tvl,
            "fetched feeds"
        );
        Ok(RawFeeds { registry, tvl })
    }

    async fn get_body(&self, url: &str) -> Result<String, FetchError> {
        let Some(client) = self.client.as_ref() else {
            return self.cached_body(url);
        };

        let mut last_err = None;
        for attempt in 0..=self.config.max_retries {
            match client.get(url).send().await {
                Ok(r) if r.status().is_success() => match r.text().await {
                    Ok(body) => {
                        self.request_count.fetch_add(1, Ordering::Relaxed);
                        if let Some(cache) = &self.cache {
                            if let Err(e) = cache.set_body(url, &body) {
                                warn!(%url, error = %e, "cache write failed");
                            }
                        }
                        return Ok(body);
                    }
                    // Truncated body: never cached, reported as a network failure.
                    Err(e) => last_err = Some(FetchError::Request(e)),
                },
                Ok(r) => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    last_err = Some(FetchError::Api(status, body));
                }
                Err(e) => last_err = Some(FetchError::Request(e)),
            }
            if attempt < self.config.max_retries {
                let ms = backoff_ms(self.config.retry_backoff_ms, attempt);
                warn!(%url, attempt, ms, "retry after error");
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
        }
        Err(last_err.unwrap_or(FetchError::Api(0, "unknown".to_string())))
    }

    fn cached_body(&self, url: &str) -> Result<String, FetchError> {
        let cached = match &self.cache {
            Some(cache) => cache.get_body(url)?,
            None => None,
        };
        match cached {
            Some(c) => {
                debug!(%url, fetched_utc = c.fetched_utc, "cache hit");
                Ok(c.body)
            }
            None => Err(FetchError::OfflineMiss(url.to_string())),
        }
    }

    /// Successful network responses so far.
    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }
}

/// Exponential backoff `base * 2^attempt`, saturating and capped at `MAX_BACKOFF_MS`.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    base.saturating_mul(factor).min(MAX_BACKOFF_MS)
}

fn validate_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}
