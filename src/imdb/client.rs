//! HTTP client for IMDb requests using wreq for TLS fingerprint emulation.

use crate::config::{Config, RetryPolicy, UserAgentMode};
use crate::error::FetchError;
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use wreq::Client;
use wreq_util::Emulation;

/// Only encodings the client is built to decode.
const ACCEPT_ENCODING: &str = "gzip, br";

/// Trait for listing/title fetching - enables mocking for tests.
#[async_trait]
pub trait ImdbFetch: Send + Sync {
    /// Fetches the listing (chart) page.
    async fn listing(&self) -> Result<String, FetchError>;

    /// Fetches a title page by absolute URL.
    async fn title(&self, url: &str) -> Result<String, FetchError>;

    /// Site root that relative links and bare title ids resolve against.
    fn base_url(&self) -> &str;
}

/// IMDb HTTP client with browser impersonation, user agent rotation and retries.
pub struct ImdbClient {
    client: Client,
    base_url: String,
    listing_url: Url,
    user_agent_mode: UserAgentMode,
    user_agents: Vec<String>,
    accept_language: String,
    retry: Option<RetryPolicy>,
}

impl ImdbClient {
    /// Creates a new client from the given configuration.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let listing_url = config.listing_url().map_err(|source| FetchError::InvalidUrl {
            url: format!("{}{}", config.base_url, config.listing_path),
            source,
        })?;

        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url.as_str()).map_err(|source| {
                FetchError::InvalidProxy { proxy: proxy_url.clone(), source }
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(FetchError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            listing_url,
            user_agent_mode: config.user_agent_mode,
            user_agents: config.user_agents.clone(),
            accept_language: config.accept_language.clone(),
            retry: config.retry.clone(),
        })
    }

    /// User-Agent for the next request, per the configured mode.
    fn user_agent(&self) -> Option<&str> {
        let agent = match self.user_agent_mode {
            UserAgentMode::Fixed => self.user_agents.first(),
            UserAgentMode::Rotate if self.user_agents.is_empty() => None,
            UserAgentMode::Rotate => {
                let idx = rand::rng().random_range(0..self.user_agents.len());
                self.user_agents.get(idx)
            }
        };
        agent.map(String::as_str)
    }

    /// Performs a GET, retrying transient failures per the retry policy.
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let max_attempts = self.retry.as_ref().map_or(1, |r| r.max_attempts.max(1));
        let mut attempt = 1;

        loop {
            let err = match self.get_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            let Some(policy) = self.retry.as_ref() else {
                return Err(err);
            };

            if attempt >= max_attempts || !err.is_transient(&policy.retryable_status) {
                return Err(err);
            }

            let wait = policy.backoff_ms(attempt);
            warn!("{} (attempt {}/{}), retrying in {}ms", err, attempt, max_attempts, wait);
            tokio::time::sleep(Duration::from_millis(wait)).await;
            attempt += 1;
        }
    }

    /// Performs a single GET with browser-like headers.
    async fn get_once(&self, url: &str) -> Result<String, FetchError> {
        debug!("GET {}", url);

        let mut request = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.accept_language.as_str())
            .header("Accept-Encoding", ACCEPT_ENCODING)
            .header("Cache-Control", "max-age=0")
            .header("DNT", "1")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1");

        if let Some(agent) = self.user_agent() {
            request = request.header("User-Agent", agent);
        }

        let response = request
            .send()
            .await
            .map_err(|source| FetchError::Transport { url: url.to_string(), source })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            if status.as_u16() == 429 || status.as_u16() == 503 {
                warn!("Rate limited ({}). Consider using a proxy or increasing --delay.", status);
            }
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        response
            .text()
            .await
            .map_err(|source| FetchError::Body { url: url.to_string(), source })
    }
}

#[async_trait]
impl ImdbFetch for ImdbClient {
    async fn listing(&self) -> Result<String, FetchError> {
        info!("Fetching listing: {}", self.listing_url);
        self.get(self.listing_url.as_str()).await
    }

    async fn title(&self, url: &str) -> Result<String, FetchError> {
        info!("Fetching title: {}", url);
        self.get(url).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
