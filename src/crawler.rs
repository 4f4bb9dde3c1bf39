//! Scrape API client for fetching discovery and tool pages
//!
//! Pages are rendered by a Firecrawl-compatible scrape service, which returns
//! both markdown and HTML for a URL.

use crate::error::{DiscoveryError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// Configuration for the scrape client and crawl pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Scrape service base URL
    pub api_base: String,
    /// Bearer token for the scrape service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Directory pages to discover tools from
    pub sources: Vec<String>,
    /// Pause between consecutive scrape requests
    pub delay_between_requests_ms: u64,
    /// Maximum tool pages crawled per discovery source
    pub max_requests_per_source: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Maximum number of retry attempts (default: 3)
    pub max_retries: u32,
    /// Initial delay between retries, doubling each retry
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.firecrawl.dev".to_string(),
            api_key: None,
            sources: vec![
                "https://aixploria.com/en/".to_string(),
                "https://opentools.ai/".to_string(),
                "https://dang.ai/".to_string(),
                "https://futuretools.io/".to_string(),
            ],
            delay_between_requests_ms: 2000,
            max_requests_per_source: 20,
            connect_timeout_secs: 10,
            request_timeout_secs: 60,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
        }
    }
}

impl CrawlerConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }

    /// Backoff before retry `attempt` (1-based), capped at the max delay
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        std::cmp::min(
            Duration::from_millis(self.retry_base_delay_ms) * 2u32.saturating_pow(attempt.saturating_sub(1)),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }
}

/// A rendered page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    pub markdown: String,
    pub html: Option<String>,
}

/// Anything that can turn a URL into a rendered page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage>;
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'static str; 2],
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    html: Option<String>,
}

/// Client for the scrape service
pub struct Crawler {
    client: Client,
    config: CrawlerConfig,
    api_key: String,
}

impl Crawler {
    /// Create a new crawler; requires an API key in the config
    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(DiscoveryError::MissingApiKey)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DiscoveryError::FetchError {
                url: "client_init".to_string(),
                source: e,
            })?;

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Scrape a URL with retry support
    pub async fn scrape(&self, url: &str) -> Result<ScrapedPage> {
        info!("Scraping URL: {}", url);
        Url::parse(url).map_err(|_| DiscoveryError::InvalidUrl(url.to_string()))?;

        let mut last_error = String::new();

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = self.config.retry_delay(attempt);
                warn!(
                    "Retry attempt {}/{} for {} after {:?}",
                    attempt, self.config.max_retries, url, delay
                );
                sleep(delay).await;
            }

            match self.scrape_once(url).await {
                Ok(page) => {
                    if attempt > 0 {
                        info!("Successfully scraped {} on attempt {}", url, attempt + 1);
                    }
                    return Ok(page);
                }
                Err(e) => {
                    last_error = e.to_string();
                    warn!(
                        "Scrape attempt {} failed for {}: {}",
                        attempt + 1,
                        url,
                        last_error
                    );

                    if !is_retryable(&e) {
                        return Err(e);
                    }
                }
            }
        }

        Err(DiscoveryError::RetryExhausted {
            url: url.to_string(),
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }

    /// Single scrape attempt without retry
    async fn scrape_once(&self, url: &str) -> Result<ScrapedPage> {
        let endpoint = format!("{}/v1/scrape", self.config.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&ScrapeRequest {
                url,
                formats: ["markdown", "html"],
            })
            .send()
            .await
            .map_err(|e| DiscoveryError::FetchError {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ScrapeResponse = response.json().await.map_err(|e| DiscoveryError::FetchError {
            url: url.to_string(),
            source: e,
        })?;

        let page = page_from_response(url, body)?;
        debug!("Scraped {} bytes of markdown from {}", page.markdown.len(), url);
        Ok(page)
    }
}

#[async_trait]
impl PageFetcher for Crawler {
    async fn fetch_page(&self, url: &str) -> Result<ScrapedPage> {
        self.scrape(url).await
    }
}

fn page_from_response(url: &str, body: ScrapeResponse) -> Result<ScrapedPage> {
    match body.data {
        Some(data) if body.success => Ok(ScrapedPage {
            url: url.to_string(),
            markdown: data.markdown.unwrap_or_default(),
            html: data.html,
        }),
        _ => Err(DiscoveryError::ScrapeFailed {
            url: url.to_string(),
            message: body.error.unwrap_or_else(|| "unsuccessful response".to_string()),
        }),
    }
}

/// Transport errors, 5xx and 429 are worth retrying; other failures are not
fn is_retryable(error: &DiscoveryError) -> bool {
    match error {
        DiscoveryError::HttpStatusError { status, .. } => *status == 429 || *status >= 500,
        DiscoveryError::FetchError { .. } => true,
        _ => false,
    }
}
