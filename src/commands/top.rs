//! Top chart crawl: listing page, then one title page per entry.

use crate::config::Config;
use crate::format::{write_outputs, Formatter};
use crate::imdb::{
    extract_detail, extract_listing, DetailRecord, ImdbClient, ImdbFetch, ListingContext,
};
use anyhow::{Context, Result};
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Crawls the listing page and every title it links to.
pub struct TopCommand {
    config: Config,
}

impl TopCommand {
    /// Creates a new top command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the crawl and returns formatted output.
    pub async fn execute(&self) -> Result<String> {
        let client = ImdbClient::new(&self.config).context("Failed to create HTTP client")?;

        self.execute_with_client(&client).await
    }

    /// Runs the crawl with a provided client (for testing).
    pub async fn execute_with_client(&self, client: &impl ImdbFetch) -> Result<String> {
        let records = self.crawl(client).await?;

        if let Some(dir) = &self.config.output_dir {
            write_outputs(dir, &records)?;
        }

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_records(&records))
    }

    /// Fetches the listing and one record per listed title, in listing order.
    ///
    /// Fetch failures never abort the crawl: a listing failure yields no
    /// records, a title failure yields a connection-error record. Only an
    /// unusable site root is an error.
    pub async fn crawl(&self, client: &impl ImdbFetch) -> Result<Vec<DetailRecord>> {
        let ctx = ListingContext::from_config(&self.config).with_context(|| {
            format!("Invalid listing URL: {}{}", self.config.base_url, self.config.listing_path)
        })?;

        let html = match client.listing().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to fetch listing page: {}", e);
                return Ok(Vec::new());
            }
        };

        let items = extract_listing(&html, &ctx);
        if items.is_empty() {
            warn!("No titles found on the listing page");
            return Ok(Vec::new());
        }

        info!("Crawling {} titles", items.len());

        let mut records = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                self.delay().await;
            }

            let record = match client.title(&item.url).await {
                Ok(html) => extract_detail(&html, &item.url).merge_listing(item),
                Err(e) => {
                    warn!("Failed to fetch {}: {}", item.url, e);
                    DetailRecord::connection_error(&item.url)
                }
            };

            debug!(
                "[{}/{}] {}",
                idx + 1,
                items.len(),
                record.title.as_deref().unwrap_or(item.url.as_str())
            );
            records.push(record);
        }

        let failed = records.iter().filter(|r| r.is_connection_error()).count();
        info!("Crawled {} titles ({} failed)", records.len(), failed);

        Ok(records)
    }

    /// Sleeps between title requests with random jitter.
    async fn delay(&self) {
        if self.config.delay_ms == 0 {
            return;
        }

        let jitter = if self.config.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.config.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.config.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}
