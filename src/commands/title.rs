//! Direct title lookup by id or URL.

use crate::config::Config;
use crate::format::{write_outputs, Formatter};
use crate::imdb::{extract_detail, DetailRecord, ImdbClient, ImdbFetch};
use anyhow::{Context, Result};
use regex_lite::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};
use url::Url;

static TITLE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^tt\d{7,}$").unwrap());
static TITLE_ID_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/title/(tt\d{7,})(?:[/?#]|$)").unwrap());

/// Resolves a title id or title URL to the canonical title page URL.
///
/// Accepts `tt0111161` or any http(s) URL containing `/title/tt0111161`.
pub fn resolve_title_url(base_url: &str, input: &str) -> Option<String> {
    let input = input.trim();

    let id = if TITLE_ID.is_match(input) {
        input.to_string()
    } else {
        let url = Url::parse(input).ok().filter(|u| matches!(u.scheme(), "http" | "https"))?;
        TITLE_ID_IN_URL.captures(url.path())?.get(1)?.as_str().to_string()
    };

    let base = Url::parse(base_url).ok()?;
    base.join(&format!("/title/{}/", id)).ok().map(String::from)
}

/// Fetches individual title pages.
pub struct TitleCommand {
    config: Config,
}

impl TitleCommand {
    /// Creates a new title command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches one title and returns formatted output.
    pub async fn execute(&self, id: &str) -> Result<String> {
        let client = ImdbClient::new(&self.config).context("Failed to create HTTP client")?;

        self.execute_with_client(&client, id).await
    }

    /// Fetches one title with a provided client (for testing).
    pub async fn execute_with_client(&self, client: &impl ImdbFetch, id: &str) -> Result<String> {
        let Some(url) = resolve_title_url(client.base_url(), id) else {
            anyhow::bail!(
                "Invalid title id: '{}'. Expected an id like tt0111161 or a title URL.",
                id.trim()
            );
        };

        info!("Looking up title: {}", url);

        let html = client.title(&url).await.with_context(|| format!("Failed to fetch {}", url))?;
        let record = extract_detail(&html, &url);

        self.finish(vec![record], true)
    }

    /// Fetches several titles.
    pub async fn execute_batch(&self, ids: &[String]) -> Result<String> {
        let client = ImdbClient::new(&self.config).context("Failed to create HTTP client")?;

        self.execute_batch_with_client(&client, ids).await
    }

    /// Fetches several titles with a provided client (for testing).
    ///
    /// Invalid ids are skipped; unreachable pages become connection-error
    /// records so the output keeps one row per requested title.
    pub async fn execute_batch_with_client(
        &self,
        client: &impl ImdbFetch,
        ids: &[String],
    ) -> Result<String> {
        let mut records: Vec<DetailRecord> = Vec::new();

        for id in ids {
            let Some(url) = resolve_title_url(client.base_url(), id) else {
                warn!("Skipping invalid title id: {}", id.trim());
                continue;
            };

            info!("Looking up title: {}", url);

            let record = match client.title(&url).await {
                Ok(html) => extract_detail(&html, &url),
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    DetailRecord::connection_error(&url)
                }
            };
            records.push(record);
        }

        self.finish(records, false)
    }

    fn finish(&self, records: Vec<DetailRecord>, single: bool) -> Result<String> {
        if let Some(dir) = &self.config.output_dir {
            write_outputs(dir, &records)?;
        }

        let formatter = Formatter::new(self.config.format);
        match records.as_slice() {
            [record] if single => Ok(formatter.format_record(record)),
            _ => Ok(formatter.format_records(&records)),
        }
    }
}
