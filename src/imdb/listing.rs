//! Listing page extraction.
//!
//! Three tiers are tried in order and the first one that yields anything
//! wins; results are never merged across tiers:
//!
//! 1. the JSON-LD `ItemList` block,
//! 2. ranked title links in the chart markup,
//! 3. every link on the page that points at a title.
//!
//! An empty result means the page could not be read, not that the chart
//! is empty.

use crate::config::{Config, MAX_LISTING_ITEMS};
use crate::imdb::models::ListingItem;
use crate::imdb::selectors::listing;
use crate::imdb::{element_text, structured};
use regex_lite::Regex;
use scraper::Html;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, info, trace, warn};
use url::Url;

static ORDINAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d*\.\s*").unwrap());

/// Where the listing page lives and how much of it to take.
#[derive(Debug, Clone)]
pub struct ListingContext {
    /// Site root that relative links resolve against
    pub base: Url,
    /// The listing page itself, excluded by the generic tier
    pub listing: Url,
    /// Requested item count, clamped to 50
    pub max_items: usize,
}

impl ListingContext {
    /// Creates a context taking the full 50 items.
    pub fn new(base_url: &str, listing_path: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(base_url)?;
        let listing = base.join(listing_path)?;
        Ok(Self { base, listing, max_items: MAX_LISTING_ITEMS })
    }

    /// Builds a context from the crawl configuration.
    pub fn from_config(config: &Config) -> Result<Self, url::ParseError> {
        let mut ctx = Self::new(&config.base_url, &config.listing_path)?;
        ctx.max_items = config.item_cap();
        Ok(ctx)
    }

    /// Effective item cap.
    pub fn cap(&self) -> usize {
        self.max_items.min(MAX_LISTING_ITEMS)
    }

    /// Resolves a link found on the listing page against the site root.
    ///
    /// Dot-segments are normalised and protocol-relative links take the
    /// scheme of the base. `None` for links that cannot be resolved.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        match self.base.join(href.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                trace!("Unresolvable link {:?}: {}", href, e);
                None
            }
        }
    }

    fn is_self_link(&self, url: &Url) -> bool {
        let own = self.listing.path().trim_end_matches('/');
        !own.is_empty() && url.path().contains(own)
    }
}

/// One extraction strategy. `None` means the tier found nothing usable.
pub type Tier = fn(&Html, &ListingContext) -> Option<Vec<ListingItem>>;

/// Tiers in the order they are attempted.
pub const TIERS: [(&str, Tier); 3] = [
    ("structured data", structured_tier),
    ("title links", title_link_tier),
    ("generic links", generic_link_tier),
];

/// Extracts title links from a listing page.
pub fn extract_listing(html: &str, ctx: &ListingContext) -> Vec<ListingItem> {
    let document = Html::parse_document(html);

    for (name, tier) in TIERS {
        match tier(&document, ctx) {
            Some(items) if !items.is_empty() => {
                info!("Found {} titles via {}", items.len(), name);
                return items;
            }
            _ => debug!("Tier '{}' found nothing, trying next", name),
        }
    }

    warn!("Could not extract any title links from the listing page");
    Vec::new()
}

/// Reads the JSON-LD `itemListElement` array.
pub fn structured_tier(document: &Html, ctx: &ListingContext) -> Option<Vec<ListingItem>> {
    let list = structured::blocks(document)
        .into_iter()
        .find(|node| node.get("itemListElement").is_some_and(Value::is_array))?;

    let entries = list.get("itemListElement")?.as_array()?;
    let items: Vec<ListingItem> = entries
        .iter()
        .take(ctx.cap())
        .filter_map(|entry| {
            let item = structured_item(entry, ctx);
            if item.is_none() {
                trace!("Skipping list entry without a usable url");
            }
            item
        })
        .collect();

    non_empty(items)
}

fn structured_item(entry: &Value, ctx: &ListingContext) -> Option<ListingItem> {
    let node = entry.get("item").filter(|v| v.is_object())?;
    let url = structured::text(node, "url").filter(|u| !u.is_empty())?;

    Some(ListingItem {
        url: ctx.resolve(&url)?.into(),
        title: structured::text(node, "name"),
        year: structured::text(node, "datePublished"),
        rating: structured::nested_text(node, "aggregateRating", "ratingValue"),
        rating_count: structured::nested_text(node, "aggregateRating", "ratingCount"),
        duration_minutes: structured::duration(node, "duration"),
        genre: structured::joined(node, "genre"),
        description: structured::text(node, "description"),
        image: structured::image(node, "image"),
    })
}

/// Reads the ranked title headings of the chart.
pub fn title_link_tier(document: &Html, ctx: &ListingContext) -> Option<Vec<ListingItem>> {
    let items: Vec<ListingItem> = document
        .select(&listing::TITLE_LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            if !href.contains(listing::TITLE_PATH) {
                return None;
            }
            let title = strip_ordinal(&element_text(link));
            Some(ListingItem::new(ctx.resolve(href)?).with_title(title))
        })
        .take(ctx.cap())
        .collect();

    non_empty(items)
}

/// Scans every link on the page for title pages.
pub fn generic_link_tier(document: &Html, ctx: &ListingContext) -> Option<Vec<ListingItem>> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for link in document.select(&listing::ANY_LINK) {
        if items.len() >= ctx.cap() {
            break;
        }

        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let Some(url) = ctx.resolve(href) else {
            continue;
        };

        if !url.path().contains(listing::TITLE_ID_PATH) || ctx.is_self_link(&url) {
            continue;
        }

        if !seen.insert(url.clone()) {
            trace!("Duplicate link skipped: {}", url);
            continue;
        }

        let title = strip_ordinal(&element_text(link));
        items.push(ListingItem::new(url).with_title(title));
    }

    non_empty(items)
}

/// Removes a leading rank such as "1. " from a chart title.
pub fn strip_ordinal(text: &str) -> Option<String> {
    let title = ORDINAL_PREFIX.replace(text.trim(), "").trim().to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

fn non_empty(items: Vec<ListingItem>) -> Option<Vec<ListingItem>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
