//! IMDb-specific modules for HTTP fetching, extraction, and data models.

pub mod client;
pub mod detail;
pub mod listing;
pub mod models;
pub mod selectors;
pub mod structured;

pub use client::{ImdbClient, ImdbFetch};
pub use detail::extract_detail;
pub use listing::{extract_listing, ListingContext};
pub use models::{DetailRecord, ListingItem, Metascore};

use scraper::ElementRef;

/// Visible text of an element with whitespace runs collapsed.
pub(crate) fn element_text(element: ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}
