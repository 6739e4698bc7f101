//! Data models for listing entries and title records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title used for the record emitted when a title page cannot be fetched.
pub const CONNECTION_ERROR_TITLE: &str = "connection error";

/// Marker rendered for values that were looked for and not found.
pub const NOT_AVAILABLE: &str = "N/A";

/// One entry recovered from the listing page.
///
/// Only `url` is guaranteed. The remaining fields are filled when the
/// listing page carries them (structured data, or a visible title in the
/// HTML tiers) and serve as fallbacks for the title page record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingItem {
    /// Absolute URL of the title page
    pub url: String,
    pub title: Option<String>,
    pub year: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub duration_minutes: Option<u32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl ListingItem {
    /// Creates an item carrying nothing but its URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), ..Self::default() }
    }

    /// Sets the listing-stage title.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

/// Metascore probe outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Metascore {
    Score(String),
    /// The page was checked and carries no metascore
    NotAvailable,
}

impl Metascore {
    /// Returns the score when one was found.
    pub fn score(&self) -> Option<&str> {
        match self {
            Metascore::Score(s) => Some(s),
            Metascore::NotAvailable => None,
        }
    }
}

impl fmt::Display for Metascore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metascore::Score(s) => write!(f, "{}", s),
            Metascore::NotAvailable => write!(f, "{}", NOT_AVAILABLE),
        }
    }
}

impl From<String> for Metascore {
    fn from(value: String) -> Self {
        if value.is_empty() || value == NOT_AVAILABLE {
            Metascore::NotAvailable
        } else {
            Metascore::Score(value)
        }
    }
}

impl From<Metascore> for String {
    fn from(value: Metascore) -> Self {
        value.to_string()
    }
}

/// Everything known about one title.
///
/// Each field is independently optional except `source_url`. `None` means
/// the value was not found; `Some("")` means a value was found but is
/// empty. Both count as missing when merging with listing data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRecord {
    pub title: Option<String>,
    /// Full date ("1994-10-14") or bare year
    pub year: Option<String>,
    pub rating: Option<String>,
    pub rating_count: Option<String>,
    pub duration_minutes: Option<u32>,
    /// `None` until the metascore probe has run
    pub metascore: Option<Metascore>,
    /// Up to three leading cast members
    pub actors: Vec<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub source_url: String,
    /// Set only by [`DetailRecord::connection_error`]; not serialized
    #[serde(skip)]
    fetch_failed: bool,
}

impl DetailRecord {
    /// Creates an empty record for the given page.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            title: None,
            year: None,
            rating: None,
            rating_count: None,
            duration_minutes: None,
            metascore: None,
            actors: Vec::new(),
            genre: None,
            description: None,
            image: None,
            source_url: source_url.into(),
            fetch_failed: false,
        }
    }

    /// Sentinel record for a title page that could not be fetched.
    pub fn connection_error(source_url: impl Into<String>) -> Self {
        Self {
            title: Some(CONNECTION_ERROR_TITLE.to_string()),
            year: Some(NOT_AVAILABLE.to_string()),
            rating: Some(NOT_AVAILABLE.to_string()),
            duration_minutes: Some(0),
            metascore: Some(Metascore::NotAvailable),
            fetch_failed: true,
            ..Self::new(source_url)
        }
    }

    /// True for the sentinel produced by [`DetailRecord::connection_error`].
    ///
    /// A page that merely carries the sentinel's title is not a failure.
    /// The marker does not survive a JSON round trip.
    pub fn is_connection_error(&self) -> bool {
        self.fetch_failed
    }

    /// True when the record has a non-empty title.
    pub fn has_title(&self) -> bool {
        present(&self.title).is_some()
    }

    /// Fills missing or empty fields from the listing entry.
    ///
    /// Detail values win; listing values are used only where the detail
    /// value is absent, empty, or a zero duration. The source URL is the
    /// listing URL. A connection-error sentinel is returned untouched.
    pub fn merge_listing(self, listing: &ListingItem) -> Self {
        if self.is_connection_error() {
            return self;
        }

        Self {
            title: prefer(self.title, &listing.title),
            year: prefer(self.year, &listing.year),
            rating: prefer(self.rating, &listing.rating),
            rating_count: prefer(self.rating_count, &listing.rating_count),
            duration_minutes: self
                .duration_minutes
                .filter(|m| *m > 0)
                .or(listing.duration_minutes.filter(|m| *m > 0))
                .or(self.duration_minutes),
            metascore: self.metascore,
            actors: self.actors,
            genre: prefer(self.genre, &listing.genre),
            description: prefer(self.description, &listing.description),
            image: prefer(self.image, &listing.image),
            source_url: listing.url.clone(),
            fetch_failed: false,
        }
    }

    /// Year reduced to its leading component for display.
    pub fn display_year(&self) -> Option<&str> {
        self.year.as_deref().map(normalize_year)
    }

    /// Actor at the given position, if any.
    pub fn actor(&self, index: usize) -> Option<&str> {
        self.actors.get(index).map(String::as_str)
    }
}

/// Keeps only the year of a date-like value: "2023-01-15" becomes "2023".
pub fn normalize_year(value: &str) -> &str {
    match value.split_once('-') {
        Some((year, _)) => year,
        None => value,
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn prefer(detail: Option<String>, listing: &Option<String>) -> Option<String> {
    if present(&detail).is_some() {
        return detail;
    }
    match present(listing) {
        Some(v) => Some(v.to_string()),
        None => detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_with_year(year: &str) -> ListingItem {
        ListingItem {
            year: Some(year.to_string()),
            ..ListingItem::new("https://www.imdb.com/title/tt0111161/")
        }
    }

    #[test]
    fn test_merge_falls_back_to_listing() {
        let detail = DetailRecord::new("https://www.imdb.com/title/tt0111161/");
        let merged = detail.merge_listing(&listing_with_year("2023"));
        assert_eq!(merged.year.as_deref(), Some("2023"));
    }

    #[test]
    fn test_merge_prefers_detail() {
        let mut detail = DetailRecord::new("https://www.imdb.com/title/tt0111161/");
        detail.year = Some("2024".to_string());
        let merged = detail.merge_listing(&listing_with_year("2023"));
        assert_eq!(merged.year.as_deref(), Some("2024"));
    }

    #[test]
    fn test_merge_empty_detail_value_is_falsy() {
        let mut detail = DetailRecord::new("u");
        detail.year = Some(String::new());
        let merged = detail.merge_listing(&listing_with_year("2023"));
        assert_eq!(merged.year.as_deref(), Some("2023"));
    }

    #[test]
    fn test_merge_both_absent_stays_absent() {
        let merged = DetailRecord::new("u").merge_listing(&ListingItem::new("u"));
        assert!(merged.title.is_none());
        assert!(merged.rating.is_none());
        assert!(merged.duration_minutes.is_none());
        assert!(merged.metascore.is_none());
    }

    #[test]
    fn test_merge_empty_on_both_sides_keeps_detail_empty() {
        let mut detail = DetailRecord::new("u");
        detail.genre = Some(String::new());
        let merged = detail.merge_listing(&ListingItem::new("u"));
        assert_eq!(merged.genre.as_deref(), Some(""));
    }

    #[test]
    fn test_merge_zero_duration_is_falsy() {
        let mut detail = DetailRecord::new("u");
        detail.duration_minutes = Some(0);
        let listing = ListingItem { duration_minutes: Some(142), ..ListingItem::new("u") };
        assert_eq!(detail.merge_listing(&listing).duration_minutes, Some(142));

        let mut detail = DetailRecord::new("u");
        detail.duration_minutes = Some(0);
        assert_eq!(detail.merge_listing(&ListingItem::new("u")).duration_minutes, Some(0));
    }

    #[test]
    fn test_merge_uses_listing_url_and_listing_only_fields() {
        let listing = ListingItem {
            genre: Some("Drama".to_string()),
            description: Some("Two imprisoned men bond".to_string()),
            ..ListingItem::new("https://www.imdb.com/title/tt0111161/")
        };
        let merged = DetailRecord::new("https://www.imdb.com/title/tt0111161/?ref_=chttp")
            .merge_listing(&listing);
        assert_eq!(merged.source_url, "https://www.imdb.com/title/tt0111161/");
        assert_eq!(merged.genre.as_deref(), Some("Drama"));
        assert_eq!(merged.description.as_deref(), Some("Two imprisoned men bond"));
    }

    #[test]
    fn test_connection_error_sentinel() {
        let record = DetailRecord::connection_error("https://www.imdb.com/title/tt0068646/");
        assert_eq!(record.title.as_deref(), Some("connection error"));
        assert_eq!(record.year.as_deref(), Some("N/A"));
        assert_eq!(record.rating.as_deref(), Some("N/A"));
        assert_eq!(record.metascore, Some(Metascore::NotAvailable));
        assert!(record.actors.is_empty());
        assert_eq!(record.duration_minutes, Some(0));
        assert!(record.is_connection_error());
    }

    #[test]
    fn test_connection_error_not_merged() {
        let listing = ListingItem {
            title: Some("The Godfather".to_string()),
            ..ListingItem::new("https://www.imdb.com/title/tt0068646/")
        };
        let merged = DetailRecord::connection_error(&listing.url).merge_listing(&listing);
        assert_eq!(merged.title.as_deref(), Some("connection error"));
    }

    #[test]
    fn test_real_title_matching_sentinel_text_is_merged() {
        let mut detail = DetailRecord::new("https://www.imdb.com/title/tt9999999/");
        detail.title = Some("connection error".to_string());
        assert!(!detail.is_connection_error());

        let listing = ListingItem {
            year: Some("2021".to_string()),
            ..ListingItem::new("https://www.imdb.com/title/tt9999999/")
        };
        let merged = detail.merge_listing(&listing);
        assert!(!merged.is_connection_error());
        assert_eq!(merged.title.as_deref(), Some("connection error"));
        assert_eq!(merged.year.as_deref(), Some("2021"));
    }

    #[test]
    fn test_failure_marker_not_serialized() {
        let json = serde_json::to_value(DetailRecord::connection_error("u")).unwrap();
        assert!(json.get("fetchFailed").is_none());
        assert_eq!(json["title"], "connection error");
    }

    #[test]
    fn test_normalize_year() {
        assert_eq!(normalize_year("2023-01-15"), "2023");
        assert_eq!(normalize_year("2023"), "2023");
        assert_eq!(normalize_year(""), "");
    }

    #[test]
    fn test_display_year_and_actor() {
        let mut record = DetailRecord::new("u");
        record.year = Some("1994-10-14".to_string());
        record.actors = vec!["Tim Robbins".to_string()];
        assert_eq!(record.display_year(), Some("1994"));
        assert_eq!(record.actor(0), Some("Tim Robbins"));
        assert_eq!(record.actor(1), None);
    }

    #[test]
    fn test_metascore_serde() {
        let score = serde_json::to_string(&Metascore::Score("82".to_string())).unwrap();
        assert_eq!(score, "\"82\"");
        let missing = serde_json::to_string(&Metascore::NotAvailable).unwrap();
        assert_eq!(missing, "\"N/A\"");

        let parsed: Metascore = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(parsed, Metascore::NotAvailable);
    }

    #[test]
    fn test_record_serializes_camel_case_with_nulls() {
        let mut record = DetailRecord::new("https://www.imdb.com/title/tt0111161/");
        record.duration_minutes = Some(142);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["durationMinutes"], 142);
        assert_eq!(json["sourceUrl"], "https://www.imdb.com/title/tt0111161/");
        assert!(json["title"].is_null());
        assert!(json["metascore"].is_null());
        assert!(json.get("ratingCount").is_some());
    }
}
