//! JSON-LD helpers shared by the listing and title extractors.

use crate::imdb::selectors::structured;
use regex_lite::Regex;
use scraper::Html;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

static ISO_DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?").unwrap());

/// Parses every JSON-LD block on the page, in document order.
///
/// Blocks that are not valid JSON are logged and skipped. Top-level arrays
/// are flattened so each yielded value is a single JSON-LD node.
pub fn blocks(document: &Html) -> Vec<Value> {
    let mut nodes = Vec::new();

    for script in document.select(&structured::JSON_LD) {
        let raw = script.text().collect::<String>();
        if raw.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => nodes.extend(items),
            Ok(value) => nodes.push(value),
            Err(e) => warn!("Skipping malformed JSON-LD block: {}", e),
        }
    }

    debug!("Found {} JSON-LD nodes", nodes.len());
    nodes
}

/// Converts an ISO-8601 duration like "PT2H22M" into minutes.
///
/// Hours and minutes are both optional ("PT45M", "PT2H", even "PT" is 0).
/// Anything not starting with "PT" is malformed and yields `None`.
pub fn parse_duration(token: &str) -> Option<u32> {
    let caps = ISO_DURATION.captures(token.trim())?;

    let part = |i: usize| -> Option<u32> {
        match caps.get(i) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    part(1)?.checked_mul(60)?.checked_add(part(2)?)
}

/// Reads a scalar field as a string. Numbers keep their JSON rendering.
pub fn text(node: &Value, key: &str) -> Option<String> {
    scalar(node.get(key)?)
}

/// Reads `parent.child` as a string, e.g. `aggregateRating.ratingValue`.
pub fn nested_text(node: &Value, parent: &str, child: &str) -> Option<String> {
    text(node.get(parent)?, child)
}

/// Reads a field that may be a string or a list of strings ("genre").
pub fn joined(node: &Value, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(scalar).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        other => scalar(other),
    }
}

/// Reads an image reference that may be a URL or an `ImageObject`.
pub fn image(node: &Value, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::Object(_) => text(node.get(key)?, "url"),
        Value::Array(items) => items.first().and_then(|first| match first {
            Value::Object(_) => text(first, "url"),
            other => scalar(other),
        }),
        other => scalar(other),
    }
}

/// Duration field converted to minutes.
pub fn duration(node: &Value, key: &str) -> Option<u32> {
    node.get(key)?.as_str().and_then(parse_duration)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_duration_hours_and_minutes() {
        assert_eq!(parse_duration("PT2H22M"), Some(142));
        assert_eq!(parse_duration("PT1H0M"), Some(60));
    }

    #[test]
    fn test_parse_duration_missing_parts() {
        assert_eq!(parse_duration("PT2H"), Some(120));
        assert_eq!(parse_duration("PT45M"), Some(45));
        assert_eq!(parse_duration("PT"), Some(0));
    }

    #[test]
    fn test_parse_duration_property() {
        for hours in [0u32, 1, 3, 12] {
            for minutes in [0u32, 1, 30, 59] {
                let token = format!("PT{}H{}M", hours, minutes);
                assert_eq!(parse_duration(&token), Some(hours * 60 + minutes), "{}", token);
            }
        }
    }

    #[test]
    fn test_parse_duration_malformed() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("2h 22m"), None);
        assert_eq!(parse_duration("P1D"), None);
        assert_eq!(parse_duration("PT99999999999H"), None);
    }

    #[test]
    fn test_blocks_skips_malformed_and_flattens() {
        let html = Html::parse_document(
            r#"<html><head>
                <script type="application/ld+json">{ not json</script>
                <script type="application/ld+json">[{"@type":"Movie"},{"@type":"Person"}]</script>
                <script type="application/ld+json">{"@type":"ItemList"}</script>
            </head></html>"#,
        );
        let nodes = blocks(&html);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0]["@type"], "Movie");
        assert_eq!(nodes[2]["@type"], "ItemList");
    }

    #[test]
    fn test_text_reads_numbers_and_strings() {
        let node = json!({"name": " Heat ", "aggregateRating": {"ratingValue": 8.3, "ratingCount": 712345}});
        assert_eq!(text(&node, "name").as_deref(), Some("Heat"));
        assert_eq!(nested_text(&node, "aggregateRating", "ratingValue").as_deref(), Some("8.3"));
        assert_eq!(nested_text(&node, "aggregateRating", "ratingCount").as_deref(), Some("712345"));
        assert_eq!(text(&node, "missing"), None);
    }

    #[test]
    fn test_joined_and_image() {
        let node = json!({
            "genre": ["Crime", "Drama"],
            "image": {"@type": "ImageObject", "url": "https://m.media-amazon.com/a.jpg"}
        });
        assert_eq!(joined(&node, "genre").as_deref(), Some("Crime, Drama"));
        assert_eq!(image(&node, "image").as_deref(), Some("https://m.media-amazon.com/a.jpg"));

        let flat = json!({"genre": "Drama", "image": "https://m.media-amazon.com/b.jpg"});
        assert_eq!(joined(&flat, "genre").as_deref(), Some("Drama"));
        assert_eq!(image(&flat, "image").as_deref(), Some("https://m.media-amazon.com/b.jpg"));
    }
}
