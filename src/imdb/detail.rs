//! Title page extraction.
//!
//! The JSON-LD block is the primary source. When it yields no title, each
//! field is probed in the markup on its own (primary selector, then a
//! secondary one) and fills whatever the JSON-LD left empty. The metascore
//! is never part of the JSON-LD and is always probed in the markup.

use crate::imdb::models::{DetailRecord, Metascore};
use crate::imdb::selectors::title;
use crate::imdb::{element_text, structured};
use regex_lite::{Captures, Regex};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, trace};

/// Cast members kept per title.
pub const MAX_ACTORS: usize = 3;

static RUNTIME_HOURS_MINUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*h(?:ours?)?\s*(\d+)\s*m").unwrap());
static RUNTIME_MINUTES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*min").unwrap());
static RUNTIME_HOURS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s*h").unwrap());

/// Extracts a record from a title page.
pub fn extract_detail(html: &str, source_url: &str) -> DetailRecord {
    let document = Html::parse_document(html);
    let mut record = DetailRecord::new(source_url);

    match primary_node(&document) {
        Some(node) => apply_structured(&mut record, &node),
        None => debug!("No JSON-LD on {}", source_url),
    }

    if record.has_title() {
        trace!("JSON-LD provided the title for {}", source_url);
    } else {
        debug!("Falling back to markup selectors for {}", source_url);
        apply_markup(&mut record, &document);
    }

    record.metascore = Some(probe_metascore(&document));

    debug!(
        "Extracted {}: title={} year={} rating={} runtime={} actors={} metascore={}",
        source_url,
        record.has_title(),
        record.year.is_some(),
        record.rating.is_some(),
        record.duration_minutes.is_some(),
        record.actors.len(),
        record.metascore.as_ref().and_then(Metascore::score).is_some(),
    );

    record
}

/// The JSON-LD node describing the title: the first object with a name,
/// or failing that the first object at all.
fn primary_node(document: &Html) -> Option<Value> {
    let nodes: Vec<Value> =
        structured::blocks(document).into_iter().filter(Value::is_object).collect();
    let named = nodes.iter().position(|n| n.get("name").is_some());
    nodes.into_iter().nth(named.unwrap_or(0))
}

fn apply_structured(record: &mut DetailRecord, node: &Value) {
    record.title = structured::text(node, "name");
    record.year = structured::text(node, "datePublished");
    record.rating = structured::nested_text(node, "aggregateRating", "ratingValue");
    record.rating_count = structured::nested_text(node, "aggregateRating", "ratingCount");
    record.duration_minutes = structured::duration(node, "duration");
    record.genre = structured::joined(node, "genre");
    record.description = structured::text(node, "description");
    record.image = structured::image(node, "image");
    record.actors = structured_actors(node);
}

fn structured_actors(node: &Value) -> Vec<String> {
    let entries: Vec<&Value> = match node.get("actor") {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(single) if single.is_object() => vec![single],
        _ => return Vec::new(),
    };

    entries
        .into_iter()
        .take(MAX_ACTORS)
        .filter_map(|actor| structured::text(actor, "name"))
        .filter(|name| !name.is_empty())
        .collect()
}

fn apply_markup(record: &mut DetailRecord, document: &Html) {
    fill(&mut record.title, probe_text(document, &title::HEADING, &title::HEADING_FALLBACK));
    fill(&mut record.year, probe_text(document, &title::YEAR, &title::YEAR_FALLBACK));
    fill(&mut record.rating, probe_text(document, &title::RATING, &title::RATING_FALLBACK));

    if record.duration_minutes.filter(|m| *m > 0).is_none() {
        let runtime = probe_text(document, &title::RUNTIME, &title::RUNTIME_FALLBACK)
            .as_deref()
            .and_then(parse_runtime);
        if runtime.is_some() {
            record.duration_minutes = runtime;
        }
    }

    if record.actors.is_empty() {
        record.actors = probe_actors(document);
    }
}

/// Replaces a missing or empty value with a probed one.
fn fill(slot: &mut Option<String>, probed: Option<String>) {
    let missing = slot.as_deref().map_or(true, |v| v.trim().is_empty());
    if missing && probed.is_some() {
        *slot = probed;
    }
}

/// Text of the first element matching `primary`, else `secondary`.
///
/// `None` when neither selector matches; an element with no text gives
/// `Some("")`.
fn probe_text(document: &Html, primary: &Selector, secondary: &Selector) -> Option<String> {
    document
        .select(primary)
        .next()
        .or_else(|| document.select(secondary).next())
        .map(element_text)
}

fn probe_actors(document: &Html) -> Vec<String> {
    let names = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(element_text)
            .filter(|name| !name.is_empty())
            .take(MAX_ACTORS)
            .collect()
    };

    let actors = names(&title::CAST);
    if actors.is_empty() {
        names(&title::CAST_FALLBACK)
    } else {
        actors
    }
}

/// Probes the metascore candidates in order; the first one with text wins.
pub fn probe_metascore(document: &Html) -> Metascore {
    title::METASCORE
        .iter()
        .filter_map(|selector| document.select(selector).next())
        .map(element_text)
        .find(|text| !text.is_empty())
        .map(Metascore::Score)
        .unwrap_or(Metascore::NotAvailable)
}

/// Converts displayed runtimes ("2h 22m", "142 min", "2h") to minutes.
pub fn parse_runtime(text: &str) -> Option<u32> {
    if let Some(caps) = RUNTIME_HOURS_MINUTES.captures(text) {
        return number(&caps, 1)?.checked_mul(60)?.checked_add(number(&caps, 2)?);
    }
    if let Some(caps) = RUNTIME_MINUTES.captures(text) {
        return number(&caps, 1);
    }
    if let Some(caps) = RUNTIME_HOURS.captures(text) {
        return number(&caps, 1)?.checked_mul(60);
    }
    None
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group)?.as_str().parse().ok()
}
