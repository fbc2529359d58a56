//! Beverage-type discovery from an upstream directory index.
//!
//! The data provider has no endpoint that lists the beverage types of a
//! festival, but it serves an auto-generated index page for each festival
//! directory. Every `<name>.json` linked from that page is one beverage type.
//!
//! Only the pure parsing half lives here; fetching the page is done by the
//! HTTP handler through the [`HttpClient`](crate::ports::http_client::HttpClient) port.
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

/// Name of the derived listing file; the index page links to it too.
pub const LISTING_FILE_STEM: &str = "available_beverage_types";

/// Anchor tags with a double- or single-quoted `href` ending in `.json`.
/// Tag and attribute names are case-insensitive; other attributes may appear
/// before or after `href`. The attribute name must be whitespace-delimited so
/// `data-href` and friends are not mistaken for it.
static JSON_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i:<a)\s(?:[^>]*?\s)?(?i:href)\s*=\s*(?:"([^"]*\.json)"|'([^']*\.json)')"#)
        .expect("valid regex")
});

/// Extract the `href` values of every anchor pointing at a `.json` file, in
/// document order.
pub fn extract_json_links(html: &str) -> Vec<String> {
    JSON_ANCHOR
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Beverage type names listed in a directory index page, sorted by code point.
///
/// The listing file itself is skipped. Duplicates are kept: index pages list
/// each file once.
pub fn beverage_types_from_listing(html: &str) -> Vec<String> {
    let mut types: Vec<String> = extract_json_links(html)
        .into_iter()
        .filter_map(|href| href.strip_suffix(".json").map(str::to_string))
        .filter(|name| name != LISTING_FILE_STEM)
        .collect();
    types.sort();
    types
}

/// Body of a successful `/{festival}/available_beverage_types.json` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BeverageTypeListing {
    pub festival_id: String,
    pub available_beverage_types: Vec<String>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl BeverageTypeListing {
    pub fn new(festival_id: impl Into<String>, available_beverage_types: Vec<String>) -> Self {
        Self {
            festival_id: festival_id.into(),
            available_beverage_types,
            timestamp: Utc::now(),
        }
    }

    pub fn from_listing(festival_id: impl Into<String>, html: &str) -> Self {
        Self::new(festival_id, beverage_types_from_listing(html))
    }
}

/// ISO-8601 UTC with millisecond precision and a `Z` suffix,
/// e.g. `2025-05-19T10:15:30.123Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}
