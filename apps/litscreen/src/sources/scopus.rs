//! Scopus search results (`entries` or `search-results.entry`).

use super::{first_non_empty, items, scalar, text};
use litscreen_core::text::safe_year;
use litscreen_core::{CanonicalRecord, Source};
use serde_json::Value;

pub(super) fn normalize(payload: &Value) -> Vec<CanonicalRecord> {
    let entries = items(payload, &["entries"]);
    let entries = if entries.is_empty() {
        payload
            .get("search-results")
            .map(|sr| items(sr, &["entry"]))
            .unwrap_or_default()
    } else {
        entries
    };
    entries.iter().map(record).collect()
}

fn record(entry: &Value) -> CanonicalRecord {
    let title = first_non_empty(&[text(entry, "dc:title"), text(entry, "title")]);
    let doi = text(entry, "prism:doi");

    let first_link = entry
        .get("link")
        .and_then(Value::as_array)
        .and_then(|l| l.first())
        .map(|l| text(l, "@href"))
        .unwrap_or_default();
    let url = first_non_empty(&[text(entry, "prism:url"), first_link]);

    let id = scalar(entry.get("dc:identifier"))
        .unwrap_or_else(|| first_non_empty(&[doi, url, title]).to_string());

    CanonicalRecord::new(Source::Scopus, id)
        .with_title(title)
        .with_authors(authors(entry))
        .with_year(safe_year(text(entry, "prism:coverDate")))
        .with_doi(doi)
        .with_url(url)
        .with_venue(text(entry, "prism:publicationName"))
}

/// `author[]` objects carry `authname`, or `given-name` plus `surname`.
fn authors(entry: &Value) -> Vec<String> {
    let Some(list) = entry.get("author").and_then(Value::as_array) else {
        return Vec::new();
    };
    list.iter()
        .filter_map(|a| {
            let authname = text(a, "authname");
            if !authname.trim().is_empty() {
                return Some(authname.to_string());
            }
            let full = format!("{} {}", text(a, "given-name"), text(a, "surname"));
            let full = full.trim();
            (!full.is_empty()).then(|| full.to_string())
        })
        .collect()
}
