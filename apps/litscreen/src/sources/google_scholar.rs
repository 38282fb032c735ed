//! Google Scholar organic results (`{"items": [...]}`).

use super::{first_non_empty, items, names, text, year};
use litscreen_core::text::safe_year;
use litscreen_core::{CanonicalRecord, Source};
use serde_json::Value;

/// Authors recovered from a summary line are capped at this many names.
const MAX_SUMMARY_AUTHORS: usize = 12;

pub(super) fn normalize(payload: &Value) -> Vec<CanonicalRecord> {
    items(payload, &["items"]).iter().map(record).collect()
}

fn record(item: &Value) -> CanonicalRecord {
    let title = text(item, "title");
    let snippet = text(item, "snippet");

    let first_resource = item
        .get("resources")
        .and_then(Value::as_array)
        .and_then(|r| r.first())
        .map(|r| text(r, "link"))
        .unwrap_or_default();
    let url = first_non_empty(&[text(item, "link"), first_resource]);

    let info = item.get("publication_info").unwrap_or(&Value::Null);
    let summary = text(info, "summary");

    let mut authors = names(info.get("authors"), |a| a.get("name").and_then(Value::as_str));
    if authors.is_empty() {
        authors = summary_authors(summary);
    }

    let year = year(item.get("year"))
        .or_else(|| year(info.get("year")))
        .or_else(|| safe_year(first_non_empty(&[summary, snippet])));

    let id = first_non_empty(&[url, title]);
    CanonicalRecord::new(Source::GoogleScholar, id)
        .with_title(title)
        .with_authors(authors)
        .with_year(year)
        .with_url(url)
        .with_extra("snippet", snippet)
        .with_extra("pub_summary", summary)
}

/// `"A Smith, B Jones - Journal, 2020 - site"` gives `["A Smith", "B Jones"]`.
fn summary_authors(summary: &str) -> Vec<String> {
    let Some((head, _)) = summary.split_once(" - ") else {
        return Vec::new();
    };
    head.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .take(MAX_SUMMARY_AUTHORS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falls_back_to_summary_and_resources() {
        let payload = json!({"items": [{
            "title": "RL for weaning",
            "resources": [{"link": "https://x.org/a.pdf"}],
            "snippet": "ventilator",
            "publication_info": {"summary": "A Smith, B Jones - Crit Care, 2021 - x.org"}
        }]});
        let records = normalize(&payload);
        let r = &records[0];
        assert_eq!(r.native_id, "https://x.org/a.pdf");
        assert_eq!(r.authors, vec!["A Smith", "B Jones"]);
        assert_eq!(r.year, Some(2021));
        assert_eq!(r.extra.get("snippet").map(String::as_str), Some("ventilator"));
        assert!(r.doi.is_none());
    }

    #[test]
    fn structured_authors_win() {
        let payload = json!({"items": [{
            "title": "T",
            "link": "https://x.org/t",
            "publication_info": {
                "summary": "Z Other - 2001",
                "authors": [{"name": "C Lee"}]
            }
        }]});
        assert_eq!(normalize(&payload)[0].authors, vec!["C Lee"]);
    }

    #[test]
    fn missing_items_yields_nothing() {
        assert!(normalize(&json!({})).is_empty());
    }
}
