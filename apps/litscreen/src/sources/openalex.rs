//! OpenAlex works (`items` or `results`).

use super::{items, names, text, year};
use litscreen_core::text::normalize_doi;
use litscreen_core::{CanonicalRecord, Source};
use serde_json::Value;

pub(super) fn normalize(payload: &Value) -> Vec<CanonicalRecord> {
    items(payload, &["items", "results"]).iter().map(record).collect()
}

fn record(work: &Value) -> CanonicalRecord {
    let id = text(work, "id");
    let doi = normalize_doi(text(work, "doi"));
    let url = match &doi {
        Some(d) => format!("https://doi.org/{}", d),
        None => id.to_string(),
    };

    let venue = work
        .get("host_venue")
        .map(|v| text(v, "display_name"))
        .unwrap_or_default();
    let authors = names(work.get("authorships"), |a| {
        a.get("author")
            .and_then(|au| au.get("display_name"))
            .and_then(Value::as_str)
    });

    CanonicalRecord::new(Source::OpenAlex, id)
        .with_title(text(work, "display_name"))
        .with_authors(authors)
        .with_year(year(work.get("publication_year")))
        .with_doi(doi.as_deref().unwrap_or_default())
        .with_url(&url)
        .with_venue(venue)
}
