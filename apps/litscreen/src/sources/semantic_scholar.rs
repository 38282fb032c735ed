//! Semantic Scholar graph API pages (`items` or `data`).

use super::{first_non_empty, items, names, scalar, text, year};
use litscreen_core::{CanonicalRecord, Source};
use serde_json::Value;

pub(super) fn normalize(payload: &Value) -> Vec<CanonicalRecord> {
    items(payload, &["items", "data"]).iter().map(record).collect()
}

fn record(paper: &Value) -> CanonicalRecord {
    let external = paper.get("externalIds").unwrap_or(&Value::Null);
    let title = text(paper, "title");
    let url = text(paper, "url");
    let doi = first_non_empty(&[text(paper, "doi"), text(external, "DOI")]);

    let native = scalar(paper.get("paperId")).or_else(|| scalar(external.get("CorpusId")));
    let id = native.unwrap_or_else(|| first_non_empty(&[doi, url, title]).to_string());

    CanonicalRecord::new(Source::SemanticScholar, id)
        .with_title(title)
        .with_authors(names(paper.get("authors"), |a| a.get("name").and_then(Value::as_str)))
        .with_year(year(paper.get("year")))
        .with_doi(doi)
        .with_url(url)
        .with_venue(text(paper, "venue"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_data_array_and_external_ids() {
        let payload = json!({"data": [{
            "externalIds": {"DOI": "10.5/S2", "CorpusId": 991},
            "title": "Offline RL",
            "year": "2022",
            "venue": "ICML",
            "authors": [{"name": "D Kim"}, {"name": ""}]
        }]});
        let r = &normalize(&payload)[0];
        assert_eq!(r.native_id, "991");
        assert_eq!(r.doi.as_deref(), Some("10.5/s2"));
        assert_eq!(r.year, Some(2022));
        assert_eq!(r.venue, "ICML");
        assert_eq!(r.authors, vec!["D Kim"]);
    }

    #[test]
    fn paper_id_preferred() {
        let payload = json!({"items": [{"paperId": "abc", "externalIds": {"CorpusId": 1}}]});
        assert_eq!(normalize(&payload)[0].native_id, "abc");
    }
}
