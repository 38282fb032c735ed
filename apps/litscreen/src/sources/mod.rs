//! # Source Normalizers
//!
//! Map each database's downloaded payload file into canonical records.
//!
//! Normalizers never fail per record: missing fields become empty or absent
//! canonical fields. A missing or unparsable payload file yields no records
//! and a warning.
//!
//! ## Payload files (under the raw directory)
//!
//! | Source | File |
//! |---|---|
//! | google_scholar | `google_scholar_all.json` |
//! | semantic_scholar | `semanticscholar_all.json` |
//! | openalex | `openalex_all.json` |
//! | arxiv | `arxiv_all.json` |
//! | scopus | `scopus_all.json` |
//! | web_of_science | `wos_all.json` |
//! | pubmed | `pubmed_esearch_all.json` |

mod arxiv;
mod google_scholar;
mod openalex;
mod pubmed;
mod scopus;
mod semantic_scholar;
mod wos;

use litscreen_core::{CanonicalRecord, Source};
use serde_json::Value;
use std::path::Path;

/// Concatenation order used by [`normalize_all`].
pub const LOAD_ORDER: [Source; 7] = [
    Source::GoogleScholar,
    Source::SemanticScholar,
    Source::OpenAlex,
    Source::Arxiv,
    Source::Scopus,
    Source::WebOfScience,
    Source::Pubmed,
];

/// Payload file name for a source.
#[must_use]
pub fn payload_file(source: Source) -> &'static str {
    match source {
        Source::GoogleScholar => "google_scholar_all.json",
        Source::SemanticScholar => "semanticscholar_all.json",
        Source::OpenAlex => "openalex_all.json",
        Source::Arxiv => "arxiv_all.json",
        Source::Scopus => "scopus_all.json",
        Source::WebOfScience => "wos_all.json",
        Source::Pubmed => "pubmed_esearch_all.json",
    }
}

/// Normalize an already-parsed payload.
#[must_use]
pub fn normalize_payload(source: Source, payload: &Value) -> Vec<CanonicalRecord> {
    match source {
        Source::GoogleScholar => google_scholar::normalize(payload),
        Source::SemanticScholar => semantic_scholar::normalize(payload),
        Source::OpenAlex => openalex::normalize(payload),
        Source::Arxiv => arxiv::normalize(payload),
        Source::Scopus => scopus::normalize(payload),
        Source::WebOfScience => wos::normalize(payload),
        Source::Pubmed => pubmed::normalize(payload),
    }
}

/// Load and normalize one source's payload file from `raw_dir`.
pub fn load_source(raw_dir: &Path, source: Source) -> Vec<CanonicalRecord> {
    let path = raw_dir.join(payload_file(source));
    let Some(payload) = read_payload(&path) else {
        return Vec::new();
    };

    let records = normalize_payload(source, &payload);
    tracing::info!(source = %source, records = records.len(), "Normalized payload");
    records
}

/// Load every source in [`LOAD_ORDER`].
pub fn normalize_all(raw_dir: &Path) -> Vec<CanonicalRecord> {
    LOAD_ORDER
        .into_iter()
        .flat_map(|source| load_source(raw_dir, source))
        .collect()
}

fn read_payload(path: &Path) -> Option<Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("Skipping payload {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Unparsable payload {}: {}", path.display(), e);
            None
        }
    }
}

// =============================================================================
// FIELD HELPERS
// =============================================================================

/// String field, or `""` when absent or not a string.
pub(crate) fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or_default()
}

/// String or number rendered as text; `None` for anything else.
pub(crate) fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Year given as an integer or an all-digit string.
pub(crate) fn year(value: Option<&Value>) -> Option<i32> {
    match value? {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Array under the first key that holds a non-empty one.
pub(crate) fn items<'a>(payload: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .filter_map(|k| payload.get(*k).and_then(Value::as_array))
        .find(|arr| !arr.is_empty())
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// `name`-like string collected from every object in an array.
pub(crate) fn names(list: Option<&Value>, pick: impl Fn(&Value) -> Option<&str>) -> Vec<String> {
    list.and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter(|v| v.is_object())
                .filter_map(&pick)
                .filter(|n| !n.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// First non-empty candidate.
pub(crate) fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .find(|c| !c.trim().is_empty())
        .unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================
