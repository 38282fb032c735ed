//! Web of Science starter API pages
//! (`{"pages": [{"payload": {"Data": {"Records": [...]}}}]}`).
//!
//! Records carry no structured DOI field in this payload shape, so it is
//! sniffed from the serialized record. The year comes from
//! `Source.Published.BibYear` or `static_data.summary.pub_info.pubyear`,
//! and is sniffed only when both are absent.

use super::{first_non_empty, text, year};
use litscreen_core::text::safe_year;
use litscreen_core::{CanonicalRecord, Source};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static DOI_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"10\.\d{4,9}/[^\s"]+"#).ok());

pub(super) fn normalize(payload: &Value) -> Vec<CanonicalRecord> {
    let Some(pages) = payload.get("pages").and_then(Value::as_array) else {
        return Vec::new();
    };
    pages
        .iter()
        .filter_map(|page| {
            page.get("payload")
                .and_then(|p| p.get("Data"))
                .and_then(|d| d.get("Records"))
                .and_then(Value::as_array)
        })
        .flatten()
        .map(record)
        .collect()
}

fn record(rec: &Value) -> CanonicalRecord {
    let uid = first_non_empty(&[text(rec, "UID"), text(rec, "uid")]);
    let serialized = rec.to_string();

    let url = if uid.is_empty() {
        String::new()
    } else {
        format!("https://www.webofscience.com/wos/woscc/full-record/{}", uid)
    };

    CanonicalRecord::new(Source::WebOfScience, uid)
        .with_title(title(rec))
        .with_year(published_year(rec))
        .with_doi(&sniff_doi(&serialized).unwrap_or_default())
        .with_url(&url)
}

/// `Title` is either a list of `{"Title": ..}` objects or a single one.
fn title(rec: &Value) -> &str {
    match rec.get("Title") {
        Some(Value::Array(list)) => list.first().map(|t| text(t, "Title")).unwrap_or_default(),
        Some(obj @ Value::Object(_)) => text(obj, "Title"),
        Some(Value::String(s)) => s,
        _ => "",
    }
}

fn published_year(rec: &Value) -> Option<i32> {
    let bib_year = rec
        .pointer("/Source/Published/BibYear")
        .or_else(|| rec.pointer("/static_data/summary/pub_info/pubyear"));
    year(bib_year).or_else(|| sniff_year(rec))
}

/// First plausible year outside the identifier fields.
///
/// WoS accession numbers (`WOS:000459123200015`) and DOIs embed digit runs
/// that look like years, so both are blanked before sniffing.
fn sniff_year(rec: &Value) -> Option<i32> {
    let mut stripped = rec.clone();
    if let Some(fields) = stripped.as_object_mut() {
        fields.remove("UID");
        fields.remove("uid");
    }
    let serialized = stripped.to_string();
    match DOI_PATTERN.as_ref() {
        Some(pattern) => safe_year(&pattern.replace_all(&serialized, " ")),
        None => safe_year(&serialized),
    }
}

fn sniff_doi(serialized: &str) -> Option<String> {
    let pattern = DOI_PATTERN.as_ref()?;
    let found = pattern.find(serialized)?.as_str();
    let trimmed = found.trim_end_matches(['.', ',', ';', ')', ']', '}', '\\']);
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
