//! # Identity Resolver & Merger
//!
//! Clusters records describing the same publication and keeps one
//! representative per cluster.
//!
//! ## Identity key
//!
//! - `Doi(doi)` when the record carries a non-empty DOI.
//! - `Title("{title_key}|{year}")`, or `Title("{title_key}")` without a year.
//! - `None` when the normalized title is empty: the record is identity-less
//!   and passes through as its own singleton cluster.
//!
//! ## Tie-break
//!
//! `choose_better` selects a whole record, never a field-level union:
//!
//! 1. a record with a DOI beats one without,
//! 2. then the strictly longer title (in characters),
//! 3. then the earlier source in priority order,
//! 4. then the record seen first.
//!
//! The last rule makes a full tie order-dependent. Output order is
//! deterministic for a given input order.

use crate::text::title_key;
use crate::types::CanonicalRecord;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Key under which duplicate records are clustered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdentityKey {
    /// Normalized DOI.
    Doi(String),
    /// Normalized title, joined with the year when known.
    Title(String),
}

/// Derive the identity key of a record.
#[must_use]
pub fn identity_key(record: &CanonicalRecord) -> Option<IdentityKey> {
    if let Some(doi) = record.doi.as_deref().filter(|d| !d.trim().is_empty()) {
        return Some(IdentityKey::Doi(doi.trim().to_lowercase()));
    }

    let key = title_key(&record.title);
    if key.is_empty() {
        return None;
    }

    Some(IdentityKey::Title(match record.year {
        Some(year) => format!("{}|{}", key, year),
        None => key,
    }))
}

/// Rank `candidate` against `incumbent`; `Greater` means the candidate wins.
fn prefer(incumbent: &CanonicalRecord, candidate: &CanonicalRecord) -> Ordering {
    candidate
        .has_doi()
        .cmp(&incumbent.has_doi())
        .then_with(|| candidate.title_len().cmp(&incumbent.title_len()))
        .then_with(|| {
            incumbent
                .source
                .priority()
                .cmp(&candidate.source.priority())
        })
}

/// Pick the survivor of two records sharing an identity key.
///
/// `a` is the record seen first and wins every full tie.
#[must_use]
pub fn choose_better<'a>(a: &'a CanonicalRecord, b: &'a CanonicalRecord) -> &'a CanonicalRecord {
    if prefer(a, b) == Ordering::Greater { b } else { a }
}

/// Result of one merge pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// One record per identity key plus every identity-less record, in order
    /// of first appearance.
    pub records: Vec<CanonicalRecord>,
    /// Number of input records.
    pub input_total: usize,
    /// Number of distinct identity keys.
    pub clusters: usize,
    /// Input records absorbed into an existing cluster.
    pub duplicates_collapsed: usize,
    /// Records passed through without an identity key.
    pub identity_less: usize,
}

/// Merge duplicate records with a left fold over `records`.
#[must_use]
pub fn merge(records: Vec<CanonicalRecord>) -> MergeOutcome {
    let input_total = records.len();
    let mut slots: Vec<CanonicalRecord> = Vec::with_capacity(input_total);
    let mut by_key: BTreeMap<IdentityKey, usize> = BTreeMap::new();
    let mut duplicates_collapsed = 0;
    let mut identity_less = 0;

    for record in records {
        let Some(key) = identity_key(&record) else {
            identity_less += 1;
            slots.push(record);
            continue;
        };

        match by_key.get(&key).copied() {
            Some(index) => {
                duplicates_collapsed += 1;
                if let Some(incumbent) = slots.get_mut(index)
                    && prefer(incumbent, &record) == Ordering::Greater
                {
                    *incumbent = record;
                }
            }
            None => {
                by_key.insert(key, slots.len());
                slots.push(record);
            }
        }
    }

    MergeOutcome {
        records: slots,
        input_total,
        clusters: by_key.len(),
        duplicates_collapsed,
        identity_less,
    }
}

// =============================================================================
// TESTS
// =============================================================================
