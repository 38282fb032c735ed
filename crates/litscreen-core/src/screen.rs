//! # Stage-1 Screener
//!
//! Title-level classification of merged records.
//!
//! The evidence blob is the title, the venue and every non-empty `extra`
//! value (search snippets, publication summaries) joined by single spaces.
//! A record is screened in iff MV and weaning evidence are present, and RL
//! evidence too when `strict_require_rl` is set.

use crate::evidence::EvidenceMatcher;
use crate::types::{CanonicalRecord, ExcludeReason, TitleEvidence, TitleScreened};
use serde::Serialize;

/// Two disjoint partitions covering every input record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TitleScreenOutcome {
    pub screened_in: Vec<TitleScreened>,
    pub screened_out: Vec<TitleScreened>,
}

impl TitleScreenOutcome {
    /// Total records classified.
    #[must_use]
    pub fn total(&self) -> usize {
        self.screened_in.len() + self.screened_out.len()
    }
}

/// Build the title-level evidence blob of a record.
#[must_use]
pub fn title_blob(record: &CanonicalRecord) -> String {
    [record.title.as_str(), record.venue.as_str()]
        .into_iter()
        .chain(record.extra.values().map(String::as_str))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stage-1 screener bound to a compiled matcher.
#[derive(Debug, Clone, Copy)]
pub struct TitleScreener<'m> {
    matcher: &'m EvidenceMatcher,
    strict_require_rl: bool,
}

impl<'m> TitleScreener<'m> {
    #[must_use]
    pub fn new(matcher: &'m EvidenceMatcher, strict_require_rl: bool) -> Self {
        Self {
            matcher,
            strict_require_rl,
        }
    }

    /// Whether title-level evidence admits a record.
    #[must_use]
    pub fn admits(&self, evidence: &TitleEvidence) -> bool {
        evidence.match_mv
            && evidence.match_weaning
            && (evidence.match_rl || !self.strict_require_rl)
    }

    /// Ordered reason codes for a failed predicate.
    #[must_use]
    pub fn reasons(&self, evidence: &TitleEvidence) -> Vec<ExcludeReason> {
        let mut reasons = Vec::new();
        if !evidence.match_mv {
            reasons.push(ExcludeReason::NoMv);
        }
        if !evidence.match_weaning {
            reasons.push(ExcludeReason::NoWeaning);
        }
        if self.strict_require_rl && !evidence.match_rl {
            reasons.push(ExcludeReason::NoRl);
        }
        if reasons.is_empty() {
            reasons.push(ExcludeReason::NoMatch);
        }
        reasons
    }

    /// Annotate a single record.
    #[must_use]
    pub fn classify(&self, record: CanonicalRecord) -> (bool, TitleScreened) {
        let evidence = self.matcher.assess_title(&title_blob(&record));
        let admitted = self.admits(&evidence);
        let auto_exclude_reason = if admitted {
            Vec::new()
        } else {
            self.reasons(&evidence)
        };

        (
            admitted,
            TitleScreened {
                record,
                evidence,
                auto_exclude_reason,
            },
        )
    }

    /// Partition merged records into screened-in and screened-out.
    #[must_use]
    pub fn screen(&self, records: Vec<CanonicalRecord>) -> TitleScreenOutcome {
        let mut outcome = TitleScreenOutcome::default();
        for record in records {
            let (admitted, screened) = self.classify(record);
            if admitted {
                outcome.screened_in.push(screened);
            } else {
                outcome.screened_out.push(screened);
            }
        }
        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================
