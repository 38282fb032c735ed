//! # Rescue Screener
//!
//! Revisits stage-1 exclusions with abstract-level evidence.
//!
//! The acceptance predicate is stricter than stage 2 because title-level
//! evidence has already failed:
//!
//! - no text: `keep_no_abstract` (left for manual review)
//! - MV, weaning and (RL, unless strict mode is off): `rescue`
//! - otherwise: `confirmed_exclude`
//!
//! Confirmed exclusions are omitted from the candidates but remain in the
//! outcome and in the counts.

use crate::abstracts::annotate;
use crate::evidence::EvidenceMatcher;
use crate::provider::{AbstractResolver, LookupStats};
use crate::types::{AbstractEvidence, AbstractScreened, Decision, TitleScreened};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RescueCounts {
    pub checked: usize,
    pub rescued: usize,
    pub no_abstract: usize,
    pub confirmed_exclude: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RescueOutcome {
    /// `rescue` and `keep_no_abstract` records, in input order.
    pub candidates: Vec<AbstractScreened>,
    /// `confirmed_exclude` records.
    pub confirmed_excluded: Vec<AbstractScreened>,
    pub counts: RescueCounts,
    pub lookups: LookupStats,
}

impl RescueOutcome {
    /// Records promoted back into the candidate set.
    pub fn rescued(&self) -> impl Iterator<Item = &AbstractScreened> {
        self.candidates
            .iter()
            .filter(|r| r.decision == Decision::Rescue)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RescueScreener<'m> {
    matcher: &'m EvidenceMatcher,
    strict_require_rl: bool,
}

impl<'m> RescueScreener<'m> {
    #[must_use]
    pub fn new(matcher: &'m EvidenceMatcher, strict_require_rl: bool) -> Self {
        Self {
            matcher,
            strict_require_rl,
        }
    }

    /// Rescue decision for a record whose abstract was found.
    #[must_use]
    pub fn decide(&self, evidence: &AbstractEvidence) -> Decision {
        let admits = evidence.match_mv_abs
            && evidence.match_wean_abs
            && (evidence.match_rl_abs || !self.strict_require_rl);
        if admits {
            Decision::Rescue
        } else {
            Decision::ConfirmedExclude
        }
    }

    /// Fetch abstracts for `screened_out` and classify every record.
    pub fn screen(
        &self,
        screened_out: Vec<TitleScreened>,
        resolver: &AbstractResolver<'_>,
    ) -> RescueOutcome {
        let resolution = resolver.resolve(&screened_out);
        let mut outcome = RescueOutcome {
            lookups: resolution.stats,
            ..RescueOutcome::default()
        };

        for (screened, resolved) in screened_out.into_iter().zip(resolution.texts) {
            let annotated = annotate(self.matcher, screened, resolved, |e| self.decide(e));
            outcome.counts.checked += 1;
            match annotated.decision {
                Decision::ConfirmedExclude | Decision::DropByAbstract => {
                    outcome.counts.confirmed_exclude += 1;
                    outcome.confirmed_excluded.push(annotated);
                }
                Decision::Rescue | Decision::Keep => {
                    outcome.counts.rescued += 1;
                    outcome.candidates.push(annotated);
                }
                Decision::KeepNoAbstract => {
                    outcome.counts.no_abstract += 1;
                    outcome.candidates.push(annotated);
                }
            }
        }

        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================
