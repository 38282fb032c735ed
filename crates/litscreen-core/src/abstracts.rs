//! # Abstract Enrichment & Stage-2 Screener
//!
//! Re-classifies screened-in records on abstract-level evidence.
//!
//! ## Decision (fail-open)
//!
//! - no text from any provider: `keep_no_abstract`
//! - MV and RL evidence in the abstract: `keep` (weaning is recorded, not
//!   required)
//! - otherwise: `drop_by_abstract`
//!
//! `kept` counts every retained record, so `kept + dropped_by_abstract ==
//! checked` and `no_abstract <= kept`.

use crate::evidence::EvidenceMatcher;
use crate::provider::{AbstractResolver, LookupStats, ResolvedAbstract};
use crate::types::{AbstractEvidence, AbstractScreened, Decision, TitleScreened};
use serde::{Deserialize, Serialize};

/// Stage-2 bucket sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractStageCounts {
    pub checked: usize,
    pub kept: usize,
    pub dropped_by_abstract: usize,
    pub no_abstract: usize,
}

/// Stage-2 result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AbstractStageOutcome {
    /// `keep` and `keep_no_abstract` records, in input order.
    pub kept: Vec<AbstractScreened>,
    /// `drop_by_abstract` records, kept addressable for audit.
    pub dropped: Vec<AbstractScreened>,
    pub counts: AbstractStageCounts,
    pub lookups: LookupStats,
}

/// Attach abstract text and abstract-level evidence to a stage-1 record.
///
/// Evidence is computed from the abstract alone; stage-1 flags are carried
/// unchanged and never reused.
pub(crate) fn annotate(
    matcher: &EvidenceMatcher,
    screened: TitleScreened,
    resolved: Option<ResolvedAbstract>,
    decide: impl Fn(&AbstractEvidence) -> Decision,
) -> AbstractScreened {
    let abstract_text = resolved.map(|r| r.text).unwrap_or_default();
    let (evidence, decision) = if abstract_text.is_empty() {
        (AbstractEvidence::default(), Decision::KeepNoAbstract)
    } else {
        let evidence = matcher.assess_abstract(&abstract_text);
        let decision = decide(&evidence);
        (evidence, decision)
    };

    AbstractScreened {
        screened,
        abstract_text,
        evidence,
        decision,
    }
}

/// Stage-2 screener.
#[derive(Debug, Clone, Copy)]
pub struct AbstractScreener<'m> {
    matcher: &'m EvidenceMatcher,
}

impl<'m> AbstractScreener<'m> {
    #[must_use]
    pub fn new(matcher: &'m EvidenceMatcher) -> Self {
        Self { matcher }
    }

    /// Stage-2 decision for a record whose abstract was found.
    #[must_use]
    pub fn decide(evidence: &AbstractEvidence) -> Decision {
        if evidence.match_mv_abs && evidence.match_rl_abs {
            Decision::Keep
        } else {
            Decision::DropByAbstract
        }
    }

    /// Fetch abstracts for `screened_in` and classify every record.
    pub fn screen(
        &self,
        screened_in: Vec<TitleScreened>,
        resolver: &AbstractResolver<'_>,
    ) -> AbstractStageOutcome {
        let resolution = resolver.resolve(&screened_in);
        let mut outcome = AbstractStageOutcome {
            lookups: resolution.stats,
            ..AbstractStageOutcome::default()
        };

        for (screened, resolved) in screened_in.into_iter().zip(resolution.texts) {
            let annotated = annotate(self.matcher, screened, resolved, Self::decide);
            outcome.counts.checked += 1;
            // rescue decisions never come out of `decide`; they map onto
            // the stage-2 bucket with the same polarity
            match annotated.decision {
                Decision::Keep | Decision::Rescue => {
                    outcome.counts.kept += 1;
                    outcome.kept.push(annotated);
                }
                Decision::KeepNoAbstract => {
                    outcome.counts.no_abstract += 1;
                    outcome.counts.kept += 1;
                    outcome.kept.push(annotated);
                }
                Decision::DropByAbstract | Decision::ConfirmedExclude => {
                    outcome.counts.dropped_by_abstract += 1;
                    outcome.dropped.push(annotated);
                }
            }
        }

        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FetchPolicy, ScreeningConfig};
    use crate::provider::{AbstractProvider, AbstractSources, LookupKind, ProviderError};
    use crate::types::{CanonicalRecord, Source, TitleEvidence};
    use std::collections::BTreeMap;

    struct Fixed(BTreeMap<String, String>);

    impl AbstractProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn max_batch(&self) -> usize {
            100
        }

        fn fetch(
            &self,
            _kind: LookupKind,
            keys: &[String],
        ) -> Result<BTreeMap<String, String>, ProviderError> {
            Ok(keys
                .iter()
                .filter_map(|k| self.0.get(k).map(|t| (k.clone(), t.clone())))
                .collect())
        }
    }

    fn screened(doi: &str) -> TitleScreened {
        TitleScreened {
            record: CanonicalRecord::new(Source::Scopus, doi)
                .with_title("Ventilator weaning")
                .with_doi(doi),
            evidence: TitleEvidence {
                match_mv: true,
                match_weaning: true,
                match_rl: false,
            },
            auto_exclude_reason: Vec::new(),
        }
    }

    #[test]
    fn decisions_and_counts() {
        let matcher = EvidenceMatcher::new(ScreeningConfig::default()).expect("compile");
        let provider = Fixed(
            [
                (
                    "10.1/keep",
                    "Offline reinforcement learning for mechanical ventilation.",
                ),
                ("10.1/drop", "A ventilator study without learning methods."),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        );
        let sources = AbstractSources::new().with(LookupKind::Doi, &provider);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(50));

        let outcome = AbstractScreener::new(&matcher).screen(
            vec![screened("10.1/keep"), screened("10.1/drop"), screened("10.1/none")],
            &resolver,
        );

        assert_eq!(
            outcome.counts,
            AbstractStageCounts {
                checked: 3,
                kept: 2,
                dropped_by_abstract: 1,
                no_abstract: 1,
            }
        );
        let decisions: Vec<Decision> = outcome.kept.iter().map(|r| r.decision).collect();
        assert_eq!(decisions, vec![Decision::Keep, Decision::KeepNoAbstract]);
        assert_eq!(outcome.dropped[0].decision, Decision::DropByAbstract);
        assert!(outcome.dropped[0].evidence.match_mv_abs);
        assert!(!outcome.dropped[0].evidence.match_rl_abs);
    }

    #[test]
    fn missing_abstract_clears_abstract_flags() {
        let matcher = EvidenceMatcher::new(ScreeningConfig::default()).expect("compile");
        let outcome =
            AbstractScreener::new(&matcher).screen(vec![screened("10.1/x")], &AbstractResolver::empty());
        let record = &outcome.kept[0];
        assert_eq!(record.decision, Decision::KeepNoAbstract);
        assert_eq!(record.evidence, AbstractEvidence::default());
        assert!(record.abstract_text.is_empty());
        assert!(record.screened.evidence.match_mv);
    }

    #[test]
    fn weaning_does_not_gate() {
        let evidence = AbstractEvidence {
            match_mv_abs: true,
            match_wean_abs: false,
            match_rl_abs: true,
        };
        assert_eq!(AbstractScreener::decide(&evidence), Decision::Keep);
    }
}
