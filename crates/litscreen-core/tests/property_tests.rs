//! # Property-Based Tests
//!
//! Merge, screening and accounting invariants checked with proptest.

use litscreen_core::{
    AbstractProvider, AbstractResolver, AbstractScreener, AbstractSources, CanonicalRecord,
    Decision, EvidenceMatcher, FetchPolicy, LookupKind, Pipeline, ProviderError, ScreeningConfig,
    Source, TitleScreener, choose_better, identity_key, merge,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// STRATEGIES
// =============================================================================

const TITLE_WORDS: [&str; 8] = [
    "ventilator",
    "weaning",
    "reinforcement learning",
    "sepsis",
    "Q-learning",
    "extubation",
    "cohort",
    "",
];

fn arb_source() -> impl Strategy<Value = Source> {
    (0usize..Source::ALL.len()).prop_map(|i| Source::ALL[i])
}

fn arb_title() -> impl Strategy<Value = String> {
    vec(0usize..TITLE_WORDS.len(), 0..4).prop_map(|idx| {
        idx.into_iter()
            .map(|i| TITLE_WORDS[i])
            .collect::<Vec<_>>()
            .join(" ")
    })
}

fn arb_record() -> impl Strategy<Value = CanonicalRecord> {
    (
        arb_source(),
        0u32..1000,
        arb_title(),
        proptest::option::of(2018i32..2021),
        proptest::option::of(0u8..4),
    )
        .prop_map(|(source, id, title, year, doi)| {
            let record = CanonicalRecord::new(source, format!("id-{}", id))
                .with_title(&title)
                .with_year(year);
            match doi {
                Some(n) => record.with_doi(&format!("10.1/{}", n)),
                None => record,
            }
        })
}

/// Provider that answers every key with the same text.
struct Constant {
    text: &'static str,
    calls: Cell<usize>,
}

impl AbstractProvider for Constant {
    fn name(&self) -> &str {
        "constant"
    }

    fn max_batch(&self) -> usize {
        3
    }

    fn fetch(
        &self,
        _kind: LookupKind,
        keys: &[String],
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        self.calls.set(self.calls.get() + 1);
        Ok(keys
            .iter()
            .map(|k| (k.clone(), self.text.to_string()))
            .collect())
    }
}

fn matcher() -> EvidenceMatcher {
    EvidenceMatcher::new(ScreeningConfig::default()).expect("compile term lists")
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Merging an already merged set is a no-op.
    #[test]
    fn merge_is_idempotent(records in vec(arb_record(), 0..40)) {
        let once = merge(records).records;
        let twice = merge(once.clone()).records;
        prop_assert_eq!(once, twice);
    }

    /// Output never grows and every input key maps to exactly one output.
    #[test]
    fn merge_is_total(records in vec(arb_record(), 0..40)) {
        let input_keys: BTreeSet<_> = records.iter().filter_map(identity_key).collect();
        let identity_less = records.iter().filter(|r| identity_key(r).is_none()).count();
        let outcome = merge(records.clone());

        prop_assert!(outcome.records.len() <= records.len());

        let mut seen = BTreeSet::new();
        for key in outcome.records.iter().filter_map(identity_key) {
            prop_assert!(seen.insert(key), "duplicate identity key in output");
        }
        prop_assert_eq!(seen, input_keys);
        prop_assert_eq!(outcome.identity_less, identity_less);
        prop_assert_eq!(
            outcome.records.len(),
            outcome.input_total - outcome.duplicates_collapsed
        );
    }

    /// A DOI beats any title length or source.
    #[test]
    fn doi_takes_precedence(
        a_source in arb_source(),
        b_source in arb_source(),
        short in "[a-z]{1,5}",
        long in "[a-z]{6,40}",
    ) {
        let with_doi = CanonicalRecord::new(a_source, "a").with_title(&short).with_doi("10.1/x");
        let without = CanonicalRecord::new(b_source, "b").with_title(&long);
        prop_assert_eq!(&choose_better(&with_doi, &without).native_id, "a");
        prop_assert_eq!(&choose_better(&without, &with_doi).native_id, "a");
    }

    /// Stage 1 partitions every merged record.
    #[test]
    fn title_stage_is_total(records in vec(arb_record(), 0..40), strict in any::<bool>()) {
        let m = matcher();
        let merged = merge(records).records;
        let n = merged.len();
        let outcome = TitleScreener::new(&m, strict).screen(merged);
        prop_assert_eq!(outcome.screened_in.len() + outcome.screened_out.len(), n);
        for r in &outcome.screened_out {
            prop_assert!(!r.auto_exclude_reason.is_empty());
        }
    }

    /// Empty provider text never drops a record.
    #[test]
    fn empty_abstract_fails_open(records in vec(arb_record(), 0..30)) {
        let m = matcher();
        let provider = Constant { text: "   ", calls: Cell::new(0) };
        let sources = AbstractSources::new().with(LookupKind::Doi, &provider);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(10));

        let screened = TitleScreener::new(&m, false).screen(records);
        let outcome = AbstractScreener::new(&m).screen(screened.screened_in, &resolver);

        prop_assert!(outcome.dropped.is_empty());
        prop_assert!(outcome.kept.iter().all(|r| r.decision == Decision::KeepNoAbstract));
    }

    /// Stage totals balance and rescued records carry full abstract evidence.
    #[test]
    fn pipeline_accounting_balances(records in vec(arb_record(), 0..40), strict in any::<bool>()) {
        let provider = Constant {
            text: "Q-learning for ventilator weaning",
            calls: Cell::new(0),
        };
        let sources = AbstractSources::new().with(LookupKind::Doi, &provider);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(10));
        let pipeline = Pipeline::new(ScreeningConfig::new(strict, false), resolver)
            .expect("pipeline");

        let report = pipeline.run(records);
        let prisma = &report.prisma;

        prop_assert!(prisma.is_balanced());
        prop_assert_eq!(
            prisma.abstract_stage.kept + prisma.abstract_stage.dropped_by_abstract,
            prisma.abstract_stage.checked
        );

        let rescue = report.rescue_stage.as_ref().expect("rescue enabled");
        prop_assert_eq!(
            rescue.counts.rescued + rescue.counts.no_abstract + rescue.counts.confirmed_exclude,
            rescue.counts.checked
        );
        for r in rescue.rescued() {
            prop_assert!(!r.screened.auto_exclude_reason.is_empty());
            prop_assert!(r.evidence.match_mv_abs && r.evidence.match_wean_abs);
        }
    }

    /// Calls per kind equal ceil(unique keys / chunk size).
    #[test]
    fn resolver_batches_unique_keys(dois in vec(0u16..50, 0..60), batch in 1usize..8) {
        let provider = Constant { text: "text", calls: Cell::new(0) };
        let sources = AbstractSources::new().with(LookupKind::Doi, &provider);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(batch));

        let records: Vec<CanonicalRecord> = dois
            .iter()
            .map(|n| CanonicalRecord::new(Source::Scopus, "x").with_doi(&format!("10.9/{}", n)))
            .collect();
        let unique = dois.iter().collect::<BTreeSet<_>>().len();
        let chunk = batch.min(provider.max_batch());

        let resolution = resolver.resolve(&records);
        prop_assert_eq!(provider.calls.get(), unique.div_ceil(chunk));
        prop_assert!(resolution.texts.iter().all(Option::is_some));
    }
}
