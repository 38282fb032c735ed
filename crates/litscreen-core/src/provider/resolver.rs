//! Batched, paced abstract resolution for a whole stage.
//!
//! For each lookup kind in priority order the resolver collects the unique
//! keys of records that are still unresolved, fetches them in chunks of
//! `min(policy.batch_size, provider.max_batch())` and pauses between
//! consecutive calls. A failed call is recorded and treated as "no text".

use super::{AbstractSources, LookupKind, NoPacing, Pacer};
use crate::config::FetchPolicy;
use crate::text::collapse_whitespace;
use crate::types::CanonicalRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// Abstract text together with the lookup kind that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAbstract {
    pub text: String,
    pub via: LookupKind,
}

/// Per-kind call accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KindStats {
    /// Provider name.
    pub provider: String,
    /// Unique keys requested.
    pub keys: usize,
    /// Provider calls made.
    pub calls: usize,
    /// Calls that returned an error.
    pub failures: usize,
    /// Records resolved through this kind.
    pub resolved: usize,
    /// Most recent error message, if any call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Call accounting for one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LookupStats {
    pub kinds: BTreeMap<LookupKind, KindStats>,
}

impl LookupStats {
    /// Total provider calls across kinds.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.kinds.values().map(|k| k.calls).sum()
    }

    /// Total failed provider calls across kinds.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.kinds.values().map(|k| k.failures).sum()
    }

    /// Records resolved across kinds.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.kinds.values().map(|k| k.resolved).sum()
    }
}

/// Abstracts for a batch of records, aligned with the input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub texts: Vec<Option<ResolvedAbstract>>,
    pub stats: LookupStats,
}

/// Resolves abstracts through registered providers.
pub struct AbstractResolver<'p> {
    sources: AbstractSources<'p>,
    policy: FetchPolicy,
    pacer: &'p dyn Pacer,
}

impl<'p> AbstractResolver<'p> {
    /// Resolver that never pauses between calls.
    #[must_use]
    pub fn new(sources: AbstractSources<'p>, policy: FetchPolicy) -> Self {
        Self {
            sources,
            policy,
            pacer: &NoPacing,
        }
    }

    /// Replace the pacer.
    #[must_use]
    pub fn with_pacer(mut self, pacer: &'p dyn Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// A resolver without providers. Every record resolves to no text.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(AbstractSources::new(), FetchPolicy::unpaced(1))
    }

    #[must_use]
    pub fn policy(&self) -> FetchPolicy {
        self.policy
    }

    #[must_use]
    pub fn sources(&self) -> &AbstractSources<'p> {
        &self.sources
    }

    /// Resolve abstracts for every record.
    ///
    /// `texts[i]` holds the first non-empty, whitespace-collapsed text found
    /// for `records[i]`, or `None`.
    pub fn resolve<R: AsRef<CanonicalRecord>>(&self, records: &[R]) -> Resolution {
        let mut texts: Vec<Option<ResolvedAbstract>> = vec![None; records.len()];
        let mut stats = LookupStats::default();
        let delay = Duration::from_millis(self.policy.delay_ms);
        let mut calls_made = 0usize;

        for kind in LookupKind::ALL {
            let Some(provider) = self.sources.get(kind) else {
                continue;
            };

            let pending: Vec<(usize, String)> = records
                .iter()
                .enumerate()
                .filter(|(i, _)| texts.get(*i).is_some_and(Option::is_none))
                .filter_map(|(i, r)| kind.key_for(r.as_ref()).map(|key| (i, key)))
                .collect();
            if pending.is_empty() {
                continue;
            }

            let keys: Vec<String> = pending
                .iter()
                .map(|(_, key)| key.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let mut kind_stats = KindStats {
                provider: provider.name().to_string(),
                keys: keys.len(),
                ..KindStats::default()
            };
            let mut found: BTreeMap<String, String> = BTreeMap::new();

            for chunk in keys.chunks(self.policy.chunk_size(provider.max_batch())) {
                if calls_made > 0 && !delay.is_zero() {
                    self.pacer.pause(delay);
                }
                calls_made += 1;
                kind_stats.calls += 1;

                match provider.fetch(kind, chunk) {
                    Ok(batch) => {
                        for (raw_key, raw_text) in batch {
                            let text = collapse_whitespace(&raw_text);
                            if text.is_empty() {
                                continue;
                            }
                            if let Some(key) = kind.normalize_key(&raw_key) {
                                found.entry(key).or_insert(text);
                            }
                        }
                    }
                    Err(e) => {
                        kind_stats.failures += 1;
                        kind_stats.last_error = Some(e.to_string());
                    }
                }
            }

            for (index, key) in pending {
                if let (Some(text), Some(slot)) = (found.get(&key), texts.get_mut(index)) {
                    *slot = Some(ResolvedAbstract {
                        text: text.clone(),
                        via: kind,
                    });
                    kind_stats.resolved += 1;
                }
            }

            stats.kinds.insert(kind, kind_stats);
        }

        Resolution { texts, stats }
    }
}

impl std::fmt::Debug for AbstractResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbstractResolver")
            .field("sources", &self.sources)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AbstractProvider, ProviderError};
    use crate::types::Source;
    use std::cell::{Cell, RefCell};

    struct MapProvider {
        max: usize,
        texts: BTreeMap<String, String>,
        calls: RefCell<Vec<usize>>,
    }

    impl MapProvider {
        fn new(max: usize, pairs: &[(&str, &str)]) -> Self {
            Self {
                max,
                texts: pairs
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl AbstractProvider for MapProvider {
        fn name(&self) -> &str {
            "map"
        }

        fn max_batch(&self) -> usize {
            self.max
        }

        fn fetch(
            &self,
            _kind: LookupKind,
            keys: &[String],
        ) -> Result<BTreeMap<String, String>, ProviderError> {
            self.calls.borrow_mut().push(keys.len());
            Ok(keys
                .iter()
                .filter_map(|k| self.texts.get(k).map(|t| (k.clone(), t.clone())))
                .collect())
        }
    }

    struct Failing;

    impl AbstractProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn max_batch(&self) -> usize {
            10
        }

        fn fetch(
            &self,
            _kind: LookupKind,
            _keys: &[String],
        ) -> Result<BTreeMap<String, String>, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct CountingPacer {
        pauses: Cell<usize>,
    }

    impl Pacer for CountingPacer {
        fn pause(&self, _delay: Duration) {
            self.pauses.set(self.pauses.get() + 1);
        }
    }

    fn doi_record(doi: &str) -> CanonicalRecord {
        CanonicalRecord::new(Source::Scopus, doi).with_doi(doi)
    }

    #[test]
    fn chunks_unique_keys() {
        let provider = MapProvider::new(2, &[("10.1/a", "text a")]);
        let sources = AbstractSources::new().with(LookupKind::Doi, &provider);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(100));

        let records = vec![
            doi_record("10.1/a"),
            doi_record("10.1/b"),
            doi_record("10.1/a"),
            doi_record("10.1/c"),
            doi_record("10.1/d"),
            doi_record("10.1/e"),
        ];
        let resolution = resolver.resolve(&records);

        assert_eq!(*provider.calls.borrow(), vec![2, 2, 1]);
        assert_eq!(resolution.stats.calls(), 3);
        assert_eq!(resolution.stats.resolved(), 2);
        assert_eq!(
            resolution.texts[0].as_ref().map(|r| r.text.as_str()),
            Some("text a")
        );
        assert!(resolution.texts[1].is_none());
        assert!(resolution.texts[2].is_some());
    }

    #[test]
    fn first_kind_wins() {
        let pubmed = MapProvider::new(200, &[("7", "from pubmed")]);
        let doi = MapProvider::new(100, &[("10.1/p", "from doi")]);
        let sources = AbstractSources::new()
            .with(LookupKind::PubmedId, &pubmed)
            .with(LookupKind::Doi, &doi);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(100));

        let record = CanonicalRecord::new(Source::Pubmed, "PMID:7").with_doi("10.1/p");
        let resolution = resolver.resolve(&[record]);

        let resolved = resolution.texts[0].as_ref().expect("resolved");
        assert_eq!(resolved.text, "from pubmed");
        assert_eq!(resolved.via, LookupKind::PubmedId);
        assert!(doi.calls.borrow().is_empty());
    }

    #[test]
    fn falls_through_to_later_kind() {
        let pubmed = MapProvider::new(200, &[]);
        let doi = MapProvider::new(100, &[("10.1/p", "  from \n doi ")]);
        let sources = AbstractSources::new()
            .with(LookupKind::PubmedId, &pubmed)
            .with(LookupKind::Doi, &doi);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(100));

        let record = CanonicalRecord::new(Source::Pubmed, "PMID:7").with_doi("10.1/p");
        let resolution = resolver.resolve(&[record]);
        let resolved = resolution.texts[0].as_ref().expect("resolved");
        assert_eq!(resolved.text, "from doi");
        assert_eq!(resolved.via, LookupKind::Doi);
    }

    #[test]
    fn failures_are_recorded_not_propagated() {
        let sources = AbstractSources::new().with(LookupKind::Doi, &Failing);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(100));

        let resolution = resolver.resolve(&[doi_record("10.1/a")]);
        assert!(resolution.texts[0].is_none());
        let stats = &resolution.stats.kinds[&LookupKind::Doi];
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.last_error.as_deref(), Some("provider unavailable: connection refused"));
    }

    #[test]
    fn pacer_runs_between_calls() {
        let provider = MapProvider::new(1, &[]);
        let pacer = CountingPacer::default();
        let sources = AbstractSources::new().with(LookupKind::Doi, &provider);
        let policy = FetchPolicy {
            batch_size: 10,
            delay_ms: 5,
        };
        let resolver = AbstractResolver::new(sources, policy).with_pacer(&pacer);

        let records = vec![doi_record("10.1/a"), doi_record("10.1/b"), doi_record("10.1/c")];
        let _ = resolver.resolve(&records);
        assert_eq!(pacer.pauses.get(), 2);
    }

    #[test]
    fn empty_resolver_yields_nothing() {
        let resolution = AbstractResolver::empty().resolve(&[doi_record("10.1/a")]);
        assert_eq!(resolution.texts, vec![None]);
        assert_eq!(resolution.stats.calls(), 0);
    }
}
