//! # Abstract Providers
//!
//! The narrow interface through which abstract text enters the core.
//!
//! ## Lookup plan
//!
//! Every record is looked up under a fixed priority of identifier kinds
//! (`LookupKind` declaration order). The first kind that yields non-empty
//! text wins:
//!
//! | Kind | Applies to | Key |
//! |---|---|---|
//! | `PubmedId` | source `pubmed`, id `PMID:<n>` | `<n>` |
//! | `Doi` | any record with a DOI | normalized DOI |
//! | `AlternatePmid` | same records as `PubmedId` | `<n>` |
//! | `OpenAlexWork` | source `openalex`, or id on `openalex.org` | `W…` |
//! | `ArxivId` | source `arxiv`, or url on `arxiv.org/abs/` | last path segment |
//!
//! Providers are registered per kind in `AbstractSources`. A kind without a
//! provider is skipped. The batched resolver lives in [`resolver`].

pub mod resolver;

pub use resolver::{AbstractResolver, KindStats, LookupStats, Resolution, ResolvedAbstract};

use crate::text::last_path_segment;
use crate::types::{CanonicalRecord, Source};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// LOOKUP KINDS
// =============================================================================

/// Identifier kind used to ask a provider for abstracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LookupKind {
    /// Database-native PubMed lookup.
    #[serde(rename = "pubmed")]
    PubmedId,
    /// DOI-keyed lookup.
    #[serde(rename = "doi")]
    Doi,
    /// PMID through a secondary index.
    #[serde(rename = "pmid")]
    AlternatePmid,
    /// OpenAlex work id.
    #[serde(rename = "openalex")]
    OpenAlexWork,
    /// arXiv identifier.
    #[serde(rename = "arxiv")]
    ArxivId,
}

impl LookupKind {
    /// Every kind, in lookup priority order.
    pub const ALL: [LookupKind; 5] = [
        LookupKind::PubmedId,
        LookupKind::Doi,
        LookupKind::AlternatePmid,
        LookupKind::OpenAlexWork,
        LookupKind::ArxivId,
    ];

    /// Stable tag used in stats and abstract store files.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::PubmedId => "pubmed",
            LookupKind::Doi => "doi",
            LookupKind::AlternatePmid => "pmid",
            LookupKind::OpenAlexWork => "openalex",
            LookupKind::ArxivId => "arxiv",
        }
    }

    /// Parse a tag produced by [`LookupKind::as_str`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }

    /// Normalize a raw identifier into the key form this kind uses.
    ///
    /// Applied to record-derived keys and to keys supplied by providers, so
    /// both sides agree.
    #[must_use]
    pub fn normalize_key(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        let key = match self {
            LookupKind::PubmedId | LookupKind::AlternatePmid => {
                raw.strip_prefix("PMID:").unwrap_or(raw).trim().to_string()
            }
            LookupKind::Doi => crate::text::normalize_doi(raw).unwrap_or_default(),
            LookupKind::OpenAlexWork | LookupKind::ArxivId => last_path_segment(raw).to_string(),
        };
        if key.is_empty() { None } else { Some(key) }
    }

    /// Key of `record` under this kind, when the kind applies.
    #[must_use]
    pub fn key_for(&self, record: &CanonicalRecord) -> Option<String> {
        match self {
            LookupKind::PubmedId | LookupKind::AlternatePmid => {
                if record.source != Source::Pubmed {
                    return None;
                }
                let pmid = record.native_id.strip_prefix("PMID:")?;
                self.normalize_key(pmid)
            }
            LookupKind::Doi => record.doi.as_deref().and_then(|d| self.normalize_key(d)),
            LookupKind::OpenAlexWork => {
                let applies = record.source == Source::OpenAlex
                    || record.native_id.contains("openalex.org");
                if applies {
                    self.normalize_key(&record.native_id)
                } else {
                    None
                }
            }
            LookupKind::ArxivId => {
                let url = record.url.as_deref().unwrap_or_default();
                if record.source == Source::Arxiv {
                    self.normalize_key(&record.native_id)
                        .or_else(|| self.normalize_key(url))
                } else if url.contains("arxiv.org/abs/") {
                    self.normalize_key(url)
                } else {
                    None
                }
            }
        }
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// PROVIDER INTERFACE
// =============================================================================

/// Why a provider call produced no result.
///
/// The resolver never propagates these: a failed call counts as "no text"
/// for every key in the chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The backing service or store could not be reached.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The response could not be parsed.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The provider refused the call.
    #[error("provider rate limited")]
    RateLimited,
}

/// Source of abstract text for one or more lookup kinds.
pub trait AbstractProvider {
    /// Short name used in stats and logs.
    fn name(&self) -> &str;

    /// Largest number of keys accepted in one call. Single-key providers
    /// return 1.
    fn max_batch(&self) -> usize;

    /// Fetch abstracts for `keys`. Missing keys are simply absent from the
    /// returned map.
    fn fetch(
        &self,
        kind: LookupKind,
        keys: &[String],
    ) -> Result<BTreeMap<String, String>, ProviderError>;
}

/// Providers registered per lookup kind.
#[derive(Default)]
pub struct AbstractSources<'p> {
    providers: BTreeMap<LookupKind, &'p dyn AbstractProvider>,
}

impl<'p> AbstractSources<'p> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for `kind`, replacing any earlier registration.
    pub fn register(&mut self, kind: LookupKind, provider: &'p dyn AbstractProvider) {
        self.providers.insert(kind, provider);
    }

    /// Builder form of [`AbstractSources::register`].
    #[must_use]
    pub fn with(mut self, kind: LookupKind, provider: &'p dyn AbstractProvider) -> Self {
        self.register(kind, provider);
        self
    }

    #[must_use]
    pub fn get(&self, kind: LookupKind) -> Option<&'p dyn AbstractProvider> {
        self.providers.get(&kind).copied()
    }

    /// Registered kinds, in lookup priority order.
    pub fn kinds(&self) -> impl Iterator<Item = LookupKind> + '_ {
        self.providers.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for AbstractSources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.providers.iter().map(|(k, p)| (k, p.name())))
            .finish()
    }
}

// =============================================================================
// PACING
// =============================================================================

/// Pause between consecutive provider calls.
pub trait Pacer {
    fn pause(&self, delay: Duration);
}

/// Pacer that never waits. Used by tests and in-memory providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&self, _delay: Duration) {}
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pubmed_keys_only_for_pubmed_records() {
        let pubmed = CanonicalRecord::new(Source::Pubmed, "PMID:12345");
        assert_eq!(LookupKind::PubmedId.key_for(&pubmed), Some("12345".into()));
        assert_eq!(
            LookupKind::AlternatePmid.key_for(&pubmed),
            Some("12345".into())
        );

        let other = CanonicalRecord::new(Source::Scopus, "PMID:12345");
        assert_eq!(LookupKind::PubmedId.key_for(&other), None);
    }

    #[test]
    fn openalex_key_is_work_id() {
        let r = CanonicalRecord::new(Source::OpenAlex, "https://openalex.org/W42");
        assert_eq!(LookupKind::OpenAlexWork.key_for(&r), Some("W42".into()));

        let s2 = CanonicalRecord::new(Source::SemanticScholar, "https://openalex.org/W7");
        assert_eq!(LookupKind::OpenAlexWork.key_for(&s2), Some("W7".into()));
    }

    #[test]
    fn arxiv_key_from_id_or_url() {
        let native = CanonicalRecord::new(Source::Arxiv, "http://arxiv.org/abs/2101.00001v2");
        assert_eq!(
            LookupKind::ArxivId.key_for(&native),
            Some("2101.00001v2".into())
        );

        let url_only =
            CanonicalRecord::new(Source::Arxiv, "").with_url("https://arxiv.org/abs/1905.1");
        assert_eq!(LookupKind::ArxivId.key_for(&url_only), Some("1905.1".into()));

        let scholar = CanonicalRecord::new(Source::GoogleScholar, "x")
            .with_url("https://arxiv.org/abs/2002.2");
        assert_eq!(LookupKind::ArxivId.key_for(&scholar), Some("2002.2".into()));

        let plain = CanonicalRecord::new(Source::GoogleScholar, "x").with_url("https://a.org/p");
        assert_eq!(LookupKind::ArxivId.key_for(&plain), None);
    }

    #[test]
    fn doi_key_normalized() {
        let r = CanonicalRecord::new(Source::Scopus, "1").with_doi("10.1/AB");
        assert_eq!(LookupKind::Doi.key_for(&r), Some("10.1/ab".into()));
        assert_eq!(
            LookupKind::Doi.normalize_key("https://doi.org/10.1/AB"),
            Some("10.1/ab".into())
        );
    }

    #[test]
    fn kind_tags_round_trip() {
        for kind in LookupKind::ALL {
            assert_eq!(LookupKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(LookupKind::from_tag("s2"), None);
    }
}
