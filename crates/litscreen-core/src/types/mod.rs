//! # Core Type Definitions
//!
//! This module contains the record model shared by every pipeline stage:
//! - Origin database tags (`Source`)
//! - The unit of work (`CanonicalRecord`)
//! - Stage annotations (`TitleScreened`, `AbstractScreened`, evidence flags,
//!   `Decision`, `ExcludeReason`)
//! - Error types (`ScreenError`)
//!
//! ## Lifecycle
//!
//! A `CanonicalRecord` is created once by a normalizer, replaced (never
//! mutated) by the merge step, and then wrapped by each screening stage. A
//! wrapper keeps every field of the stage before it intact, so the report
//! rows of a later stage are a superset of the earlier ones.

use crate::text::{collapse_whitespace, non_empty, normalize_doi};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// SOURCE
// =============================================================================

/// Literature database a record was fetched from.
///
/// The declaration order is the merge source-priority order: richer
/// bibliographic indexes come first, preprint and search-snippet sources last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Clarivate Web of Science.
    #[serde(rename = "web_of_science")]
    WebOfScience,
    /// Elsevier Scopus.
    #[serde(rename = "scopus")]
    Scopus,
    /// OpenAlex works index.
    #[serde(rename = "openalex")]
    OpenAlex,
    /// Semantic Scholar graph API.
    #[serde(rename = "semantic_scholar")]
    SemanticScholar,
    /// Google Scholar search results (snippets only).
    #[serde(rename = "google_scholar")]
    GoogleScholar,
    /// arXiv preprints.
    #[serde(rename = "arxiv")]
    Arxiv,
    /// PubMed (ESearch ids).
    #[serde(rename = "pubmed")]
    Pubmed,
}

impl Source {
    /// Every source, in priority order.
    pub const ALL: [Source; 7] = [
        Source::WebOfScience,
        Source::Scopus,
        Source::OpenAlex,
        Source::SemanticScholar,
        Source::GoogleScholar,
        Source::Arxiv,
        Source::Pubmed,
    ];

    /// Stable tag used in reports and payload file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::WebOfScience => "web_of_science",
            Source::Scopus => "scopus",
            Source::OpenAlex => "openalex",
            Source::SemanticScholar => "semantic_scholar",
            Source::GoogleScholar => "google_scholar",
            Source::Arxiv => "arxiv",
            Source::Pubmed => "pubmed",
        }
    }

    /// Merge priority rank; lower wins.
    #[must_use]
    pub fn priority(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CANONICAL RECORD
// =============================================================================

/// Source-independent bibliographic record.
///
/// Required fields are plain values (possibly empty); optional ones are
/// `Option`s so absence never has to be sniffed per source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Origin database.
    pub source: Source,
    /// Source-local identifier. Provenance and provider lookups only.
    #[serde(rename = "id", alias = "native_id", default)]
    pub native_id: String,
    /// Whitespace-collapsed title; may be empty.
    #[serde(default)]
    pub title: String,
    /// Display names, in source order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Publication year, when known.
    #[serde(default)]
    pub year: Option<i32>,
    /// Lower-cased DOI without resolver prefix.
    #[serde(default)]
    pub doi: Option<String>,
    /// Landing page; fallback provenance signal.
    #[serde(default)]
    pub url: Option<String>,
    /// Whitespace-collapsed venue; may be empty.
    #[serde(default)]
    pub venue: String,
    /// Source-specific auxiliary text (snippets, summaries). Evidence only.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl CanonicalRecord {
    /// Create an otherwise empty record.
    #[must_use]
    pub fn new(source: Source, native_id: impl Into<String>) -> Self {
        Self {
            source,
            native_id: native_id.into().trim().to_string(),
            title: String::new(),
            authors: Vec::new(),
            year: None,
            doi: None,
            url: None,
            venue: String::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Set the title (whitespace-collapsed).
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = collapse_whitespace(title);
        self
    }

    /// Set the venue (whitespace-collapsed).
    #[must_use]
    pub fn with_venue(mut self, venue: &str) -> Self {
        self.venue = collapse_whitespace(venue);
        self
    }

    /// Set the author list, dropping blank names.
    #[must_use]
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.authors = authors
            .into_iter()
            .filter_map(|a| non_empty(&collapse_whitespace(a.as_ref())))
            .collect();
        self
    }

    /// Set the publication year.
    #[must_use]
    pub fn with_year(mut self, year: Option<i32>) -> Self {
        self.year = year;
        self
    }

    /// Set the DOI (normalized; empty means absent).
    #[must_use]
    pub fn with_doi(mut self, doi: &str) -> Self {
        self.doi = normalize_doi(doi);
        self
    }

    /// Set the URL (trimmed; empty means absent).
    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = non_empty(url);
        self
    }

    /// Attach auxiliary evidence text. Blank values are not stored.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: &str) -> Self {
        let value = collapse_whitespace(value);
        if !value.is_empty() {
            self.extra.insert(key.into(), value);
        }
        self
    }

    /// Re-apply the field normalization rules.
    ///
    /// Used for records that enter through a deserializer instead of a
    /// normalizer.
    #[must_use]
    pub fn normalized(self) -> Self {
        let Self {
            source,
            native_id,
            title,
            authors,
            year,
            doi,
            url,
            venue,
            extra,
        } = self;

        let mut record = Self::new(source, native_id)
            .with_title(&title)
            .with_venue(&venue)
            .with_authors(authors)
            .with_year(year)
            .with_doi(doi.as_deref().unwrap_or_default())
            .with_url(url.as_deref().unwrap_or_default());
        for (key, value) in extra {
            record = record.with_extra(key, &value);
        }
        record
    }

    /// Whether the record carries a non-empty DOI.
    #[must_use]
    pub fn has_doi(&self) -> bool {
        self.doi.as_deref().is_some_and(|d| !d.is_empty())
    }

    /// Title length in characters.
    #[must_use]
    pub fn title_len(&self) -> usize {
        self.title.chars().count()
    }
}

impl AsRef<CanonicalRecord> for CanonicalRecord {
    fn as_ref(&self) -> &CanonicalRecord {
        self
    }
}

// =============================================================================
// EVIDENCE FLAGS
// =============================================================================

/// Stage-1 evidence, computed from title, venue and snippet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TitleEvidence {
    /// Mechanical-ventilation terms matched.
    pub match_mv: bool,
    /// Weaning/liberation terms matched.
    pub match_weaning: bool,
    /// Reinforcement-learning terms matched.
    pub match_rl: bool,
}

/// Abstract-level evidence, recomputed from the fetched abstract only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbstractEvidence {
    /// Mechanical-ventilation terms matched in the abstract.
    pub match_mv_abs: bool,
    /// Weaning/liberation terms matched in the abstract.
    pub match_wean_abs: bool,
    /// Reinforcement-learning terms matched in the abstract.
    pub match_rl_abs: bool,
}

// =============================================================================
// DECISIONS
// =============================================================================

/// Reason code attached to a stage-1 exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludeReason {
    /// No mechanical-ventilation evidence.
    NoMv,
    /// No weaning evidence.
    NoWeaning,
    /// No RL evidence (strict mode only).
    NoRl,
    /// Predicate failed without a more specific reason.
    NoMatch,
}

impl ExcludeReason {
    /// Short code used in reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcludeReason::NoMv => "no_mv",
            ExcludeReason::NoWeaning => "no_weaning",
            ExcludeReason::NoRl => "no_rl",
            ExcludeReason::NoMatch => "no_match",
        }
    }

    /// Parse a short code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "no_mv" => Some(ExcludeReason::NoMv),
            "no_weaning" => Some(ExcludeReason::NoWeaning),
            "no_rl" => Some(ExcludeReason::NoRl),
            "no_match" => Some(ExcludeReason::NoMatch),
            _ => None,
        }
    }

    /// Join reasons into the comma-separated report form.
    #[must_use]
    pub fn join(reasons: &[ExcludeReason]) -> String {
        reasons
            .iter()
            .map(ExcludeReason::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Abstract-stage and rescue-stage outcome of a record.
///
/// ```text
/// stage 2 (screened in):   keep | keep_no_abstract | drop_by_abstract
/// rescue (screened out):   rescue | keep_no_abstract | confirmed_exclude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Abstract confirms MV and RL evidence.
    Keep,
    /// No abstract obtainable; retained for manual review.
    KeepNoAbstract,
    /// Abstract present but lacks MV or RL evidence.
    DropByAbstract,
    /// Title-level exclusion overturned by abstract evidence.
    Rescue,
    /// Title-level exclusion confirmed by abstract evidence.
    ConfirmedExclude,
}

impl Decision {
    /// Short code used in reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Keep => "keep",
            Decision::KeepNoAbstract => "keep_no_abstract",
            Decision::DropByAbstract => "drop_by_abstract",
            Decision::Rescue => "rescue",
            Decision::ConfirmedExclude => "confirmed_exclude",
        }
    }

    /// Whether the record stays in the active candidate set.
    #[must_use]
    pub fn is_retained(&self) -> bool {
        matches!(
            self,
            Decision::Keep | Decision::KeepNoAbstract | Decision::Rescue
        )
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// STAGE ANNOTATIONS
// =============================================================================

/// A merged record annotated with stage-1 evidence.
///
/// `auto_exclude_reason` is empty for screened-in records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleScreened {
    #[serde(flatten)]
    pub record: CanonicalRecord,
    #[serde(flatten)]
    pub evidence: TitleEvidence,
    #[serde(
        default,
        with = "reason_codes",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub auto_exclude_reason: Vec<ExcludeReason>,
}

impl AsRef<CanonicalRecord> for TitleScreened {
    fn as_ref(&self) -> &CanonicalRecord {
        &self.record
    }
}

/// A stage-1 record annotated with abstract-level evidence and a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractScreened {
    #[serde(flatten)]
    pub screened: TitleScreened,
    /// Whitespace-collapsed abstract; empty when none was obtainable.
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
    #[serde(flatten)]
    pub evidence: AbstractEvidence,
    pub decision: Decision,
}

impl AbstractScreened {
    /// The underlying bibliographic record.
    #[must_use]
    pub fn record(&self) -> &CanonicalRecord {
        &self.screened.record
    }
}

impl AsRef<CanonicalRecord> for AbstractScreened {
    fn as_ref(&self) -> &CanonicalRecord {
        &self.screened.record
    }
}

/// Serde adapter writing reason lists as `"no_mv,no_weaning"`.
mod reason_codes {
    use super::ExcludeReason;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(reasons: &[ExcludeReason], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ExcludeReason::join(reasons))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<ExcludeReason>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(raw.split(',').filter_map(ExcludeReason::from_code).collect())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building or running the screening pipeline.
///
/// Screening itself degrades instead of failing; these errors come from
/// construction (bad term patterns, bad configuration) and from the I/O
/// collaborators around the core.
#[derive(Debug, Error)]
pub enum ScreenError {
    /// A term pattern failed to compile.
    #[error("Invalid term pattern '{term}': {reason}")]
    InvalidTerm { term: String, reason: String },

    /// A configuration value is out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================
