//! # litscreen-core
//!
//! The deterministic record unification and evidence-screening engine.
//!
//! This crate takes canonical bibliographic records from any number of
//! literature databases, collapses duplicates into one representative per
//! publication, and classifies every survivor through escalating evidence
//! passes:
//!
//! 1. title-level screening (title, venue, snippets),
//! 2. abstract-level re-screening of the screened-in records,
//! 3. an optional rescue pass over the screened-out records,
//!
//! and finally tallies PRISMA flow counts.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust: NO async, NO network, NO logging
//! - Abstract text enters only through the `AbstractProvider` trait
//! - Provider failures degrade to "no abstract", never to an error
//! - Every input to a stage lands in exactly one output bucket of that stage
//! - BTreeMap/BTreeSet only, integer arithmetic only

// =============================================================================
// MODULES
// =============================================================================

pub mod abstracts;
pub mod config;
pub mod evidence;
pub mod merge;
pub mod pipeline;
pub mod primitives;
pub mod prisma;
pub mod provider;
pub mod rescue;
pub mod screen;
pub mod text;
pub mod title_filter;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    AbstractEvidence, AbstractScreened, CanonicalRecord, Decision, ExcludeReason, ScreenError,
    Source, TitleEvidence, TitleScreened,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use abstracts::{AbstractScreener, AbstractStageCounts, AbstractStageOutcome};
pub use config::{FetchPolicy, ScreeningConfig};
pub use evidence::{EvidenceMatcher, Term, TermMatcher};
pub use merge::{IdentityKey, MergeOutcome, choose_better, identity_key, merge};
pub use pipeline::{Pipeline, ScreeningReport};
pub use prisma::{PrismaCounts, PrismaNotes, StageTotals};
pub use provider::{
    AbstractProvider, AbstractResolver, AbstractSources, KindStats, LookupKind, LookupStats,
    NoPacing, Pacer, ProviderError, Resolution, ResolvedAbstract,
};
pub use rescue::{RescueCounts, RescueOutcome, RescueScreener};
pub use screen::{TitleScreenOutcome, TitleScreener, title_blob};
pub use title_filter::{Removed, TitleFilter, TitleFilterOutcome, TitleFlag};
