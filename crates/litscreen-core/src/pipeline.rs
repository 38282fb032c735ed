//! # Screening Pipeline
//!
//! Runs every stage in order over one immutable snapshot per stage:
//!
//! ```text
//! normalize -> merge -> stage 1 -> stage 2 (screened in)
//!                               -> rescue  (screened out, optional)
//!                               -> PRISMA counts
//! ```
//!
//! Each stage's annotated records stay in the report, including records a
//! stage dropped.

use crate::abstracts::{AbstractScreener, AbstractStageOutcome};
use crate::config::ScreeningConfig;
use crate::evidence::EvidenceMatcher;
use crate::merge::{MergeOutcome, merge};
use crate::prisma::{PrismaCounts, StageTotals};
use crate::provider::AbstractResolver;
use crate::rescue::{RescueOutcome, RescueScreener};
use crate::screen::{TitleScreenOutcome, TitleScreener};
use crate::types::{AbstractScreened, CanonicalRecord, ScreenError};
use serde::Serialize;

/// Every stage's output plus the PRISMA counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningReport {
    pub merge: MergeOutcome,
    pub title_stage: TitleScreenOutcome,
    pub abstract_stage: AbstractStageOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescue_stage: Option<RescueOutcome>,
    pub prisma: PrismaCounts,
}

impl ScreeningReport {
    /// Records still in the candidate set: stage-2 keepers followed by rescue
    /// candidates.
    pub fn final_candidates(&self) -> impl Iterator<Item = &AbstractScreened> {
        self.abstract_stage.kept.iter().chain(
            self.rescue_stage
                .iter()
                .flat_map(|rescue| rescue.candidates.iter()),
        )
    }
}

/// Screening pipeline bound to one configuration and one resolver.
#[derive(Debug)]
pub struct Pipeline<'p> {
    config: ScreeningConfig,
    matcher: EvidenceMatcher,
    resolver: AbstractResolver<'p>,
    rescue: bool,
}

impl<'p> Pipeline<'p> {
    /// Compile the term lists and bind the resolver. Rescue is enabled.
    pub fn new(config: ScreeningConfig, resolver: AbstractResolver<'p>) -> Result<Self, ScreenError> {
        resolver.policy().validate()?;
        Ok(Self {
            config,
            matcher: EvidenceMatcher::new(config)?,
            resolver,
            rescue: true,
        })
    }

    /// Enable or disable the rescue stage.
    #[must_use]
    pub fn with_rescue(mut self, rescue: bool) -> Self {
        self.rescue = rescue;
        self
    }

    #[must_use]
    pub fn config(&self) -> ScreeningConfig {
        self.config
    }

    #[must_use]
    pub fn matcher(&self) -> &EvidenceMatcher {
        &self.matcher
    }

    /// Run every stage over `records`.
    pub fn run(&self, records: Vec<CanonicalRecord>) -> ScreeningReport {
        let identified_raw_total = records.len();
        let normalized: Vec<CanonicalRecord> =
            records.into_iter().map(CanonicalRecord::normalized).collect();

        let merged = merge(normalized);

        let title_stage = TitleScreener::new(&self.matcher, self.config.strict_require_rl)
            .screen(merged.records.clone());

        let abstract_stage = AbstractScreener::new(&self.matcher)
            .screen(title_stage.screened_in.clone(), &self.resolver);

        let rescue_stage = self.rescue.then(|| {
            RescueScreener::new(&self.matcher, self.config.strict_require_rl)
                .screen(title_stage.screened_out.clone(), &self.resolver)
        });

        let prisma = PrismaCounts::tally(
            StageTotals {
                identified_raw_total,
                after_dedup: merged.records.len(),
                auto_screen_in: title_stage.screened_in.len(),
                auto_screen_out: title_stage.screened_out.len(),
                abstract_stage: abstract_stage.counts,
                rescue_stage: rescue_stage.as_ref().map(|r| r.counts),
            },
            self.config,
        );

        ScreeningReport {
            merge: merged,
            title_stage,
            abstract_stage,
            rescue_stage,
            prisma,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
