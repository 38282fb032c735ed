//! # PRISMA Accountant
//!
//! Aggregates bucket sizes from every stage into one audit object. No
//! decisions are made here.
//!
//! Derived totals:
//!
//! ```text
//! auto_screen_in_after_abstract  = abstract_stage.kept
//! auto_screen_out_after_abstract = auto_screen_out + abstract_stage.dropped_by_abstract
//! final_candidates               = abstract_stage.kept + rescue (rescued + no_abstract)
//! ```

use crate::abstracts::AbstractStageCounts;
use crate::config::ScreeningConfig;
use crate::evidence::Term;
use crate::primitives::{MV_TERMS, RL_TERMS, WEAN_TERMS};
use crate::rescue::RescueCounts;
use serde::{Deserialize, Serialize};

/// Raw bucket sizes collected by the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTotals {
    pub identified_raw_total: usize,
    pub after_dedup: usize,
    pub auto_screen_in: usize,
    pub auto_screen_out: usize,
    pub abstract_stage: AbstractStageCounts,
    pub rescue_stage: Option<RescueCounts>,
}

/// Configuration echoed into the audit object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrismaNotes {
    pub strict_require_rl: bool,
    pub case_sensitive: bool,
    pub mv_terms: Vec<String>,
    pub weaning_terms: Vec<String>,
    pub rl_terms: Vec<String>,
}

impl PrismaNotes {
    #[must_use]
    pub fn new(config: ScreeningConfig) -> Self {
        fn names(terms: &[Term]) -> Vec<String> {
            terms.iter().map(|t| t.as_str().to_string()).collect()
        }

        Self {
            strict_require_rl: config.strict_require_rl,
            case_sensitive: config.case_sensitive,
            mv_terms: names(MV_TERMS),
            weaning_terms: names(WEAN_TERMS),
            rl_terms: names(RL_TERMS),
        }
    }
}

/// PRISMA flow counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrismaCounts {
    pub identified_raw_total: usize,
    pub after_dedup: usize,
    pub auto_screen_in: usize,
    pub auto_screen_out: usize,
    pub abstract_stage: AbstractStageCounts,
    pub auto_screen_in_after_abstract: usize,
    pub auto_screen_out_after_abstract: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescue_stage: Option<RescueCounts>,
    pub final_candidates: usize,
    pub notes: PrismaNotes,
}

impl PrismaCounts {
    /// Build the audit object from stage totals.
    #[must_use]
    pub fn tally(totals: StageTotals, config: ScreeningConfig) -> Self {
        let StageTotals {
            identified_raw_total,
            after_dedup,
            auto_screen_in,
            auto_screen_out,
            abstract_stage,
            rescue_stage,
        } = totals;

        let rescue_candidates = rescue_stage
            .map(|r| r.rescued + r.no_abstract)
            .unwrap_or(0);

        Self {
            identified_raw_total,
            after_dedup,
            auto_screen_in,
            auto_screen_out,
            abstract_stage,
            auto_screen_in_after_abstract: abstract_stage.kept,
            auto_screen_out_after_abstract: auto_screen_out + abstract_stage.dropped_by_abstract,
            rescue_stage,
            final_candidates: abstract_stage.kept + rescue_candidates,
            notes: PrismaNotes::new(config),
        }
    }

    /// Whether the post-abstract totals account for every merged record.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.auto_screen_in_after_abstract + self.auto_screen_out_after_abstract
            == self.after_dedup
    }
}

// =============================================================================
// TESTS
// =============================================================================
