//! # Screening Primitives
//!
//! Fixed term lists and pacing constants compiled into the binary.
//!
//! The term lists are immutable at runtime: the only knobs are the
//! case-sensitivity flag applied when they are compiled and the strict-RL
//! switch applied by the stage-1 screener.
//!
//! ## Families
//!
//! 1. **RL terms**: reinforcement-learning methodology.
//! 2. **MV terms**: mechanical-ventilation domain.
//! 3. **Weaning terms**: ventilator liberation and weaning topic.

use crate::evidence::Term;

// =============================================================================
// EVIDENCE TERM FAMILIES
// =============================================================================

/// Reinforcement-learning evidence terms.
pub const RL_TERMS: &[Term] = &[
    Term::Literal("reinforcement learning"),
    Term::Pattern(r"\bMDP\b"),
    Term::Literal("markov decision"),
    Term::Pattern(r"\bQ-?learning\b"),
    Term::Literal("fitted q"),
    Term::Literal("policy gradient"),
    Term::Literal("actor-critic"),
    Term::Literal("offline reinforcement"),
    Term::Literal("deep reinforcement"),
    Term::Literal("inverse reinforcement"),
];

/// Mechanical-ventilation evidence terms.
pub const MV_TERMS: &[Term] = &[
    Term::Literal("mechanical ventilation"),
    Term::Literal("ventilator"),
    Term::Literal("ventilatory support"),
    Term::Literal("ventilation"),
    Term::Literal("ventilated"),
    Term::Literal("patient-ventilator"),
];

/// Weaning and liberation evidence terms.
///
/// `sbt` and `wean` are substring terms, so they also fire inside longer
/// words. The stage-1 blob is short enough that this has not mattered.
pub const WEAN_TERMS: &[Term] = &[
    Term::Literal("wean"),
    Term::Literal("weaning"),
    Term::Literal("extubat"),
    Term::Literal("ventilator liberation"),
    Term::Literal("spontaneous breathing trial"),
    Term::Literal("sbt"),
    Term::Literal("liberation"),
];

// =============================================================================
// TITLE FILTER PATTERNS
// =============================================================================

/// Ventilation or weaning keywords a candidate title must carry to survive
/// the title exclusion filter.
pub const MV_TITLE_TERMS: &[Term] = &[
    Term::Literal("mechanical ventilation"),
    Term::Literal("ventilator"),
    Term::Literal("ventilatory support"),
    Term::Pattern(r"\bventilation\b"),
    Term::Pattern(r"\bventilated\b"),
    Term::Literal("patient-ventilator"),
    Term::Pattern(r"\bwean(?:ing)?\b"),
    Term::Pattern(r"\bextubat(?:e|ion|ing)?\b"),
    Term::Literal("spontaneous breathing trial"),
    Term::Pattern(r"\bSBT\b"),
    Term::Literal("ventilator liberation"),
];

// =============================================================================
// FETCH PACING DEFAULTS
// =============================================================================

/// Default number of identifiers per provider call.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Default pause between consecutive provider calls, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 500;

/// Upper bound on the configurable batch size.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Upper bound on the configurable inter-call delay (one minute).
pub const MAX_DELAY_MS: u64 = 60_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_families_are_non_empty() {
        assert_eq!(RL_TERMS.len(), 10);
        assert_eq!(MV_TERMS.len(), 6);
        assert_eq!(WEAN_TERMS.len(), 7);
        assert!(!MV_TITLE_TERMS.is_empty());
    }

    #[test]
    fn pacing_defaults_within_bounds() {
        assert!(DEFAULT_BATCH_SIZE <= MAX_BATCH_SIZE);
        assert!(DEFAULT_DELAY_MS <= MAX_DELAY_MS);
    }
}
