//! # Evidence Matcher
//!
//! Compiles fixed term lists into reusable matchers over a text blob.
//!
//! - A `Literal` term is escaped and matched as a plain substring.
//! - A `Pattern` term is a regular expression (word boundaries, optional
//!   characters) and is compiled as written.
//!
//! Matching is a pure function of the compiled terms and the blob. An empty
//! blob never matches.

use crate::config::ScreeningConfig;
use crate::primitives::{MV_TERMS, RL_TERMS, WEAN_TERMS};
use crate::types::{AbstractEvidence, ScreenError, TitleEvidence};
use regex::{Regex, RegexBuilder};
use serde::Serialize;

/// A single evidence term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    /// Plain text, matched as an escaped substring.
    Literal(&'static str),
    /// Regular expression source.
    Pattern(&'static str),
}

impl Term {
    /// The term as written in the term list.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Term::Literal(s) | Term::Pattern(s) => *s,
        }
    }

    fn regex_source(&self) -> String {
        match self {
            Term::Literal(s) => regex::escape(s),
            Term::Pattern(s) => (*s).to_string(),
        }
    }
}

impl Serialize for Term {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// One compiled term family.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    terms: &'static [Term],
    compiled: Vec<Regex>,
}

impl TermMatcher {
    /// Compile every term of a family.
    ///
    /// Returns `ScreenError::InvalidTerm` for the first pattern that fails to
    /// compile.
    pub fn compile(terms: &'static [Term], case_sensitive: bool) -> Result<Self, ScreenError> {
        let compiled = terms
            .iter()
            .map(|term| {
                RegexBuilder::new(&term.regex_source())
                    .case_insensitive(!case_sensitive)
                    .build()
                    .map_err(|e| ScreenError::InvalidTerm {
                        term: term.as_str().to_string(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { terms, compiled })
    }

    /// True iff any term matches anywhere in `blob`.
    #[must_use]
    pub fn matches_any(&self, blob: &str) -> bool {
        if blob.is_empty() {
            return false;
        }
        self.compiled.iter().any(|rx| rx.is_match(blob))
    }

    /// The source term list.
    #[must_use]
    pub fn terms(&self) -> &'static [Term] {
        self.terms
    }
}

/// The three evidence families compiled under one configuration.
#[derive(Debug, Clone)]
pub struct EvidenceMatcher {
    rl: TermMatcher,
    mv: TermMatcher,
    weaning: TermMatcher,
    config: ScreeningConfig,
}

impl EvidenceMatcher {
    /// Compile the fixed RL, MV and weaning term lists.
    pub fn new(config: ScreeningConfig) -> Result<Self, ScreenError> {
        Ok(Self {
            rl: TermMatcher::compile(RL_TERMS, config.case_sensitive)?,
            mv: TermMatcher::compile(MV_TERMS, config.case_sensitive)?,
            weaning: TermMatcher::compile(WEAN_TERMS, config.case_sensitive)?,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> ScreeningConfig {
        self.config
    }

    #[must_use]
    pub fn rl(&self) -> &TermMatcher {
        &self.rl
    }

    #[must_use]
    pub fn mv(&self) -> &TermMatcher {
        &self.mv
    }

    #[must_use]
    pub fn weaning(&self) -> &TermMatcher {
        &self.weaning
    }

    /// Stage-1 flags over a title-level blob.
    #[must_use]
    pub fn assess_title(&self, blob: &str) -> TitleEvidence {
        TitleEvidence {
            match_mv: self.mv.matches_any(blob),
            match_weaning: self.weaning.matches_any(blob),
            match_rl: self.rl.matches_any(blob),
        }
    }

    /// Abstract-level flags, computed from the abstract text alone.
    #[must_use]
    pub fn assess_abstract(&self, text: &str) -> AbstractEvidence {
        AbstractEvidence {
            match_mv_abs: self.mv.matches_any(text),
            match_wean_abs: self.weaning.matches_any(text),
            match_rl_abs: self.rl.matches_any(text),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> EvidenceMatcher {
        EvidenceMatcher::new(ScreeningConfig::default()).expect("compile term lists")
    }

    #[test]
    fn literal_terms_are_escaped() {
        static TERMS: &[Term] = &[Term::Literal("a+b (c)")];
        let m = TermMatcher::compile(TERMS, false).expect("compile");
        assert!(m.matches_any("xx A+B (C) yy"));
        assert!(!m.matches_any("aab c"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        static TERMS: &[Term] = &[Term::Pattern("(unclosed")];
        let err = TermMatcher::compile(TERMS, false).expect_err("must fail");
        assert!(matches!(err, ScreenError::InvalidTerm { .. }));
    }

    #[test]
    fn empty_blob_never_matches() {
        let m = matcher();
        assert_eq!(m.assess_title(""), TitleEvidence::default());
        assert_eq!(m.assess_abstract(""), AbstractEvidence::default());
    }

    #[test]
    fn word_boundary_patterns() {
        let m = matcher();
        assert!(m.rl().matches_any("an MDP formulation"));
        assert!(!m.rl().matches_any("MDPI journal"));
        assert!(m.rl().matches_any("Qlearning and Q-learning"));
    }

    #[test]
    fn case_sensitivity_switch() {
        let insensitive = matcher();
        assert!(insensitive.mv().matches_any("VENTILATOR settings"));

        let sensitive =
            EvidenceMatcher::new(ScreeningConfig::new(false, true)).expect("compile term lists");
        assert!(!sensitive.mv().matches_any("VENTILATOR settings"));
        assert!(sensitive.mv().matches_any("ventilator settings"));
    }

    #[test]
    fn title_assessment() {
        let evidence = matcher().assess_title("RL-based ventilator weaning protocol");
        assert!(evidence.match_mv);
        assert!(evidence.match_weaning);
        assert!(!evidence.match_rl);
    }
}
