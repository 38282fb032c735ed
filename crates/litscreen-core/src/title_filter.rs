//! # Title Exclusion Filter
//!
//! A second, title-only pass over screening candidates. A row is removed
//! when its title:
//!
//! - mentions a review,
//! - mentions machine learning,
//! - mentions deep learning without deep reinforcement learning, or
//! - carries no ventilation or weaning keyword.
//!
//! Matching here is always case-insensitive, independent of
//! `ScreeningConfig::case_sensitive`.

use crate::evidence::TermMatcher;
use crate::primitives::MV_TITLE_TERMS;
use crate::types::ScreenError;
use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Why a title was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TitleFlag {
    Review,
    MachineLearning,
    DeepLearningNotDrl,
    NoMvKeyword,
}

impl TitleFlag {
    /// Human-readable label used in reports.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            TitleFlag::Review => "review",
            TitleFlag::MachineLearning => "machine learning",
            TitleFlag::DeepLearningNotDrl => "deep learning (not DRL)",
            TitleFlag::NoMvKeyword => "no MV keyword in title",
        }
    }
}

impl std::fmt::Display for TitleFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TitleFlag {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

/// A removed row with its flags, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Removed<T> {
    pub row: T,
    pub flags: Vec<TitleFlag>,
}

/// Result of filtering a set of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleFilterOutcome<T> {
    pub kept: Vec<T>,
    pub removed: Vec<Removed<T>>,
    /// Rows removed per flag. A row with two flags counts under both.
    pub reason_counts: BTreeMap<TitleFlag, usize>,
}

impl<T> Default for TitleFilterOutcome<T> {
    fn default() -> Self {
        Self {
            kept: Vec::new(),
            removed: Vec::new(),
            reason_counts: BTreeMap::new(),
        }
    }
}

/// Compiled title exclusion filter.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    review: Regex,
    machine_learning: Regex,
    deep_learning: Regex,
    deep_rl: Regex,
    mv_title: TermMatcher,
}

fn compile(pattern: &str) -> Result<Regex, ScreenError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ScreenError::InvalidTerm {
            term: pattern.to_string(),
            reason: e.to_string(),
        })
}

impl TitleFilter {
    pub fn new() -> Result<Self, ScreenError> {
        Ok(Self {
            review: compile(r"\breview\b")?,
            machine_learning: compile(r"\bmachine[-\s]?learning\b")?,
            deep_learning: compile(r"\bdeep\s+learning\b")?,
            deep_rl: compile(r"\bdeep\s+reinforcement\s+learning\b")?,
            mv_title: TermMatcher::compile(MV_TITLE_TERMS, false)?,
        })
    }

    /// Flags raised by `title`, in check order. Empty means keep.
    #[must_use]
    pub fn flags(&self, title: &str) -> Vec<TitleFlag> {
        let title = title.trim();
        let mut flags = Vec::new();
        if self.review.is_match(title) {
            flags.push(TitleFlag::Review);
        }
        if self.machine_learning.is_match(title) {
            flags.push(TitleFlag::MachineLearning);
        }
        if self.deep_learning.is_match(title) && !self.deep_rl.is_match(title) {
            flags.push(TitleFlag::DeepLearningNotDrl);
        }
        if !self.mv_title.matches_any(title) {
            flags.push(TitleFlag::NoMvKeyword);
        }
        flags
    }

    /// Split `rows` into kept and removed, reading titles with `title_of`.
    pub fn apply<T, F>(&self, rows: Vec<T>, title_of: F) -> TitleFilterOutcome<T>
    where
        F: Fn(&T) -> &str,
    {
        let mut outcome = TitleFilterOutcome::default();
        for row in rows {
            let flags = self.flags(title_of(&row));
            if flags.is_empty() {
                outcome.kept.push(row);
                continue;
            }
            for flag in &flags {
                *outcome.reason_counts.entry(*flag).or_insert(0) += 1;
            }
            outcome.removed.push(Removed { row, flags });
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

    fn filter() -> TitleFilter {
        TitleFilter::new().expect("compile title filter")
    }

    #[test]
    fn keeps_focused_titles() {
        let f = filter();
        assert!(f.flags("Deep reinforcement learning for ventilator weaning").is_empty());
        assert!(f.flags("Q-learning guided extubation timing").is_empty());
    }

    #[test]
    fn flags_reviews_and_ml() {
        let f = filter();
        assert_eq!(
            f.flags("Machine-learning for mechanical ventilation: a review"),
            vec![TitleFlag::Review, TitleFlag::MachineLearning]
        );
        assert_eq!(
            f.flags("Deep learning predicts weaning failure"),
            vec![TitleFlag::DeepLearningNotDrl]
        );
    }

    #[test]
    fn requires_mv_keyword() {
        let f = filter();
        assert_eq!(
            f.flags("Reinforcement learning for sepsis"),
            vec![TitleFlag::NoMvKeyword]
        );
        assert_eq!(f.flags(""), vec![TitleFlag::NoMvKeyword]);
        // word-bounded: "ventilations" alone does not qualify
        assert_eq!(f.flags("Ventilations"), vec![TitleFlag::NoMvKeyword]);
    }

    #[test]
    fn apply_counts_each_flag() {
        let f = filter();
        let rows = vec![
            "Ventilator weaning with RL",
            "A review of sepsis",
            "Deep learning review of ventilation",
        ];
        let outcome = f.apply(rows, |r| *r);
        assert_eq!(outcome.kept, vec!["Ventilator weaning with RL"]);
        assert_eq!(outcome.removed.len(), 2);
        assert_eq!(outcome.reason_counts[&TitleFlag::Review], 2);
        assert_eq!(outcome.reason_counts[&TitleFlag::NoMvKeyword], 1);
        assert_eq!(outcome.reason_counts[&TitleFlag::DeepLearningNotDrl], 1);
    }
}
