//! # Screening Configuration
//!
//! Explicit configuration values threaded into the matcher, the screeners and
//! the abstract resolver. Nothing here is global.

use crate::ScreenError;
use crate::primitives::{DEFAULT_BATCH_SIZE, DEFAULT_DELAY_MS, MAX_BATCH_SIZE, MAX_DELAY_MS};
use serde::{Deserialize, Serialize};

/// The two switches that change screening outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreeningConfig {
    /// Stage 1 also requires RL evidence. Rescue uses the same switch.
    #[serde(default)]
    pub strict_require_rl: bool,
    /// Term matching is case-sensitive. Applies to every stage.
    #[serde(default)]
    pub case_sensitive: bool,
}

impl ScreeningConfig {
    /// Configuration with both switches set explicitly.
    #[must_use]
    pub fn new(strict_require_rl: bool, case_sensitive: bool) -> Self {
        Self {
            strict_require_rl,
            case_sensitive,
        }
    }
}

/// Batching and pacing for provider calls.
///
/// This belongs to the resolver, not to screening: changing it changes how
/// many round trips are made, never which decision a record receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPolicy {
    /// Identifiers per provider call, before the provider's own cap.
    pub batch_size: usize,
    /// Pause between consecutive calls to the same provider.
    pub delay_ms: u64,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl FetchPolicy {
    /// Policy with no pause between calls.
    #[must_use]
    pub fn unpaced(batch_size: usize) -> Self {
        Self {
            batch_size,
            delay_ms: 0,
        }
    }

    /// Check that the values are within the supported ranges.
    pub fn validate(&self) -> Result<(), ScreenError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ScreenError::Config(format!(
                "batch_size must be between 1 and {}, got {}",
                MAX_BATCH_SIZE, self.batch_size
            )));
        }
        if self.delay_ms > MAX_DELAY_MS {
            return Err(ScreenError::Config(format!(
                "delay_ms must be at most {}, got {}",
                MAX_DELAY_MS, self.delay_ms
            )));
        }
        Ok(())
    }

    /// Effective chunk size for a provider accepting at most `max_batch` ids.
    #[must_use]
    pub fn chunk_size(&self, max_batch: usize) -> usize {
        self.batch_size.min(max_batch).max(1)
    }
}
