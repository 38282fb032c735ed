//! # API Request/Response Types
//!
//! JSON bodies for the HTTP API. Screening results are returned as the
//! core [`ScreeningReport`](litscreen_core::ScreeningReport) unchanged.

use litscreen_core::{
    CanonicalRecord, LookupKind, Removed, ScreenError, ScreeningConfig, TitleFilterOutcome,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of records accepted in one request.
pub const MAX_REQUEST_RECORDS: usize = 100_000;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// SCREEN REQUEST
// =============================================================================

/// Abstract tables keyed by lookup tag, then by identifier.
pub type AbstractTables = BTreeMap<LookupKind, BTreeMap<String, String>>;

/// Run the full pipeline over `records`.
///
/// Unset switches fall back to the server defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenRequest {
    pub records: Vec<CanonicalRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstracts: Option<AbstractTables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_require_rl: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescue: Option<bool>,
}

impl ScreenRequest {
    /// Check request limits.
    pub fn validate(&self) -> Result<(), ScreenError> {
        validate_record_count(self.records.len())
    }

    /// Effective screening switches over `defaults`.
    #[must_use]
    pub fn config(&self, defaults: ScreeningConfig) -> ScreeningConfig {
        ScreeningConfig::new(
            self.strict_require_rl.unwrap_or(defaults.strict_require_rl),
            self.case_sensitive.unwrap_or(defaults.case_sensitive),
        )
    }
}

fn validate_record_count(count: usize) -> Result<(), ScreenError> {
    if count > MAX_REQUEST_RECORDS {
        return Err(ScreenError::Config(format!(
            "Too many records: {} (max {})",
            count, MAX_REQUEST_RECORDS
        )));
    }
    Ok(())
}

// =============================================================================
// TITLE FILTER REQUEST/RESPONSE
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TitleFilterRequest {
    pub records: Vec<CanonicalRecord>,
}

impl TitleFilterRequest {
    pub fn validate(&self) -> Result<(), ScreenError> {
        validate_record_count(self.records.len())
    }
}

/// A removed record with its flag labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedRecord {
    pub record: CanonicalRecord,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleFilterResponse {
    pub kept: Vec<CanonicalRecord>,
    pub removed: Vec<RemovedRecord>,
    /// Removed rows per flag label.
    pub reason_counts: BTreeMap<String, usize>,
}

impl From<TitleFilterOutcome<CanonicalRecord>> for TitleFilterResponse {
    fn from(outcome: TitleFilterOutcome<CanonicalRecord>) -> Self {
        let removed = outcome
            .removed
            .into_iter()
            .map(|Removed { row, flags }| RemovedRecord {
                record: row,
                reasons: flags.iter().map(|f| f.label().to_string()).collect(),
            })
            .collect();
        let reason_counts = outcome
            .reason_counts
            .into_iter()
            .map(|(flag, n)| (flag.label().to_string(), n))
            .collect();

        Self {
            kept: outcome.kept,
            removed,
            reason_counts,
        }
    }
}
