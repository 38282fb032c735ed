//! # Settings File
//!
//! Optional `litscreen.toml`:
//!
//! ```toml
//! [screening]
//! strict_require_rl = false
//! case_sensitive = false
//! rescue = true
//!
//! [fetch]
//! batch_size = 100
//! delay_ms = 500
//!
//! [paths]
//! raw_dir = "data/raw"
//! out_dir = "data/processed"
//! abstracts = "data/abstracts.json"
//! ```
//!
//! Every key is optional. Command-line flags override file values.

use litscreen_core::{FetchPolicy, ScreenError, ScreeningConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default settings file looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "litscreen.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub screening: ScreeningSection,
    #[serde(default)]
    pub fetch: FetchSection,
    #[serde(default)]
    pub paths: PathsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreeningSection {
    pub strict_require_rl: Option<bool>,
    pub case_sensitive: Option<bool>,
    pub rescue: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchSection {
    pub batch_size: Option<usize>,
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub raw_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub abstracts: Option<PathBuf>,
}

/// Command-line values that take precedence over the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub strict_rl: bool,
    pub case_sensitive: bool,
    pub no_rescue: bool,
    pub batch_size: Option<usize>,
    pub delay_ms: Option<u64>,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn parse(raw: &str) -> Result<Self, ScreenError> {
        toml::from_str(raw)
            .map_err(|e| ScreenError::Config(format!("Invalid settings file: {}", e)))
    }

    /// Load `path` if given, else [`DEFAULT_SETTINGS_FILE`] when it exists.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ScreenError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
        };

        if !path.exists() {
            if required {
                return Err(ScreenError::Io(format!(
                    "Settings file '{}' not found",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .map_err(|e| ScreenError::Io(format!("Failed to read settings: {}", e)))?;
        let settings = Self::parse(&raw)?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Screening switches after applying `overrides`.
    #[must_use]
    pub fn screening_config(&self, overrides: &Overrides) -> ScreeningConfig {
        ScreeningConfig::new(
            overrides.strict_rl || self.screening.strict_require_rl.unwrap_or(false),
            overrides.case_sensitive || self.screening.case_sensitive.unwrap_or(false),
        )
    }

    /// Whether the rescue pass runs.
    #[must_use]
    pub fn rescue(&self, overrides: &Overrides) -> bool {
        !overrides.no_rescue && self.screening.rescue.unwrap_or(true)
    }

    /// Validated fetch policy after applying `overrides`.
    pub fn fetch_policy(&self, overrides: &Overrides) -> Result<FetchPolicy, ScreenError> {
        let defaults = FetchPolicy::default();
        let policy = FetchPolicy {
            batch_size: overrides
                .batch_size
                .or(self.fetch.batch_size)
                .unwrap_or(defaults.batch_size),
            delay_ms: overrides
                .delay_ms
                .or(self.fetch.delay_ms)
                .unwrap_or(defaults.delay_ms),
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::parse("").expect("parse");
        assert_eq!(settings, Settings::default());
        assert!(settings.rescue(&Overrides::default()));
        assert_eq!(
            settings.fetch_policy(&Overrides::default()).expect("policy"),
            FetchPolicy::default()
        );
    }

    #[test]
    fn flags_override_file() {
        let settings = Settings::parse(
            "[screening]\nrescue = true\n[fetch]\nbatch_size = 20\ndelay_ms = 0\n",
        )
        .expect("parse");
        let overrides = Overrides {
            strict_rl: true,
            no_rescue: true,
            batch_size: Some(5),
            ..Overrides::default()
        };

        assert!(settings.screening_config(&overrides).strict_require_rl);
        assert!(!settings.rescue(&overrides));
        let policy = settings.fetch_policy(&overrides).expect("policy");
        assert_eq!(policy.batch_size, 5);
        assert_eq!(policy.delay_ms, 0);
    }

    #[test]
    fn out_of_range_policy_is_rejected() {
        let settings = Settings::parse("[fetch]\nbatch_size = 0\n").expect("parse");
        assert!(matches!(
            settings.fetch_policy(&Overrides::default()),
            Err(ScreenError::Config(_))
        ));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Settings::parse("[screening]\nstrict = true\n"),
            Err(ScreenError::Config(_))
        ));
    }

    #[test]
    fn paths_section() {
        let settings = Settings::parse("[paths]\nraw_dir = \"raw\"\n").expect("parse");
        assert_eq!(settings.paths.raw_dir, Some(PathBuf::from("raw")));
        assert!(settings.paths.out_dir.is_none());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::load(Some(&missing)),
            Err(ScreenError::Io(_))
        ));
    }
}
