//! # Local Abstract Store
//!
//! A file-backed [`AbstractProvider`] for offline runs and tests.
//!
//! The store file is a JSON object keyed by lookup tag:
//!
//! ```json
//! {
//!   "pubmed":   { "31234567": "Background: ..." },
//!   "doi":      { "10.1000/abc": "We propose ..." },
//!   "openalex": { "W2741809807": "..." },
//!   "arxiv":    { "2101.00001v1": "..." }
//! }
//! ```
//!
//! Keys are normalized with the same rules the lookup plan applies to
//! records, so `"https://doi.org/10.1000/ABC"` and `"10.1000/abc"` are the
//! same entry.

use litscreen_core::primitives::MAX_BATCH_SIZE;
use litscreen_core::{AbstractProvider, AbstractSources, LookupKind, ProviderError, ScreenError};
use std::collections::BTreeMap;
use std::path::Path;

/// Maximum store file size (256 MB).
const MAX_STORE_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// In-memory abstracts indexed by lookup kind and normalized key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalAbstractStore {
    entries: BTreeMap<LookupKind, BTreeMap<String, String>>,
}

impl LocalAbstractStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `{kind: {key: text}}` tables, normalizing every key.
    ///
    /// Keys that normalize to nothing and blank texts are dropped.
    #[must_use]
    pub fn from_tables(tables: BTreeMap<LookupKind, BTreeMap<String, String>>) -> Self {
        let mut store = Self::new();
        for (kind, table) in tables {
            for (key, text) in table {
                store.insert(kind, &key, &text);
            }
        }
        store
    }

    /// Load a store file.
    pub fn load(path: &Path) -> Result<Self, ScreenError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            ScreenError::Io(format!("Cannot read abstract store '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_STORE_FILE_SIZE {
            return Err(ScreenError::Serialization(format!(
                "Abstract store {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_STORE_FILE_SIZE
            )));
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| ScreenError::Io(format!("Failed to read abstract store: {}", e)))?;
        let tables: BTreeMap<LookupKind, BTreeMap<String, String>> = serde_json::from_str(&raw)
            .map_err(|e| ScreenError::Serialization(format!("Invalid abstract store: {}", e)))?;

        let store = Self::from_tables(tables);
        tracing::info!(
            path = %path.display(),
            entries = store.len(),
            "Loaded abstract store"
        );
        Ok(store)
    }

    /// Insert one abstract. Returns `false` when the key or text is unusable.
    pub fn insert(&mut self, kind: LookupKind, key: &str, text: &str) -> bool {
        let Some(key) = kind.normalize_key(key) else {
            return false;
        };
        if text.trim().is_empty() {
            return false;
        }
        self.entries
            .entry(kind)
            .or_default()
            .insert(key, text.to_string());
        true
    }

    /// Kinds with at least one entry.
    pub fn kinds(&self) -> impl Iterator<Item = LookupKind> + '_ {
        self.entries
            .iter()
            .filter(|(_, table)| !table.is_empty())
            .map(|(kind, _)| *kind)
    }

    /// Total number of stored abstracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register this store for every kind it holds entries for.
    pub fn register_into<'p>(&'p self, sources: &mut AbstractSources<'p>) {
        for kind in self.kinds() {
            sources.register(kind, self);
        }
    }
}

impl AbstractProvider for LocalAbstractStore {
    fn name(&self) -> &str {
        "local-store"
    }

    fn max_batch(&self) -> usize {
        MAX_BATCH_SIZE
    }

    fn fetch(
        &self,
        kind: LookupKind,
        keys: &[String],
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        let Some(table) = self.entries.get(&kind) else {
            return Ok(BTreeMap::new());
        };
        Ok(keys
            .iter()
            .filter_map(|k| table.get(k).map(|text| (k.clone(), text.clone())))
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use litscreen_core::{AbstractResolver, CanonicalRecord, FetchPolicy, Source};

    #[test]
    fn keys_are_normalized_on_insert() {
        let mut store = LocalAbstractStore::new();
        assert!(store.insert(LookupKind::Doi, "https://doi.org/10.1/AB", "text"));
        assert!(store.insert(LookupKind::OpenAlexWork, "https://openalex.org/W9", "oa"));
        assert!(!store.insert(LookupKind::Doi, "  ", "text"));
        assert!(!store.insert(LookupKind::Doi, "10.1/c", "   "));

        let found = store
            .fetch(LookupKind::Doi, &["10.1/ab".to_string(), "10.1/zz".to_string()])
            .expect("fetch");
        assert_eq!(found.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn registers_only_populated_kinds() {
        let mut store = LocalAbstractStore::new();
        store.insert(LookupKind::PubmedId, "PMID:7", "pubmed text");

        let mut sources = AbstractSources::new();
        store.register_into(&mut sources);
        assert_eq!(sources.kinds().collect::<Vec<_>>(), vec![LookupKind::PubmedId]);
    }

    #[test]
    fn resolves_records_through_resolver() {
        let mut store = LocalAbstractStore::new();
        store.insert(LookupKind::ArxivId, "http://arxiv.org/abs/2101.00001v1", "arxiv text");

        let mut sources = AbstractSources::new();
        store.register_into(&mut sources);
        let resolver = AbstractResolver::new(sources, FetchPolicy::unpaced(10));

        let record = CanonicalRecord::new(Source::Arxiv, "http://arxiv.org/abs/2101.00001v1");
        let resolution = resolver.resolve(&[record]);
        let resolved = resolution.texts[0].as_ref().expect("resolved");
        assert_eq!(resolved.text, "arxiv text");
        assert_eq!(resolved.via, LookupKind::ArxivId);
    }

    #[test]
    fn load_reads_tagged_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("abstracts.json");
        std::fs::write(&path, r#"{"doi": {"10.1/X": "abc"}, "pmid": {"5": "def"}}"#)
            .expect("write");

        let store = LocalAbstractStore::load(&path).expect("load");
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.kinds().collect::<Vec<_>>(),
            vec![LookupKind::Doi, LookupKind::AlternatePmid]
        );
    }

    #[test]
    fn load_rejects_unknown_kind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("abstracts.json");
        std::fs::write(&path, r#"{"isbn": {"1": "x"}}"#).expect("write");
        assert!(matches!(
            LocalAbstractStore::load(&path),
            Err(ScreenError::Serialization(_))
        ));
    }
}
