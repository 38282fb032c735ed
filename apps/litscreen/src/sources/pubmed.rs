//! PubMed esearch id lists (`{"pmids": [...]}`).
//!
//! Only identifiers are known at this point; titles stay empty and the
//! abstract stage looks the records up by PMID.

use super::scalar;
use litscreen_core::{CanonicalRecord, Source};
use serde_json::Value;

pub(super) fn normalize(payload: &Value) -> Vec<CanonicalRecord> {
    let Some(pmids) = payload.get("pmids").and_then(Value::as_array) else {
        return Vec::new();
    };
    pmids
        .iter()
        .filter_map(|p| scalar(Some(p)))
        .map(|pmid| {
            CanonicalRecord::new(Source::Pubmed, format!("PMID:{}", pmid))
                .with_url(&format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid))
        })
        .collect()
}
