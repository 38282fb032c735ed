//! # Text Normalization
//!
//! Small, pure string helpers shared by normalization, identity resolution
//! and evidence matching.
//!
//! Everything here is total: malformed input degrades to an empty string or
//! `None`, never to an error.

/// Collapse every run of whitespace to a single space and trim both ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized title key used for identity resolution.
///
/// Lower-cases the title, turns every run of non-alphanumeric characters
/// into a single space and trims. Letters and digits outside ASCII are
/// kept, so `Café` and `Cafe` stay distinct. Returns an empty string when
/// nothing alphanumeric survives.
#[must_use]
pub fn title_key(title: &str) -> String {
    let lowered = title.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for ch in lowered.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Resolver prefixes stripped from DOIs, compared case-insensitively.
const DOI_PREFIXES: [&str; 5] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

/// Normalize a DOI: trim, lower-case and strip any resolver URL prefix.
///
/// Returns `None` for empty input.
#[must_use]
pub fn normalize_doi(raw: &str) -> Option<String> {
    let mut doi = raw.trim().to_lowercase();
    for prefix in DOI_PREFIXES {
        if let Some(rest) = doi.strip_prefix(prefix) {
            doi = rest.trim().to_string();
            break;
        }
    }
    if doi.is_empty() { None } else { Some(doi) }
}

/// Trimmed string, or `None` when empty.
#[must_use]
pub fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// First four-digit year starting with `19` or `20` found anywhere in `text`.
#[must_use]
pub fn safe_year(text: &str) -> Option<i32> {
    text.as_bytes().windows(4).find_map(|w| {
        let century = &w[..2];
        let all_digits = w.iter().all(u8::is_ascii_digit);
        if all_digits && (century == b"19" || century == b"20") {
            std::str::from_utf8(w).ok()?.parse().ok()
        } else {
            None
        }
    })
}

/// Last non-empty `/`-separated segment of an identifier or URL.
///
/// `https://openalex.org/W123` → `W123`, `http://arxiv.org/abs/1905.13167v1/` →
/// `1905.13167v1`, and a bare id is returned unchanged.
#[must_use]
pub fn last_path_segment(id: &str) -> &str {
    id.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

// =============================================================================
// TESTS
// =============================================================================
