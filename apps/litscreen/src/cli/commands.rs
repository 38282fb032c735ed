//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState};
use crate::pacer::SleepPacer;
use crate::report::{self, read_candidate_table, write_candidate_rows};
use crate::settings::{Overrides, Settings};
use crate::sources;
use crate::store::LocalAbstractStore;
use litscreen_core::{
    AbstractResolver, AbstractSources, Pipeline, PrismaCounts, PrismaNotes, ScreenError,
    TitleFilter,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a candidates CSV for the title filter (100 MB).
const MAX_CANDIDATES_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), ScreenError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| ScreenError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(ScreenError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input file, rejecting directories and missing paths.
fn validate_file_path(path: &Path) -> Result<PathBuf, ScreenError> {
    let canonical = path.canonicalize().map_err(|e| {
        ScreenError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(ScreenError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output file whose parent directory must already exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, ScreenError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        ScreenError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(ScreenError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| ScreenError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn validate_raw_dir(raw_dir: &Path) -> Result<(), ScreenError> {
    if !raw_dir.is_dir() {
        return Err(ScreenError::Io(format!(
            "Raw directory '{}' does not exist",
            raw_dir.display()
        )));
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// NORMALIZE COMMAND
// =============================================================================

/// Normalize every raw payload into `unified_index.{jsonl,csv}`.
pub fn cmd_normalize(raw_dir: &Path, out_dir: &Path, json_mode: bool) -> Result<(), ScreenError> {
    validate_raw_dir(raw_dir)?;
    let records = sources::normalize_all(raw_dir);

    std::fs::create_dir_all(out_dir).map_err(|e| {
        ScreenError::Io(format!(
            "Cannot create output directory '{}': {}",
            out_dir.display(),
            e
        ))
    })?;
    let written = report::write_records(out_dir, "unified_index", &records)?;

    let mut per_source: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in &records {
        *per_source.entry(record.source.as_str()).or_insert(0) += 1;
    }

    if json_mode {
        print_json(&serde_json::json!({
            "records": records.len(),
            "per_source": per_source,
            "files": written,
        }));
        return Ok(());
    }

    println!("Normalized {} records", records.len());
    for (source, count) in &per_source {
        println!("  {:<18} {}", source, count);
    }
    for path in &written {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

// =============================================================================
// SCREEN COMMAND
// =============================================================================

/// Run the full pipeline over the raw payloads and write the report.
pub fn cmd_screen(
    settings: &Settings,
    overrides: &Overrides,
    raw_dir: &Path,
    out_dir: &Path,
    abstracts: Option<&Path>,
    json_mode: bool,
) -> Result<(), ScreenError> {
    validate_raw_dir(raw_dir)?;

    let config = settings.screening_config(overrides);
    let rescue = settings.rescue(overrides);
    let policy = settings.fetch_policy(overrides)?;

    let store = match abstracts {
        Some(path) => LocalAbstractStore::load(&validate_file_path(path)?)?,
        None => {
            tracing::warn!("No abstract store given; abstract stages will keep every record");
            LocalAbstractStore::new()
        }
    };

    let mut providers = AbstractSources::new();
    store.register_into(&mut providers);
    let resolver = AbstractResolver::new(providers, policy).with_pacer(&SleepPacer);
    let pipeline = Pipeline::new(config, resolver)?.with_rescue(rescue);

    let records = sources::normalize_all(raw_dir);
    tracing::info!(records = records.len(), "Screening");
    let report = pipeline.run(records);

    let failures = report.abstract_stage.lookups.failures()
        + report
            .rescue_stage
            .as_ref()
            .map_or(0, |r| r.lookups.failures());
    if failures > 0 {
        tracing::warn!(failures, "Abstract lookups failed; affected records kept");
    }

    let written = report::write_report(out_dir, &report)?;

    if json_mode {
        print_json(&serde_json::json!({
            "prisma": report.prisma,
            "files": written,
        }));
        return Ok(());
    }

    print_prisma(&report.prisma);
    println!();
    println!("Report written to {}", out_dir.display());
    Ok(())
}

fn print_prisma(prisma: &PrismaCounts) {
    println!("PRISMA Flow");
    println!("===========");
    println!("Identified (raw):            {}", prisma.identified_raw_total);
    println!("After de-duplication:        {}", prisma.after_dedup);
    println!(
        "Title stage in / out:        {} / {}",
        prisma.auto_screen_in, prisma.auto_screen_out
    );
    println!(
        "Abstract stage checked:      {} (kept {}, dropped {}, no abstract {})",
        prisma.abstract_stage.checked,
        prisma.abstract_stage.kept,
        prisma.abstract_stage.dropped_by_abstract,
        prisma.abstract_stage.no_abstract
    );
    println!(
        "After abstract in / out:     {} / {}",
        prisma.auto_screen_in_after_abstract, prisma.auto_screen_out_after_abstract
    );
    if let Some(rescue) = &prisma.rescue_stage {
        println!(
            "Rescue checked:              {} (rescued {}, no abstract {}, confirmed {})",
            rescue.checked, rescue.rescued, rescue.no_abstract, rescue.confirmed_exclude
        );
    }
    println!("Final candidates:            {}", prisma.final_candidates);
}

// =============================================================================
// TITLE FILTER COMMAND
// =============================================================================

/// Filter a candidates CSV by title and write the kept rows.
pub fn cmd_title_filter(input: &Path, output: &Path, json_mode: bool) -> Result<(), ScreenError> {
    let input = validate_file_path(input)?;
    validate_file_size(&input, MAX_CANDIDATES_FILE_SIZE)?;
    let output = validate_output_path(output)?;

    let mut table = read_candidate_table(&input)?;
    let filter = TitleFilter::new()?;
    let column = table.title_column;
    let rows = std::mem::take(&mut table.rows);
    let total = rows.len();
    let outcome = filter.apply(rows, |row| row.get(column).unwrap_or_default());

    write_candidate_rows(&output, &table.headers, &outcome.kept)?;

    if json_mode {
        let removed: Vec<_> = outcome
            .removed
            .iter()
            .map(|r| {
                serde_json::json!({
                    "title": table.title(&r.row),
                    "reasons": r.flags.iter().map(|f| f.label()).collect::<Vec<_>>(),
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "total": total,
            "kept": outcome.kept.len(),
            "removed": removed,
            "reason_counts": outcome.reason_counts,
            "output": output,
        }));
        return Ok(());
    }

    for removed in &outcome.removed {
        let reasons: Vec<&str> = removed.flags.iter().map(|f| f.label()).collect();
        println!("REMOVE [{}] {}", reasons.join(", "), table.title(&removed.row));
    }
    println!();
    println!(
        "Kept {} of {} ({} removed)",
        outcome.kept.len(),
        total,
        outcome.removed.len()
    );
    for (flag, count) in &outcome.reason_counts {
        println!("  {:<24} {}", flag.label(), count);
    }
    println!("Wrote {}", output.display());

    Ok(())
}

// =============================================================================
// TERMS COMMAND
// =============================================================================

/// Show the evidence term lists and the active switches.
pub fn cmd_terms(
    settings: &Settings,
    overrides: &Overrides,
    json_mode: bool,
) -> Result<(), ScreenError> {
    let config = settings.screening_config(overrides);
    let notes = PrismaNotes::new(config);

    if json_mode {
        print_json(&serde_json::json!({
            "notes": notes,
            "rescue": settings.rescue(overrides),
        }));
        return Ok(());
    }

    println!("Evidence Terms");
    println!("==============");
    println!("Strict RL:      {}", notes.strict_require_rl);
    println!("Case sensitive: {}", notes.case_sensitive);
    println!("Rescue:         {}", settings.rescue(overrides));
    println!();
    println!("MV:      {}", notes.mv_terms.join(" | "));
    println!("Weaning: {}", notes.weaning_terms.join(" | "));
    println!("RL:      {}", notes.rl_terms.join(" | "));

    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(
    settings: &Settings,
    overrides: &Overrides,
    host: &str,
    port: u16,
    abstracts: Option<&Path>,
) -> Result<(), ScreenError> {
    let store = match abstracts {
        Some(path) => LocalAbstractStore::load(&validate_file_path(path)?)?,
        None => LocalAbstractStore::new(),
    };
    let state = AppState::new(
        settings.screening_config(overrides),
        settings.rescue(overrides),
        store,
    )?;

    println!("litscreen HTTP server starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", host);
    println!("  Port:       {}", port);
    println!("  Strict RL:  {}", state.defaults.strict_require_rl);
    println!("  Rescue:     {}", state.rescue);
    println!("  Abstracts:  {}", state.store.len());
    println!();
    println!("Endpoints:");
    println!("  GET  /health       - Health check");
    println!("  POST /screen       - Merge, screen and tally records");
    println!("  POST /title-filter - Title exclusion filter");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}
